//! Recurring usage-reminder schedules.
//!
//! A schedule expands into an ordered list of timestamps. Expansion stops at
//! the optional end timestamp, or when calendar arithmetic overflows, without
//! raising an error.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, NaiveTime, Utc};

/// Days covered by a daily schedule.
pub const DAILY_SPAN_DAYS: u32 = 30;
/// Occurrences of a weekly schedule.
pub const WEEKLY_OCCURRENCES: u32 = 4;
/// Occurrences of a monthly schedule.
pub const MONTHLY_OCCURRENCES: u32 = 3;
/// Highest accepted `occurrences_per_day`.
pub const MAX_OCCURRENCES_PER_DAY: u32 = 24;

/// Daily slots are spaced in milliseconds, truncated to the millisecond.
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Hour of day (UTC) used when no start time is supplied.
pub const DEFAULT_REMINDER_HOUR: u32 = 8;

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceKind {
    /// Several times per day for [`DAILY_SPAN_DAYS`] days.
    Daily,
    /// Once per week for [`WEEKLY_OCCURRENCES`] weeks.
    Weekly,
    /// Once per month for [`MONTHLY_OCCURRENCES`] months.
    Monthly,
}

impl RecurrenceKind {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown frequency label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recurrence kind: {0}")]
pub struct UnknownRecurrenceKind(pub String);

impl FromStr for RecurrenceKind {
    type Err = UnknownRecurrenceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(UnknownRecurrenceKind(other.to_owned())),
        }
    }
}

/// Validation failures for a recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceValidationError {
    /// `occurrences_per_day` outside `1..=MAX_OCCURRENCES_PER_DAY`.
    #[error("occurrences per day must be between 1 and {max}")]
    OccurrencesPerDay {
        /// Upper bound.
        max: u32,
    },
}

/// A validated recurrence rule anchored at a start timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceSpec {
    kind: RecurrenceKind,
    occurrences_per_day: u32,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl RecurrenceSpec {
    /// Build a schedule. `occurrences_per_day` is only meaningful for daily
    /// schedules but is validated for every kind.
    pub fn new(
        kind: RecurrenceKind,
        occurrences_per_day: u32,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, RecurrenceValidationError> {
        if !(1..=MAX_OCCURRENCES_PER_DAY).contains(&occurrences_per_day) {
            return Err(RecurrenceValidationError::OccurrencesPerDay {
                max: MAX_OCCURRENCES_PER_DAY,
            });
        }
        Ok(Self {
            kind,
            occurrences_per_day,
            start,
            end,
        })
    }

    /// Default start: `now`'s date at [`DEFAULT_REMINDER_HOUR`]:00 UTC.
    pub fn default_start(now: DateTime<Utc>) -> DateTime<Utc> {
        NaiveTime::from_hms_opt(DEFAULT_REMINDER_HOUR, 0, 0)
            .map(|time| now.date_naive().and_time(time).and_utc())
            .unwrap_or(now)
    }

    /// Recurrence kind.
    pub fn kind(&self) -> RecurrenceKind {
        self.kind
    }

    /// First candidate timestamp.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Expand into ascending timestamps, stopping at the end bound.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use medminder::domain::{RecurrenceKind, RecurrenceSpec};
    ///
    /// let start = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    /// let spec = RecurrenceSpec::new(RecurrenceKind::Weekly, 1, start, None).unwrap();
    /// assert_eq!(spec.occurrences().len(), 4);
    /// ```
    pub fn occurrences(&self) -> Vec<DateTime<Utc>> {
        let candidates: Vec<Option<DateTime<Utc>>> = match self.kind {
            RecurrenceKind::Daily => self.daily(),
            RecurrenceKind::Weekly => (0..WEEKLY_OCCURRENCES)
                .map(|week| {
                    self.start
                        .checked_add_signed(Duration::weeks(i64::from(week)))
                })
                .collect(),
            RecurrenceKind::Monthly => (0..MONTHLY_OCCURRENCES)
                .map(|month| self.start.checked_add_months(Months::new(month)))
                .collect(),
        };

        candidates
            .into_iter()
            .map_while(|candidate| candidate)
            .take_while(|at| self.end.is_none_or(|end| *at <= end))
            .collect()
    }

    fn daily(&self) -> Vec<Option<DateTime<Utc>>> {
        let per_day = i64::from(self.occurrences_per_day);
        (0..i64::from(DAILY_SPAN_DAYS))
            .flat_map(|day| {
                (0..per_day).map(move |slot| {
                    let offset = day * MILLIS_PER_DAY + slot * MILLIS_PER_DAY / per_day;
                    Duration::try_milliseconds(offset)
                })
            })
            .map(|offset| offset.and_then(|offset| self.start.checked_add_signed(offset)))
            .collect()
    }
}
