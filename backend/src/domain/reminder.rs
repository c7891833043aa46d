//! Reminder entity and its delivery state machine.
//!
//! A reminder starts pending and ends in exactly one terminal state: sent on
//! the first successful delivery, or missed once its dispatch window passes
//! without one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{MedicationId, UserId};

/// Longest accepted reminder message.
pub const MESSAGE_MAX: usize = 500;

/// Stable reminder identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReminderId(Uuid);

impl ReminderId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    /// The medication is about to expire.
    Expiry,
    /// Time to take a dose.
    Usage,
}

impl ReminderKind {
    /// Stable lowercase label used in storage and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expiry => "expiry",
            Self::Usage => "usage",
        }
    }

    /// Message used when a reminder carries none of its own.
    ///
    /// # Examples
    /// ```
    /// use medminder::domain::ReminderKind;
    ///
    /// assert_eq!(
    ///     ReminderKind::Usage.default_message("Aspirin", 30),
    ///     "Please take your medication 'Aspirin' on time."
    /// );
    /// ```
    pub fn default_message(self, medication_name: &str, window_days: u32) -> String {
        match self {
            Self::Expiry => format!(
                "Your medication '{medication_name}' will expire in {window_days} days, \
                 please deal with it in time."
            ),
            Self::Usage => format!("Please take your medication '{medication_name}' on time."),
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown reminder kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reminder kind: {0}")]
pub struct UnknownReminderKind(pub String);

impl FromStr for ReminderKind {
    type Err = UnknownReminderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expiry" => Ok(Self::Expiry),
            "usage" => Ok(Self::Usage),
            other => Err(UnknownReminderKind(other.to_owned())),
        }
    }
}

/// Delivery state of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    /// Awaiting delivery.
    Pending,
    /// Delivered through at least one channel.
    Sent {
        /// Delivery time.
        at: DateTime<Utc>,
    },
    /// The dispatch window passed without a delivery.
    Missed {
        /// When the reminder was declared missed.
        at: DateTime<Utc>,
    },
}

impl ReminderState {
    /// Build a state from the stored timestamps. A sent time wins over a
    /// missed time.
    pub fn from_timestamps(sent_at: Option<DateTime<Utc>>, missed_at: Option<DateTime<Utc>>) -> Self {
        match (sent_at, missed_at) {
            (Some(at), _) => Self::Sent { at },
            (None, Some(at)) => Self::Missed { at },
            (None, None) => Self::Pending,
        }
    }

    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent { .. } => "sent",
            Self::Missed { .. } => "missed",
        }
    }
}

/// Validation failures for reminder input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReminderValidationError {
    /// Message exceeds [`MESSAGE_MAX`].
    #[error("message must be at most {max} characters")]
    MessageTooLong {
        /// Maximum length.
        max: usize,
    },
    /// The reminder was already delivered or missed.
    #[error("reminder is no longer pending")]
    NotPending,
}

/// Input for building a [`Reminder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    /// Identifier.
    pub id: ReminderId,
    /// Owning user.
    pub owner: UserId,
    /// Medication the reminder refers to.
    pub medication_id: MedicationId,
    /// Reminder kind.
    pub kind: ReminderKind,
    /// When the reminder should be delivered.
    pub scheduled_at: DateTime<Utc>,
    /// Optional custom message.
    pub message: Option<String>,
    /// Delivery state.
    pub state: ReminderState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A scheduled notification about a medication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    id: ReminderId,
    owner: UserId,
    medication_id: MedicationId,
    kind: ReminderKind,
    scheduled_at: DateTime<Utc>,
    message: Option<String>,
    state: ReminderState,
    created_at: DateTime<Utc>,
}

fn validate_message(message: Option<String>) -> Result<Option<String>, ReminderValidationError> {
    match message.map(|text| text.trim().to_owned()) {
        Some(text) if text.is_empty() => Ok(None),
        Some(text) if text.chars().count() > MESSAGE_MAX => {
            Err(ReminderValidationError::MessageTooLong { max: MESSAGE_MAX })
        }
        other => Ok(other),
    }
}

impl Reminder {
    /// Validate a draft.
    pub fn new(draft: ReminderDraft) -> Result<Self, ReminderValidationError> {
        let ReminderDraft {
            id,
            owner,
            medication_id,
            kind,
            scheduled_at,
            message,
            state,
            created_at,
        } = draft;
        Ok(Self {
            id,
            owner,
            medication_id,
            kind,
            scheduled_at,
            message: validate_message(message)?,
            state,
            created_at,
        })
    }

    /// Build a new pending reminder.
    pub fn pending(
        owner: UserId,
        medication_id: MedicationId,
        kind: ReminderKind,
        scheduled_at: DateTime<Utc>,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ReminderValidationError> {
        Self::new(ReminderDraft {
            id: ReminderId::random(),
            owner,
            medication_id,
            kind,
            scheduled_at,
            message,
            state: ReminderState::Pending,
            created_at: now,
        })
    }

    /// Move the reminder to a new time and/or message. Only pending reminders
    /// can be rescheduled.
    pub fn reschedule(
        &mut self,
        scheduled_at: Option<DateTime<Utc>>,
        message: Option<Option<String>>,
    ) -> Result<(), ReminderValidationError> {
        if !self.is_pending() {
            return Err(ReminderValidationError::NotPending);
        }
        let message = message.map(validate_message).transpose()?;
        if let Some(at) = scheduled_at {
            self.scheduled_at = at;
        }
        if let Some(text) = message {
            self.message = text;
        }
        Ok(())
    }

    /// Message to deliver, falling back to the kind's template.
    pub fn message_or_default(&self, medication_name: &str, window_days: u32) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.kind.default_message(medication_name, window_days))
    }

    /// Whether the reminder still awaits delivery.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ReminderState::Pending)
    }

    /// Record a delivery. Returns `false`, leaving the state untouched, when
    /// the reminder is no longer pending.
    pub fn mark_sent(&mut self, at: DateTime<Utc>) -> bool {
        self.settle(ReminderState::Sent { at })
    }

    /// Declare the reminder missed. Returns `false` when it is no longer
    /// pending.
    pub fn mark_missed(&mut self, at: DateTime<Utc>) -> bool {
        self.settle(ReminderState::Missed { at })
    }

    fn settle(&mut self, state: ReminderState) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = state;
        true
    }

    /// Identifier.
    pub fn id(&self) -> ReminderId {
        self.id
    }

    /// Owning user.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Medication the reminder refers to.
    pub fn medication_id(&self) -> MedicationId {
        self.medication_id
    }

    /// Reminder kind.
    pub fn kind(&self) -> ReminderKind {
        self.kind
    }

    /// Scheduled delivery time.
    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    /// Custom message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Delivery state.
    pub fn state(&self) -> ReminderState {
        self.state
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn reminder() -> Reminder {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp");
        Reminder::pending(
            UserId::random(),
            MedicationId::random(),
            ReminderKind::Expiry,
            now,
            None,
            now,
        )
        .expect("valid reminder")
    }

    #[rstest]
    #[case("expiry", Some(ReminderKind::Expiry))]
    #[case("usage", Some(ReminderKind::Usage))]
    #[case("refill", None)]
    fn kind_parses_stable_labels(#[case] raw: &str, #[case] expected: Option<ReminderKind>) {
        assert_eq!(raw.parse::<ReminderKind>().ok(), expected);
    }

    #[rstest]
    fn default_message_uses_kind_template(reminder: Reminder) {
        assert_eq!(
            reminder.message_or_default("Aspirin", 30),
            "Your medication 'Aspirin' will expire in 30 days, please deal with it in time."
        );
    }

    #[rstest]
    fn custom_message_wins_over_template(mut reminder: Reminder) {
        reminder
            .reschedule(None, Some(Some("Check the cabinet".to_owned())))
            .expect("pending reminder");
        assert_eq!(reminder.message_or_default("Aspirin", 30), "Check the cabinet");
    }

    #[rstest]
    fn overlong_messages_are_rejected(mut reminder: Reminder) {
        let error = reminder
            .reschedule(None, Some(Some("x".repeat(MESSAGE_MAX + 1))))
            .expect_err("too long");
        assert_eq!(error, ReminderValidationError::MessageTooLong { max: MESSAGE_MAX });
    }

    #[rstest]
    fn state_prefers_sent_over_missed() {
        let at = Utc::now();
        assert_eq!(
            ReminderState::from_timestamps(Some(at), Some(at)),
            ReminderState::Sent { at }
        );
        assert_eq!(
            ReminderState::from_timestamps(None, Some(at)),
            ReminderState::Missed { at }
        );
        assert_eq!(ReminderState::from_timestamps(None, None), ReminderState::Pending);
    }

    #[rstest]
    fn terminal_reminders_cannot_be_rescheduled(reminder: Reminder) {
        let at = reminder.scheduled_at();
        let mut sent = Reminder::new(ReminderDraft {
            id: reminder.id(),
            owner: reminder.owner().clone(),
            medication_id: reminder.medication_id(),
            kind: reminder.kind(),
            scheduled_at: at,
            message: None,
            state: ReminderState::Sent { at },
            created_at: at,
        })
        .expect("valid reminder");

        let error = sent.reschedule(Some(at), None).expect_err("not pending");
        assert_eq!(error, ReminderValidationError::NotPending);
    }

    #[rstest]
    fn delivery_states_are_terminal(mut reminder: Reminder) {
        let at = reminder.scheduled_at();
        assert!(reminder.mark_sent(at));
        assert!(!reminder.mark_missed(at));
        assert!(!reminder.mark_sent(at));
        assert_eq!(reminder.state(), ReminderState::Sent { at });
    }
}
