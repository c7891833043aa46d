//! Reminder management and scheduling service.
//!
//! Owns reminder CRUD for the HTTP layer, expands usage schedules into
//! persisted reminders and schedules expiry reminders for medications that
//! entered the near-expiry window.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    MedicationRepository, NewReminder, ReminderManagement, ReminderRepository, ReminderUpdate,
    UsageScheduleRequest,
};
use crate::domain::recurrence::DEFAULT_REMINDER_HOUR;
use crate::domain::{
    DEFAULT_EXPIRY_WINDOW_DAYS, Error, Medication, MedicationId, RecurrenceSpec, Reminder,
    ReminderId, ReminderKind, ReminderValidationError, UserId,
};

/// Default look-ahead for [`ReminderManagement::upcoming`].
pub const DEFAULT_UPCOMING_HOURS: u32 = 24;
/// Longest accepted look-ahead for [`ReminderManagement::upcoming`].
pub const MAX_UPCOMING_HOURS: u32 = 720;

/// Port bundle required by the reminder service.
pub struct ReminderServicePorts {
    /// Reminder persistence.
    pub reminders: Arc<dyn ReminderRepository>,
    /// Medication persistence, for ownership checks and expiry candidates.
    pub medications: Arc<dyn MedicationRepository>,
}

/// Counts reported by one expiry-scheduling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirySchedulingOutcome {
    /// Near-expiry, non-expired medications examined.
    pub candidates: usize,
    /// Reminders created.
    pub scheduled: usize,
    /// Medications skipped because a pending expiry reminder exists.
    pub already_scheduled: usize,
    /// Medications skipped because the reminder time has passed.
    pub past_due: usize,
}

/// Reminder service implementing [`ReminderManagement`].
#[derive(Clone)]
pub struct ReminderService {
    reminders: Arc<dyn ReminderRepository>,
    medications: Arc<dyn MedicationRepository>,
    clock: Arc<dyn Clock>,
    expiry_window_days: u32,
}

fn map_validation(err: ReminderValidationError) -> Error {
    match err {
        ReminderValidationError::NotPending => Error::conflict(err.to_string()),
        ReminderValidationError::MessageTooLong { .. } => Error::invalid_request(err.to_string()),
    }
}

impl ReminderService {
    /// Create a service with the default expiry window.
    pub fn new(ports: ReminderServicePorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            reminders: ports.reminders,
            medications: ports.medications,
            clock,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
        }
    }

    /// Override the expiry window used for scheduling.
    pub fn with_expiry_window(mut self, days: u32) -> Self {
        self.expiry_window_days = days;
        self
    }

    async fn owned_medication(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<Medication, Error> {
        self.medications
            .find_owned(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("medication {id} not found")))
    }

    async fn owned_reminder(&self, owner: &UserId, id: ReminderId) -> Result<Reminder, Error> {
        self.reminders
            .find_owned(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("reminder {id} not found")))
    }

    /// `(expiry_date - window)` at the reminder hour, or `None` when the
    /// medication has no expiry date.
    fn expiry_reminder_time(&self, medication: &Medication) -> Option<DateTime<Utc>> {
        let expiry = medication.expiry_date()?;
        let day = expiry.checked_sub_days(Days::new(u64::from(self.expiry_window_days)))?;
        let time = NaiveTime::from_hms_opt(DEFAULT_REMINDER_HOUR, 0, 0)?;
        Some(day.and_time(time).and_utc())
    }

    /// Create an expiry reminder for every near-expiry medication that lacks
    /// a pending one. Re-running never creates duplicates.
    pub async fn schedule_expiry_reminders(&self) -> Result<ExpirySchedulingOutcome, Error> {
        let now = self.clock.utc();
        let today = now.date_naive();
        let horizon = today
            .checked_add_days(Days::new(u64::from(self.expiry_window_days)))
            .unwrap_or(today);

        let mut outcome = ExpirySchedulingOutcome::default();
        let candidates = self
            .medications
            .list_expiring_between(today, horizon)
            .await?;

        for medication in candidates {
            let status = medication.status_on(today, self.expiry_window_days);
            if !status.is_near_expiry || status.is_expired {
                continue;
            }
            outcome.candidates += 1;

            if self
                .reminders
                .has_pending(medication.id(), ReminderKind::Expiry)
                .await?
            {
                outcome.already_scheduled += 1;
                continue;
            }

            let Some(at) = self.expiry_reminder_time(&medication).filter(|at| *at > now) else {
                outcome.past_due += 1;
                continue;
            };

            let reminder = Reminder::pending(
                medication.owner().clone(),
                medication.id(),
                ReminderKind::Expiry,
                at,
                None,
                now,
            )
            .map_err(map_validation)?;
            self.reminders.save(&reminder).await?;
            debug!(medication = %medication.id(), %at, "scheduled expiry reminder");
            outcome.scheduled += 1;
        }

        info!(
            candidates = outcome.candidates,
            scheduled = outcome.scheduled,
            already_scheduled = outcome.already_scheduled,
            past_due = outcome.past_due,
            "expiry reminder scheduling finished"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl ReminderManagement for ReminderService {
    async fn create(&self, owner: &UserId, input: NewReminder) -> Result<Reminder, Error> {
        let medication = self.owned_medication(owner, input.medication_id).await?;
        if input.kind == ReminderKind::Expiry {
            let Some(expiry) = medication.expiry_date() else {
                return Err(Error::invalid_request(
                    "expiry reminders need a medication with a known expiry date",
                ));
            };
            if input.scheduled_at.date_naive() >= expiry {
                return Err(Error::invalid_request(
                    "expiry reminders must be scheduled before the expiry date",
                ));
            }
        }

        let reminder = Reminder::pending(
            owner.clone(),
            medication.id(),
            input.kind,
            input.scheduled_at,
            input.message,
            self.clock.utc(),
        )
        .map_err(map_validation)?;
        self.reminders.save(&reminder).await?;
        Ok(reminder)
    }

    async fn get(&self, owner: &UserId, id: ReminderId) -> Result<Reminder, Error> {
        self.owned_reminder(owner, id).await
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<Reminder>, Error> {
        Ok(self.reminders.list_by_owner(owner).await?)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: ReminderId,
        update: ReminderUpdate,
    ) -> Result<Reminder, Error> {
        let mut reminder = self.owned_reminder(owner, id).await?;
        reminder
            .reschedule(update.scheduled_at, update.message)
            .map_err(map_validation)?;
        self.reminders.save(&reminder).await?;
        Ok(reminder)
    }

    async fn delete(&self, owner: &UserId, id: ReminderId) -> Result<(), Error> {
        if self.reminders.delete_owned(owner, id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("reminder {id} not found")))
        }
    }

    async fn generate_usage_schedule(
        &self,
        owner: &UserId,
        medication_id: MedicationId,
        request: UsageScheduleRequest,
    ) -> Result<Vec<Reminder>, Error> {
        let medication = self.owned_medication(owner, medication_id).await?;
        let now = self.clock.utc();
        let spec = RecurrenceSpec::new(
            request.kind,
            request.occurrences_per_day.unwrap_or(1),
            request
                .start
                .unwrap_or_else(|| RecurrenceSpec::default_start(now)),
            request.end,
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        let reminders = spec
            .occurrences()
            .into_iter()
            .map(|at| {
                Reminder::pending(
                    owner.clone(),
                    medication.id(),
                    ReminderKind::Usage,
                    at,
                    request.message.clone(),
                    now,
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_validation)?;

        if !reminders.is_empty() {
            self.reminders.insert_all(&reminders).await?;
        }
        info!(
            medication = %medication.id(),
            kind = %spec.kind(),
            count = reminders.len(),
            "generated usage schedule"
        );
        Ok(reminders)
    }

    async fn upcoming(&self, owner: &UserId, hours: Option<u32>) -> Result<Vec<Reminder>, Error> {
        let hours = hours
            .unwrap_or(DEFAULT_UPCOMING_HOURS)
            .clamp(1, MAX_UPCOMING_HOURS);
        let now = self.clock.utc();
        let until = now + Duration::hours(i64::from(hours));
        Ok(self
            .reminders
            .list_pending_between(Some(owner.clone()), now, until)
            .await?)
    }
}

#[cfg(test)]
#[path = "reminder_service_tests.rs"]
mod tests;
