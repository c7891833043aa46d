//! Driving port for reminder management.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Error, MedicationId, RecurrenceKind, Reminder, ReminderId, ReminderKind, UserId,
};

/// Input for a single reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    /// Medication the reminder refers to.
    pub medication_id: MedicationId,
    /// Reminder kind.
    pub kind: ReminderKind,
    /// Delivery time.
    pub scheduled_at: DateTime<Utc>,
    /// Optional custom message.
    pub message: Option<String>,
}

/// Partial update of a pending reminder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderUpdate {
    /// New delivery time.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// New message; an inner `None` clears it.
    pub message: Option<Option<String>>,
}

/// Request for a recurring usage schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageScheduleRequest {
    /// Frequency.
    pub kind: RecurrenceKind,
    /// Doses per day for daily schedules; defaults to 1.
    pub occurrences_per_day: Option<u32>,
    /// First occurrence; defaults to today at 08:00 UTC.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
    /// Message shared by every generated reminder.
    pub message: Option<String>,
}

/// Reminder use-cases exposed to inbound adapters, scoped to `owner`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderManagement: Send + Sync {
    /// Create one reminder.
    async fn create(&self, owner: &UserId, input: NewReminder) -> Result<Reminder, Error>;

    /// Fetch one reminder.
    async fn get(&self, owner: &UserId, id: ReminderId) -> Result<Reminder, Error>;

    /// List the owner's reminders by scheduled time.
    async fn list(&self, owner: &UserId) -> Result<Vec<Reminder>, Error>;

    /// Reschedule or reword a pending reminder.
    async fn update(
        &self,
        owner: &UserId,
        id: ReminderId,
        update: ReminderUpdate,
    ) -> Result<Reminder, Error>;

    /// Delete a reminder.
    async fn delete(&self, owner: &UserId, id: ReminderId) -> Result<(), Error>;

    /// Expand a recurrence into persisted usage reminders.
    async fn generate_usage_schedule(
        &self,
        owner: &UserId,
        medication_id: MedicationId,
        request: UsageScheduleRequest,
    ) -> Result<Vec<Reminder>, Error>;

    /// Pending reminders due within the next `hours` (default 24).
    async fn upcoming(&self, owner: &UserId, hours: Option<u32>) -> Result<Vec<Reminder>, Error>;
}
