//! Port for reminder persistence and delivery-state transitions.
//!
//! State transitions are conditional: adapters only move a reminder out of
//! the pending state once, so concurrent dispatchers cannot double-record a
//! delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{MedicationId, Reminder, ReminderId, ReminderKind, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reminder repository adapters.
    pub enum ReminderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "reminder repository connection failed: {message}" as service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "reminder repository query failed: {message}" as internal,
    }
}

/// Port for reading, writing and transitioning reminders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Insert or update a reminder.
    async fn save(&self, reminder: &Reminder) -> Result<(), ReminderRepositoryError>;

    /// Insert a batch of reminders atomically.
    async fn insert_all(&self, reminders: &[Reminder]) -> Result<(), ReminderRepositoryError>;

    /// Find a reminder owned by `owner`.
    async fn find_owned(
        &self,
        owner: &UserId,
        id: ReminderId,
    ) -> Result<Option<Reminder>, ReminderRepositoryError>;

    /// All reminders of one owner ordered by scheduled time.
    async fn list_by_owner(&self, owner: &UserId)
    -> Result<Vec<Reminder>, ReminderRepositoryError>;

    /// Pending reminders scheduled within `[from, to]`, ordered by scheduled
    /// time. `owner` narrows the result to one user.
    async fn list_pending_between(
        &self,
        owner: Option<UserId>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError>;

    /// Whether a pending reminder of `kind` exists for the medication.
    async fn has_pending(
        &self,
        medication_id: MedicationId,
        kind: ReminderKind,
    ) -> Result<bool, ReminderRepositoryError>;

    /// Delete a reminder owned by `owner`.
    async fn delete_owned(
        &self,
        owner: &UserId,
        id: ReminderId,
    ) -> Result<bool, ReminderRepositoryError>;

    /// Delete every reminder attached to a medication.
    async fn delete_for_medication(
        &self,
        medication_id: MedicationId,
    ) -> Result<u64, ReminderRepositoryError>;

    /// Record a delivery. Returns `false` when the reminder was no longer
    /// pending.
    async fn mark_sent(
        &self,
        id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<bool, ReminderRepositoryError>;

    /// Move pending reminders scheduled before `cutoff` to the missed state.
    /// Returns the number of reminders transitioned.
    async fn mark_missed_before(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<u64, ReminderRepositoryError>;
}
