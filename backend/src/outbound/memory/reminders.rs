//! In-memory `ReminderRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::MemoryStore;
use crate::domain::ports::{ReminderRepository, ReminderRepositoryError};
use crate::domain::{MedicationId, Reminder, ReminderId, ReminderKind, UserId};

/// Reminder repository over a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryReminderRepository {
    store: MemoryStore,
}

impl MemoryReminderRepository {
    pub(super) fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn sorted(mut reminders: Vec<Reminder>) -> Vec<Reminder> {
    reminders.sort_by_key(|reminder| (reminder.scheduled_at(), *reminder.id().as_uuid()));
    reminders
}

fn to_count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

#[async_trait]
impl ReminderRepository for MemoryReminderRepository {
    async fn save(&self, reminder: &Reminder) -> Result<(), ReminderRepositoryError> {
        self.insert_all(std::slice::from_ref(reminder)).await
    }

    async fn insert_all(&self, batch: &[Reminder]) -> Result<(), ReminderRepositoryError> {
        let mut tables = self.store.tables.write().await;
        if let Some(orphan) = batch
            .iter()
            .find(|reminder| !tables.medications.contains_key(reminder.medication_id().as_uuid()))
        {
            return Err(ReminderRepositoryError::query(format!(
                "medication {} does not exist",
                orphan.medication_id()
            )));
        }
        for reminder in batch {
            tables
                .reminders
                .insert(*reminder.id().as_uuid(), reminder.clone());
        }
        Ok(())
    }

    async fn find_owned(
        &self,
        owner: &UserId,
        id: ReminderId,
    ) -> Result<Option<Reminder>, ReminderRepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .reminders
            .get(id.as_uuid())
            .filter(|reminder| reminder.owner() == owner)
            .cloned())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(sorted(
            tables
                .reminders
                .values()
                .filter(|reminder| reminder.owner() == owner)
                .cloned()
                .collect(),
        ))
    }

    async fn list_pending_between(
        &self,
        owner: Option<UserId>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(sorted(
            tables
                .reminders
                .values()
                .filter(|reminder| reminder.is_pending())
                .filter(|reminder| (from..=to).contains(&reminder.scheduled_at()))
                .filter(|reminder| owner.as_ref().is_none_or(|user| reminder.owner() == user))
                .cloned()
                .collect(),
        ))
    }

    async fn has_pending(
        &self,
        medication_id: MedicationId,
        kind: ReminderKind,
    ) -> Result<bool, ReminderRepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables.reminders.values().any(|reminder| {
            reminder.medication_id() == medication_id
                && reminder.kind() == kind
                && reminder.is_pending()
        }))
    }

    async fn delete_owned(
        &self,
        owner: &UserId,
        id: ReminderId,
    ) -> Result<bool, ReminderRepositoryError> {
        let mut tables = self.store.tables.write().await;
        let owned = tables
            .reminders
            .get(id.as_uuid())
            .is_some_and(|reminder| reminder.owner() == owner);
        if owned {
            tables.reminders.remove(id.as_uuid());
        }
        Ok(owned)
    }

    async fn delete_for_medication(
        &self,
        medication_id: MedicationId,
    ) -> Result<u64, ReminderRepositoryError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.reminders.len();
        tables
            .reminders
            .retain(|_, reminder| reminder.medication_id() != medication_id);
        Ok(to_count(before - tables.reminders.len()))
    }

    async fn mark_sent(
        &self,
        id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<bool, ReminderRepositoryError> {
        let mut tables = self.store.tables.write().await;
        Ok(tables
            .reminders
            .get_mut(id.as_uuid())
            .is_some_and(|reminder| reminder.mark_sent(at)))
    }

    async fn mark_missed_before(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<u64, ReminderRepositoryError> {
        let mut tables = self.store.tables.write().await;
        let missed = tables
            .reminders
            .values_mut()
            .filter(|reminder| reminder.scheduled_at() < cutoff)
            .map(|reminder| reminder.mark_missed(at))
            .filter(|marked| *marked)
            .count();
        Ok(to_count(missed))
    }
}
