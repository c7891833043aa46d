//! In-memory `MedicationRepository`.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::MemoryStore;
use crate::domain::ports::{MedicationRepository, MedicationRepositoryError};
use crate::domain::{Medication, MedicationId, UserId};

/// Medication repository over a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryMedicationRepository {
    store: MemoryStore,
}

impl MemoryMedicationRepository {
    pub(super) fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MedicationRepository for MemoryMedicationRepository {
    async fn save(&self, medication: &Medication) -> Result<(), MedicationRepositoryError> {
        let mut tables = self.store.tables.write().await;
        if !tables.users.contains_key(medication.owner().as_uuid()) {
            return Err(MedicationRepositoryError::query(format!(
                "owner {} does not exist",
                medication.owner()
            )));
        }
        tables
            .medications
            .insert(*medication.id().as_uuid(), medication.clone());
        Ok(())
    }

    async fn find_owned(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<Option<Medication>, MedicationRepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .medications
            .get(id.as_uuid())
            .filter(|medication| medication.owner() == owner)
            .cloned())
    }

    async fn find_by_id(
        &self,
        id: MedicationId,
    ) -> Result<Option<Medication>, MedicationRepositoryError> {
        Ok(self
            .store
            .tables
            .read()
            .await
            .medications
            .get(id.as_uuid())
            .cloned())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Medication>, MedicationRepositoryError> {
        let tables = self.store.tables.read().await;
        let mut owned: Vec<Medication> = tables
            .medications
            .values()
            .filter(|medication| medication.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|medication| (medication.created_at(), *medication.id().as_uuid()));
        Ok(owned)
    }

    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Medication>, MedicationRepositoryError> {
        let tables = self.store.tables.read().await;
        let mut expiring: Vec<Medication> = tables
            .medications
            .values()
            .filter(|medication| {
                medication
                    .expiry_date()
                    .is_some_and(|expiry| (from..=to).contains(&expiry))
            })
            .cloned()
            .collect();
        expiring.sort_by_key(|medication| (medication.expiry_date(), *medication.id().as_uuid()));
        Ok(expiring)
    }

    async fn delete_owned(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<bool, MedicationRepositoryError> {
        let mut tables = self.store.tables.write().await;
        let owned = tables
            .medications
            .get(id.as_uuid())
            .is_some_and(|medication| medication.owner() == owner);
        if !owned {
            return Ok(false);
        }
        tables.medications.remove(id.as_uuid());
        tables
            .reminders
            .retain(|_, reminder| reminder.medication_id() != id);
        Ok(true)
    }
}
