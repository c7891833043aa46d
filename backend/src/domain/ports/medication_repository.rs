//! Port for medication persistence.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Medication, MedicationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by medication repository adapters.
    pub enum MedicationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "medication repository connection failed: {message}" as service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "medication repository query failed: {message}" as internal,
    }
}

/// Port for reading and writing medications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicationRepository: Send + Sync {
    /// Insert or update a medication.
    async fn save(&self, medication: &Medication) -> Result<(), MedicationRepositoryError>;

    /// Find a medication owned by `owner`.
    async fn find_owned(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<Option<Medication>, MedicationRepositoryError>;

    /// Find a medication regardless of owner.
    async fn find_by_id(
        &self,
        id: MedicationId,
    ) -> Result<Option<Medication>, MedicationRepositoryError>;

    /// All medications of one owner, oldest first.
    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Medication>, MedicationRepositoryError>;

    /// Medications whose expiry date lies in `[from, to]`, across all owners.
    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Medication>, MedicationRepositoryError>;

    /// Delete a medication owned by `owner`. Returns whether a row was
    /// removed.
    async fn delete_owned(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<bool, MedicationRepositoryError>;
}
