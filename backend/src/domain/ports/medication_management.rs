//! Driving port for the medication cabinet.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    Error, ExpiryStatus, Medication, MedicationChanges, MedicationId, MedicationInfo,
    RecommendationStrength, UserId,
};

/// Input for registering a medication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMedication {
    /// Display name.
    pub name: String,
    /// Production date.
    pub production_date: Option<NaiveDate>,
    /// Shelf life in days.
    pub shelf_life_days: Option<i64>,
    /// Amount on hand; defaults to 1.
    pub quantity: Option<f64>,
    /// Unit; defaults to `tablet`.
    pub unit: Option<String>,
    /// What the medication treats.
    pub efficacy: Option<String>,
    /// Dosage instructions.
    pub usage: Option<String>,
    /// Illustration URL.
    pub image_url: Option<String>,
}

/// A medication together with its expiry flags as of today.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationView {
    /// The stored medication.
    pub medication: Medication,
    /// Expiry flags.
    pub status: ExpiryStatus,
}

/// A recommended medication the owner does not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMedication {
    /// Recommended name.
    pub name: String,
    /// Reference details, when the knowledge base knows the name.
    pub info: Option<MedicationInfo>,
    /// Strength, when the recommendation came from the disease catalogue.
    pub strength: Option<RecommendationStrength>,
}

/// What the owner's cabinet offers for a disease.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseMedicationReport {
    /// Disease as queried.
    pub disease: String,
    /// Non-expired medications whose name is recommended.
    pub available: Vec<MedicationView>,
    /// Recommended medications the owner lacks.
    pub missing: Vec<MissingMedication>,
    /// Every near-expiry medication in the cabinet.
    pub near_expiry: Vec<MedicationView>,
    /// Every expired medication in the cabinet.
    pub expired: Vec<MedicationView>,
}

/// Medication use-cases exposed to inbound adapters. Every operation is
/// scoped to `owner`; another user's medication reads as not found.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicationManagement: Send + Sync {
    /// Register a medication, filling blank descriptive fields from the
    /// knowledge base.
    async fn create(&self, owner: &UserId, input: NewMedication) -> Result<MedicationView, Error>;

    /// Fetch one medication.
    async fn get(&self, owner: &UserId, id: MedicationId) -> Result<MedicationView, Error>;

    /// List the owner's medications.
    async fn list(&self, owner: &UserId) -> Result<Vec<MedicationView>, Error>;

    /// Apply a partial update.
    async fn update(
        &self,
        owner: &UserId,
        id: MedicationId,
        changes: MedicationChanges,
    ) -> Result<MedicationView, Error>;

    /// Delete a medication and its reminders.
    async fn delete(&self, owner: &UserId, id: MedicationId) -> Result<(), Error>;

    /// Look a name up in the knowledge base.
    async fn search(&self, name: &str) -> Result<MedicationInfo, Error>;

    /// Cabinet report for a disease.
    async fn for_disease(
        &self,
        owner: &UserId,
        disease: &str,
    ) -> Result<DiseaseMedicationReport, Error>;
}
