//! Port for diseases and their medication recommendations.

use async_trait::async_trait;

use crate::domain::{Disease, DiseaseId, MedicationRecommendation, RecommendationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by disease repository adapters.
    pub enum DiseaseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "disease repository connection failed: {message}" as service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } => "disease repository query failed: {message}" as internal,
        /// The disease name is already taken.
        Duplicate { message: String } => "disease already exists: {message}" as conflict,
    }
}

/// Port for disease and recommendation persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiseaseRepository: Send + Sync {
    /// Insert or update a disease.
    async fn save(&self, disease: &Disease) -> Result<(), DiseaseRepositoryError>;

    /// Fetch a disease by id.
    async fn find(&self, id: DiseaseId) -> Result<Option<Disease>, DiseaseRepositoryError>;

    /// Fetch a disease by exact name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Disease>, DiseaseRepositoryError>;

    /// Every disease ordered by name.
    async fn list(&self) -> Result<Vec<Disease>, DiseaseRepositoryError>;

    /// Delete a disease with its recommendations.
    async fn delete(&self, id: DiseaseId) -> Result<bool, DiseaseRepositoryError>;

    /// Recommendations of a disease, strongest first.
    async fn recommendations(
        &self,
        disease_id: DiseaseId,
    ) -> Result<Vec<MedicationRecommendation>, DiseaseRepositoryError>;

    /// Insert or update a recommendation. The `(disease, medication name)`
    /// pair is unique.
    async fn save_recommendation(
        &self,
        recommendation: &MedicationRecommendation,
    ) -> Result<(), DiseaseRepositoryError>;

    /// Delete a recommendation.
    async fn delete_recommendation(
        &self,
        id: RecommendationId,
    ) -> Result<bool, DiseaseRepositoryError>;
}
