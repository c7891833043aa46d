//! Driving port for the disease catalogue.

use async_trait::async_trait;

use crate::domain::{Disease, DiseaseId, Error, MedicationRecommendation, RecommendationId};

/// A disease with its recommendations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseDetails {
    /// The disease.
    pub disease: Disease,
    /// Recommendations, strongest first.
    pub recommendations: Vec<MedicationRecommendation>,
}

/// Disease catalogue use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiseaseCatalogue: Send + Sync {
    /// Create a disease with a unique name.
    async fn create(&self, name: &str, description: Option<String>) -> Result<Disease, Error>;

    /// Fetch a disease and its recommendations.
    async fn get(&self, id: DiseaseId) -> Result<DiseaseDetails, Error>;

    /// List every disease.
    async fn list(&self) -> Result<Vec<Disease>, Error>;

    /// Rename or re-describe a disease.
    async fn update(
        &self,
        id: DiseaseId,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<Disease, Error>;

    /// Delete a disease and its recommendations.
    async fn delete(&self, id: DiseaseId) -> Result<(), Error>;

    /// Add a recommendation, or update the strength of an existing one for
    /// the same medication name.
    async fn recommend(
        &self,
        disease_id: DiseaseId,
        medication_name: &str,
        strength: Option<i64>,
    ) -> Result<MedicationRecommendation, Error>;

    /// Remove a recommendation.
    async fn remove_recommendation(&self, id: RecommendationId) -> Result<(), Error>;
}
