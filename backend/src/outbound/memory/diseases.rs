//! In-memory `DiseaseRepository`.

use async_trait::async_trait;

use super::MemoryStore;
use crate::domain::ports::{DiseaseRepository, DiseaseRepositoryError};
use crate::domain::{Disease, DiseaseId, MedicationRecommendation, RecommendationId};

/// Disease repository over a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryDiseaseRepository {
    store: MemoryStore,
}

impl MemoryDiseaseRepository {
    pub(super) fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DiseaseRepository for MemoryDiseaseRepository {
    async fn save(&self, disease: &Disease) -> Result<(), DiseaseRepositoryError> {
        let mut tables = self.store.tables.write().await;
        let taken = tables
            .diseases
            .values()
            .any(|other| other.id() != disease.id() && other.name() == disease.name());
        if taken {
            return Err(DiseaseRepositoryError::duplicate("diseases_name_key"));
        }
        tables
            .diseases
            .insert(*disease.id().as_uuid(), disease.clone());
        Ok(())
    }

    async fn find(&self, id: DiseaseId) -> Result<Option<Disease>, DiseaseRepositoryError> {
        Ok(self
            .store
            .tables
            .read()
            .await
            .diseases
            .get(id.as_uuid())
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Disease>, DiseaseRepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .diseases
            .values()
            .find(|disease| disease.name() == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Disease>, DiseaseRepositoryError> {
        let tables = self.store.tables.read().await;
        let mut diseases: Vec<Disease> = tables.diseases.values().cloned().collect();
        diseases.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(diseases)
    }

    async fn delete(&self, id: DiseaseId) -> Result<bool, DiseaseRepositoryError> {
        let mut tables = self.store.tables.write().await;
        if tables.diseases.remove(id.as_uuid()).is_none() {
            return Ok(false);
        }
        tables
            .recommendations
            .retain(|_, recommendation| recommendation.disease_id() != id);
        Ok(true)
    }

    async fn recommendations(
        &self,
        disease_id: DiseaseId,
    ) -> Result<Vec<MedicationRecommendation>, DiseaseRepositoryError> {
        let tables = self.store.tables.read().await;
        let mut found: Vec<MedicationRecommendation> = tables
            .recommendations
            .values()
            .filter(|recommendation| recommendation.disease_id() == disease_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.strength()
                .value()
                .cmp(&a.strength().value())
                .then_with(|| a.medication_name().cmp(b.medication_name()))
        });
        Ok(found)
    }

    async fn save_recommendation(
        &self,
        recommendation: &MedicationRecommendation,
    ) -> Result<(), DiseaseRepositoryError> {
        let mut tables = self.store.tables.write().await;
        if !tables
            .diseases
            .contains_key(recommendation.disease_id().as_uuid())
        {
            return Err(DiseaseRepositoryError::query(format!(
                "disease {} does not exist",
                recommendation.disease_id()
            )));
        }
        let existing = tables.recommendations.values_mut().find(|stored| {
            stored.disease_id() == recommendation.disease_id()
                && stored.medication_name() == recommendation.medication_name()
        });
        match existing {
            Some(stored) => stored.set_strength(recommendation.strength()),
            None => {
                tables
                    .recommendations
                    .insert(*recommendation.id().as_uuid(), recommendation.clone());
            }
        }
        Ok(())
    }

    async fn delete_recommendation(
        &self,
        id: RecommendationId,
    ) -> Result<bool, DiseaseRepositoryError> {
        let mut tables = self.store.tables.write().await;
        Ok(tables.recommendations.remove(id.as_uuid()).is_some())
    }
}
