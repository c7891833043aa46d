//! Disease catalogue service.
//!
//! Disease names are unique; recommendations are unique per
//! `(disease, medication name)` and re-adding a pair updates its strength.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{DiseaseCatalogue, DiseaseDetails, DiseaseRepository};
use crate::domain::{
    Disease, DiseaseId, DiseaseValidationError, Error, MedicationRecommendation,
    RecommendationId, RecommendationStrength,
};

/// Disease catalogue service implementing [`DiseaseCatalogue`].
#[derive(Clone)]
pub struct DiseaseService<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> DiseaseService<R> {
    /// Create a new service over the given repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

fn invalid(err: DiseaseValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

impl<R> DiseaseService<R>
where
    R: DiseaseRepository + ?Sized,
{
    async fn existing(&self, id: DiseaseId) -> Result<Disease, Error> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("disease {id} not found")))
    }

    async fn ensure_name_free(&self, name: &str, current: Option<DiseaseId>) -> Result<(), Error> {
        match self.repository.find_by_name(name).await? {
            Some(other) if Some(other.id()) != current => Err(Error::conflict(format!(
                "disease {name} already exists"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<R> DiseaseCatalogue for DiseaseService<R>
where
    R: DiseaseRepository + ?Sized,
{
    async fn create(&self, name: &str, description: Option<String>) -> Result<Disease, Error> {
        let disease = Disease::new(DiseaseId::random(), name, description).map_err(invalid)?;
        self.ensure_name_free(disease.name(), None).await?;
        self.repository.save(&disease).await?;
        Ok(disease)
    }

    async fn get(&self, id: DiseaseId) -> Result<DiseaseDetails, Error> {
        let disease = self.existing(id).await?;
        let recommendations = self.repository.recommendations(id).await?;
        Ok(DiseaseDetails {
            disease,
            recommendations,
        })
    }

    async fn list(&self) -> Result<Vec<Disease>, Error> {
        Ok(self.repository.list().await?)
    }

    async fn update(
        &self,
        id: DiseaseId,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<Disease, Error> {
        let mut disease = self.existing(id).await?;
        disease
            .apply(name.as_deref(), description)
            .map_err(invalid)?;
        self.ensure_name_free(disease.name(), Some(id)).await?;
        self.repository.save(&disease).await?;
        Ok(disease)
    }

    async fn delete(&self, id: DiseaseId) -> Result<(), Error> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("disease {id} not found")))
        }
    }

    async fn recommend(
        &self,
        disease_id: DiseaseId,
        medication_name: &str,
        strength: Option<i64>,
    ) -> Result<MedicationRecommendation, Error> {
        let strength = strength
            .map(RecommendationStrength::new)
            .transpose()
            .map_err(invalid)?
            .unwrap_or_default();
        let candidate = MedicationRecommendation::new(
            RecommendationId::random(),
            disease_id,
            medication_name,
            strength,
        )
        .map_err(invalid)?;
        self.existing(disease_id).await?;

        let existing = self
            .repository
            .recommendations(disease_id)
            .await?
            .into_iter()
            .find(|rec| rec.medication_name() == candidate.medication_name());
        let recommendation = match existing {
            Some(mut current) => {
                debug!(recommendation = %current.id(), "updating recommendation strength");
                current.set_strength(strength);
                current
            }
            None => candidate,
        };
        self.repository.save_recommendation(&recommendation).await?;
        Ok(recommendation)
    }

    async fn remove_recommendation(&self, id: RecommendationId) -> Result<(), Error> {
        if self.repository.delete_recommendation(id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("recommendation {id} not found")))
        }
    }
}
