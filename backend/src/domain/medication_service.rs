//! Medication cabinet service.
//!
//! Implements [`MedicationManagement`] over the medication, reminder and
//! disease repositories plus the knowledge base. Expiry flags are evaluated
//! against the injected clock so tests can pin "today".

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    DiseaseMedicationReport, DiseaseRepository, MedicationKnowledge, MedicationManagement,
    MedicationRepository, MedicationView, MissingMedication, NewMedication, ReminderRepository,
};
use crate::domain::{
    DEFAULT_EXPIRY_WINDOW_DAYS, DEFAULT_UNIT, Error, Medication, MedicationChanges,
    MedicationDraft, MedicationId, MedicationInfo, RecommendationStrength, UserId,
    validate_medication_name,
};

const DEFAULT_QUANTITY: f64 = 1.0;

/// Medication service implementing the cabinet driving port.
#[derive(Clone)]
pub struct MedicationService {
    medications: Arc<dyn MedicationRepository>,
    reminders: Arc<dyn ReminderRepository>,
    diseases: Arc<dyn DiseaseRepository>,
    knowledge: Arc<dyn MedicationKnowledge>,
    clock: Arc<dyn Clock>,
    expiry_window_days: u32,
}

impl MedicationService {
    /// Create a service with the default 30-day expiry window.
    pub fn new(
        medications: Arc<dyn MedicationRepository>,
        reminders: Arc<dyn ReminderRepository>,
        diseases: Arc<dyn DiseaseRepository>,
        knowledge: Arc<dyn MedicationKnowledge>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            medications,
            reminders,
            diseases,
            knowledge,
            clock,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
        }
    }

    /// Override the near-expiry window.
    pub fn with_expiry_window(mut self, days: u32) -> Self {
        self.expiry_window_days = days;
        self
    }

    fn view(&self, medication: Medication) -> MedicationView {
        let today = self.clock.utc().date_naive();
        let status = medication.status_on(today, self.expiry_window_days);
        MedicationView { medication, status }
    }

    async fn owned(&self, owner: &UserId, id: MedicationId) -> Result<Medication, Error> {
        self.medications
            .find_owned(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("medication {id} not found")))
    }

    /// Lookup failures are logged and read as "unknown".
    async fn lookup_quietly(&self, name: &str) -> Option<MedicationInfo> {
        match self.knowledge.lookup(name).await {
            Ok(info) => info,
            Err(error) => {
                warn!(%error, medication = name, "knowledge base lookup failed");
                None
            }
        }
    }

    async fn recommended_names(
        &self,
        disease: &str,
    ) -> Result<Vec<(String, Option<RecommendationStrength>)>, Error> {
        let from_knowledge = self.knowledge.recommended_for(disease).await?;
        if !from_knowledge.is_empty() {
            return Ok(from_knowledge.into_iter().map(|name| (name, None)).collect());
        }

        let Some(stored) = self.diseases.find_by_name(disease).await? else {
            return Ok(Vec::new());
        };
        let recommendations = self.diseases.recommendations(stored.id()).await?;
        Ok(recommendations
            .into_iter()
            .map(|rec| (rec.medication_name().to_owned(), Some(rec.strength())))
            .collect())
    }
}

#[async_trait]
impl MedicationManagement for MedicationService {
    async fn create(&self, owner: &UserId, input: NewMedication) -> Result<MedicationView, Error> {
        let now = self.clock.utc();
        let mut medication = Medication::new(MedicationDraft {
            id: MedicationId::random(),
            owner: owner.clone(),
            name: input.name,
            production_date: input.production_date,
            shelf_life_days: input.shelf_life_days,
            quantity: input.quantity.unwrap_or(DEFAULT_QUANTITY),
            unit: input.unit.unwrap_or_else(|| DEFAULT_UNIT.to_owned()),
            efficacy: input.efficacy,
            usage: input.usage,
            image_url: input.image_url,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| Error::invalid_request(format!("invalid medication: {err}")))?;

        let incomplete = medication.efficacy().is_none()
            || medication.usage().is_none()
            || medication.image_url().is_none();
        if incomplete {
            if let Some(info) = self.lookup_quietly(medication.name()).await {
                debug!(medication = medication.name(), "enriched from knowledge base");
                medication.enrich(
                    info.efficacy.as_deref(),
                    info.usage.as_deref(),
                    info.image_url.as_deref(),
                );
            }
        }

        self.medications.save(&medication).await?;
        Ok(self.view(medication))
    }

    async fn get(&self, owner: &UserId, id: MedicationId) -> Result<MedicationView, Error> {
        self.owned(owner, id).await.map(|medication| self.view(medication))
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<MedicationView>, Error> {
        let medications = self.medications.list_by_owner(owner).await?;
        Ok(medications
            .into_iter()
            .map(|medication| self.view(medication))
            .collect())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: MedicationId,
        changes: MedicationChanges,
    ) -> Result<MedicationView, Error> {
        let mut medication = self.owned(owner, id).await?;
        medication
            .apply(changes, self.clock.utc())
            .map_err(|err| Error::invalid_request(format!("invalid medication: {err}")))?;
        self.medications.save(&medication).await?;
        Ok(self.view(medication))
    }

    async fn delete(&self, owner: &UserId, id: MedicationId) -> Result<(), Error> {
        let medication = self.owned(owner, id).await?;
        let removed = self.reminders.delete_for_medication(medication.id()).await?;
        debug!(medication = %id, reminders = removed, "deleting medication");
        if self.medications.delete_owned(owner, id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("medication {id} not found")))
        }
    }

    async fn search(&self, name: &str) -> Result<MedicationInfo, Error> {
        let name = validate_medication_name(name)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.knowledge
            .lookup(&name)
            .await?
            .ok_or_else(|| Error::not_found(format!("no information found for {name}")))
    }

    async fn for_disease(
        &self,
        owner: &UserId,
        disease: &str,
    ) -> Result<DiseaseMedicationReport, Error> {
        let disease = disease.trim();
        if disease.is_empty() {
            return Err(Error::invalid_request("disease name must not be empty"));
        }

        let mut recommended = self.recommended_names(disease).await?;
        let mut seen = BTreeSet::new();
        recommended.retain(|(name, _)| seen.insert(name.clone()));
        let cabinet = self.list(owner).await?;

        let available: Vec<MedicationView> = cabinet
            .iter()
            .filter(|view| {
                !view.status.is_expired && seen.contains(view.medication.name())
            })
            .cloned()
            .collect();

        let mut missing = Vec::new();
        for (name, strength) in recommended {
            if available.iter().any(|view| view.medication.name() == name) {
                continue;
            }
            let info = self.lookup_quietly(&name).await;
            missing.push(MissingMedication {
                name,
                info,
                strength,
            });
        }

        let near_expiry = cabinet
            .iter()
            .filter(|view| view.status.is_near_expiry)
            .cloned()
            .collect();
        let expired = cabinet
            .into_iter()
            .filter(|view| view.status.is_expired)
            .collect();

        Ok(DiseaseMedicationReport {
            disease: disease.to_owned(),
            available,
            missing,
            near_expiry,
            expired,
        })
    }
}

#[cfg(test)]
#[path = "medication_service_tests.rs"]
mod tests;
