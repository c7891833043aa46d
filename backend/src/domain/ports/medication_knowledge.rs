//! Port for read-only medication reference data.

use async_trait::async_trait;

use crate::domain::MedicationInfo;

use super::define_port_error;

define_port_error! {
    /// Errors raised by knowledge base adapters.
    pub enum KnowledgeBaseError {
        /// The source could not be read.
        Unavailable { message: String } =>
            "medication knowledge base unavailable: {message}" as service_unavailable,
    }
}

/// Lookup interface over a medication knowledge base.
///
/// Both lookups try an exact match first, then fall back to a substring
/// match in either direction. Ties resolve deterministically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicationKnowledge: Send + Sync {
    /// Reference details for a medication name.
    async fn lookup(&self, name: &str) -> Result<Option<MedicationInfo>, KnowledgeBaseError>;

    /// Medication names recommended for a disease. Unknown diseases yield an
    /// empty list.
    async fn recommended_for(&self, disease: &str) -> Result<Vec<String>, KnowledgeBaseError>;
}

/// Knowledge base that knows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMedicationKnowledge;

#[async_trait]
impl MedicationKnowledge for FixtureMedicationKnowledge {
    async fn lookup(&self, _name: &str) -> Result<Option<MedicationInfo>, KnowledgeBaseError> {
        Ok(None)
    }

    async fn recommended_for(&self, _disease: &str) -> Result<Vec<String>, KnowledgeBaseError> {
        Ok(Vec::new())
    }
}
