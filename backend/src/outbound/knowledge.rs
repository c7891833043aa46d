//! JSON-backed medication knowledge base.
//!
//! The document has the shape
//! `{"medications": [MedicationInfo, ...], "diseases": {"name": ["medication", ...]}}`.
//! A copy ships inside the binary; deployments may point
//! `knowledge_base_path` at their own file, read through `cap_std`.
//!
//! Lookups try an exact match, then a substring match in either direction.
//! Medications are scanned in document order and diseases in name order, so
//! fuzzy matches are stable across restarts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::MedicationInfo;
use crate::domain::ports::{KnowledgeBaseError, MedicationKnowledge};

const BUNDLED: &str = include_str!("../../data/knowledge_base.json");

/// Errors raised while loading a knowledge base document.
#[derive(Debug, Error)]
pub enum KnowledgeLoadError {
    /// The file could not be read.
    #[error("failed to read knowledge base at {path}: {source}")]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid knowledge base JSON.
    #[error("invalid knowledge base document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct KnowledgeDocument {
    #[serde(default)]
    medications: Vec<MedicationInfo>,
    #[serde(default)]
    diseases: BTreeMap<String, Vec<String>>,
}

/// In-process knowledge base loaded from JSON.
#[derive(Debug, Clone)]
pub struct JsonKnowledgeBase {
    medications: Vec<MedicationInfo>,
    diseases: BTreeMap<String, Vec<String>>,
}

fn loosely_matches(candidate: &str, term: &str) -> bool {
    candidate.contains(term) || term.contains(candidate)
}

impl JsonKnowledgeBase {
    /// Parse a knowledge base document.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeLoadError::Parse`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, KnowledgeLoadError> {
        let document: KnowledgeDocument = serde_json::from_str(json)?;
        Ok(Self {
            medications: document.medications,
            diseases: document.diseases,
        })
    }

    /// The dataset compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeLoadError::Parse`] if the bundled file is corrupt.
    pub fn bundled() -> Result<Self, KnowledgeLoadError> {
        Self::from_json(BUNDLED)
    }

    /// Load a document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeLoadError::Read`] when the file is missing or
    /// unreadable and [`KnowledgeLoadError::Parse`] when it is malformed.
    pub fn from_path(path: &Path) -> Result<Self, KnowledgeLoadError> {
        let read_error = |source| KnowledgeLoadError::Read {
            path: path.to_path_buf(),
            source,
        };
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = path.file_name().ok_or_else(|| {
            read_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "knowledge base path must name a file",
            ))
        })?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let contents = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_json(&contents)
    }

    /// Number of medications known.
    pub fn medication_count(&self) -> usize {
        self.medications.len()
    }

    fn find_medication(&self, term: &str) -> Option<&MedicationInfo> {
        self.medications
            .iter()
            .find(|info| info.name == term)
            .or_else(|| {
                let fuzzy = self
                    .medications
                    .iter()
                    .find(|info| loosely_matches(&info.name, term));
                if let Some(info) = fuzzy {
                    debug!(term, matched = %info.name, "knowledge lookup matched by substring");
                }
                fuzzy
            })
    }

    fn find_disease(&self, term: &str) -> Option<&[String]> {
        self.diseases
            .get(term)
            .or_else(|| {
                self.diseases
                    .iter()
                    .find(|(name, _)| loosely_matches(name, term))
                    .map(|(_, names)| names)
            })
            .map(Vec::as_slice)
    }
}

#[async_trait]
impl MedicationKnowledge for JsonKnowledgeBase {
    async fn lookup(&self, name: &str) -> Result<Option<MedicationInfo>, KnowledgeBaseError> {
        let term = name.trim();
        if term.is_empty() {
            return Ok(None);
        }
        Ok(self.find_medication(term).cloned())
    }

    async fn recommended_for(&self, disease: &str) -> Result<Vec<String>, KnowledgeBaseError> {
        let term = disease.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.find_disease(term).map(<[String]>::to_vec).unwrap_or_default())
    }
}
