//! Diseases and their recommended medications.

use std::fmt;

use uuid::Uuid;

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 2_000;

/// Lowest recommendation strength.
pub const STRENGTH_MIN: u8 = 1;
/// Highest recommendation strength.
pub const STRENGTH_MAX: u8 = 5;

/// Validation failures for disease input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiseaseValidationError {
    /// Name blank or too long.
    #[error("name must be between 1 and {max} characters")]
    Name {
        /// Maximum length.
        max: usize,
    },
    /// Description too long.
    #[error("description must be at most {max} characters")]
    Description {
        /// Maximum length.
        max: usize,
    },
    /// Medication name blank or too long.
    #[error("medication name must be between 1 and {max} characters")]
    MedicationName {
        /// Maximum length.
        max: usize,
    },
    /// Strength outside `STRENGTH_MIN..=STRENGTH_MAX`.
    #[error("recommendation strength must be between {min} and {max}")]
    Strength {
        /// Lower bound.
        min: u8,
        /// Upper bound.
        max: u8,
    },
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Stable disease identifier.
    DiseaseId
);
uuid_id!(
    /// Stable recommendation identifier.
    RecommendationId
);

fn bounded_name(
    value: &str,
    error: impl FnOnce(usize) -> DiseaseValidationError,
) -> Result<String, DiseaseValidationError> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > NAME_MAX {
        return Err(error(NAME_MAX));
    }
    Ok(trimmed.to_owned())
}

fn description(value: Option<String>) -> Result<Option<String>, DiseaseValidationError> {
    match value.map(|text| text.trim().to_owned()) {
        Some(text) if text.is_empty() => Ok(None),
        Some(text) if text.chars().count() > DESCRIPTION_MAX => {
            Err(DiseaseValidationError::Description {
                max: DESCRIPTION_MAX,
            })
        }
        other => Ok(other),
    }
}

/// Recommendation strength between 1 (weak) and 5 (strong).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecommendationStrength(u8);

impl RecommendationStrength {
    /// Validate a raw strength.
    pub fn new(value: i64) -> Result<Self, DiseaseValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|value| (STRENGTH_MIN..=STRENGTH_MAX).contains(value))
            .map(Self)
            .ok_or(DiseaseValidationError::Strength {
                min: STRENGTH_MIN,
                max: STRENGTH_MAX,
            })
    }

    /// Raw value.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for RecommendationStrength {
    fn default() -> Self {
        Self(STRENGTH_MIN)
    }
}

/// A named disease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disease {
    id: DiseaseId,
    name: String,
    description: Option<String>,
}

impl Disease {
    /// Validate and build a disease.
    pub fn new(
        id: DiseaseId,
        name: &str,
        description: Option<String>,
    ) -> Result<Self, DiseaseValidationError> {
        Ok(Self {
            id,
            name: bounded_name(name, |max| DiseaseValidationError::Name { max })?,
            description: self::description(description)?,
        })
    }

    /// Apply a partial update. Outer `None` leaves a field unchanged.
    pub fn apply(
        &mut self,
        name: Option<&str>,
        description: Option<Option<String>>,
    ) -> Result<(), DiseaseValidationError> {
        let name = name
            .map(|value| bounded_name(value, |max| DiseaseValidationError::Name { max }))
            .transpose()?;
        let description = description.map(self::description).transpose()?;
        if let Some(value) = name {
            self.name = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        Ok(())
    }

    /// Identifier.
    pub fn id(&self) -> DiseaseId {
        self.id
    }

    /// Unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A medication recommended for a disease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationRecommendation {
    id: RecommendationId,
    disease_id: DiseaseId,
    medication_name: String,
    strength: RecommendationStrength,
}

impl MedicationRecommendation {
    /// Validate and build a recommendation.
    pub fn new(
        id: RecommendationId,
        disease_id: DiseaseId,
        medication_name: &str,
        strength: RecommendationStrength,
    ) -> Result<Self, DiseaseValidationError> {
        Ok(Self {
            id,
            disease_id,
            medication_name: bounded_name(medication_name, |max| {
                DiseaseValidationError::MedicationName { max }
            })?,
            strength,
        })
    }

    /// Replace the strength.
    pub fn set_strength(&mut self, strength: RecommendationStrength) {
        self.strength = strength;
    }

    /// Identifier.
    pub fn id(&self) -> RecommendationId {
        self.id
    }

    /// Disease this recommendation belongs to.
    pub fn disease_id(&self) -> DiseaseId {
        self.disease_id
    }

    /// Recommended medication name.
    pub fn medication_name(&self) -> &str {
        &self.medication_name
    }

    /// Recommendation strength.
    pub fn strength(&self) -> RecommendationStrength {
        self.strength
    }
}
