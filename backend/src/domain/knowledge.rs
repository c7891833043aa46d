//! Medication reference data served by the knowledge base.

use serde::{Deserialize, Serialize};

/// Shortest accepted search term.
pub const SEARCH_NAME_MIN: usize = 2;
/// Longest accepted search term.
pub const SEARCH_NAME_MAX: usize = 50;

/// Reference details for one medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInfo {
    /// Canonical medication name.
    pub name: String,
    /// What the medication treats.
    #[serde(default)]
    pub efficacy: Option<String>,
    /// Dosage instructions.
    #[serde(default)]
    pub usage: Option<String>,
    /// Illustration URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Known side effects.
    #[serde(default)]
    pub side_effects: Option<String>,
    /// Precautions and contraindications.
    #[serde(default)]
    pub precautions: Option<String>,
}

/// Reasons a search term is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MedicationNameError {
    /// Too short or too long.
    #[error("medication name must be between {min} and {max} characters")]
    Length {
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },
    /// Contains a character outside the accepted set.
    #[error("medication name contains unsupported characters")]
    Characters,
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Validate a knowledge-base search term and return it trimmed.
///
/// Accepts 2 to 50 characters drawn from ASCII letters and digits, CJK
/// ideographs, spaces and `-()[]`.
///
/// # Examples
/// ```
/// use medminder::domain::validate_medication_name;
///
/// assert_eq!(validate_medication_name(" 布洛芬 ").as_deref(), Ok("布洛芬"));
/// assert!(validate_medication_name("a").is_err());
/// assert!(validate_medication_name("drop; table").is_err());
/// ```
pub fn validate_medication_name(raw: &str) -> Result<String, MedicationNameError> {
    let name = raw.trim();
    let length = name.chars().count();
    if !(SEARCH_NAME_MIN..=SEARCH_NAME_MAX).contains(&length) {
        return Err(MedicationNameError::Length {
            min: SEARCH_NAME_MIN,
            max: SEARCH_NAME_MAX,
        });
    }
    let accepted = |c: char| c.is_ascii_alphanumeric() || is_cjk(c) || " -()[]".contains(c);
    if !name.chars().all(accepted) {
        return Err(MedicationNameError::Characters);
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("布洛芬")]
    #[case("Vitamin C")]
    #[case("Amoxicillin (500mg)")]
    #[case("盐酸二甲双胍[缓释]")]
    fn accepts_supported_names(#[case] raw: &str) {
        assert!(validate_medication_name(raw).is_ok());
    }

    #[rstest]
    #[case("x", MedicationNameError::Length { min: 2, max: 50 })]
    #[case("   ", MedicationNameError::Length { min: 2, max: 50 })]
    #[case("aspirin!", MedicationNameError::Characters)]
    #[case("a/b", MedicationNameError::Characters)]
    fn rejects_unsupported_names(#[case] raw: &str, #[case] expected: MedicationNameError) {
        assert_eq!(validate_medication_name(raw), Err(expected));
    }

    #[rstest]
    fn rejects_names_over_fifty_characters() {
        let raw = "药".repeat(51);
        assert!(matches!(
            validate_medication_name(&raw),
            Err(MedicationNameError::Length { .. })
        ));
    }

    #[rstest]
    fn info_fields_default_when_absent() {
        let info: MedicationInfo =
            serde_json::from_str(r#"{"name":"布洛芬"}"#).expect("deserialise");
        assert_eq!(info.efficacy, None);
        assert_eq!(info.side_effects, None);
    }
}
