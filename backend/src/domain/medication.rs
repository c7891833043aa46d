//! Medication records and expiry computation.
//!
//! A medication's expiry date is derived from its production date and shelf
//! life. Either input may be unknown; the expiry date is then unknown too and
//! the medication is neither expired nor near expiry. No error is raised for
//! missing inputs.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use uuid::Uuid;

use super::UserId;

/// Default reminder window, in days, used for near-expiry checks.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 30;
/// Longest accepted shelf life (one hundred years).
pub const MAX_SHELF_LIFE_DAYS: u32 = 36_500;
/// Default unit for new medications.
pub const DEFAULT_UNIT: &str = "tablet";

const NAME_MAX: usize = 100;
const UNIT_MAX: usize = 20;
const TEXT_MAX: usize = 1_000;

/// Derive the expiry date, or `None` when an input is unknown or the result
/// falls outside the supported calendar.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use medminder::domain::expiry_date;
///
/// let produced = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// assert_eq!(expiry_date(Some(produced), Some(31)), NaiveDate::from_ymd_opt(2026, 2, 1));
/// assert_eq!(expiry_date(None, Some(31)), None);
/// ```
pub fn expiry_date(
    production_date: Option<NaiveDate>,
    shelf_life_days: Option<u32>,
) -> Option<NaiveDate> {
    let produced = production_date?;
    let days = shelf_life_days?;
    produced.checked_add_days(Days::new(u64::from(days)))
}

/// Expiry flags evaluated against a particular day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryStatus {
    /// Derived expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// Signed day count from `today` to the expiry date.
    pub days_until_expiry: Option<i64>,
    /// `today > expiry_date`.
    pub is_expired: bool,
    /// `0 <= expiry_date - today <= window`.
    pub is_near_expiry: bool,
}

impl ExpiryStatus {
    /// Evaluate the flags for `expiry` as seen on `today`.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use medminder::domain::ExpiryStatus;
    ///
    /// let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// let expiry = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    /// let status = ExpiryStatus::evaluate(Some(expiry), today, 30);
    /// assert!(status.is_near_expiry);
    /// assert!(!status.is_expired);
    /// ```
    pub fn evaluate(expiry: Option<NaiveDate>, today: NaiveDate, window_days: u32) -> Self {
        let days_until_expiry = expiry.map(|date| (date - today).num_days());
        let is_expired = days_until_expiry.is_some_and(|days| days < 0);
        let is_near_expiry =
            days_until_expiry.is_some_and(|days| (0..=i64::from(window_days)).contains(&days));
        Self {
            expiry_date: expiry,
            days_until_expiry,
            is_expired,
            is_near_expiry,
        }
    }
}

/// Stable medication identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MedicationId(Uuid);

impl MedicationId {
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

impl fmt::Display for MedicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validation failures for medication input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MedicationValidationError {
    /// Name blank or too long.
    #[error("name must be between 1 and {max} characters")]
    Name {
        /// Maximum length.
        max: usize,
    },
    /// Shelf life outside the accepted range.
    #[error("shelf life must be between 0 and {max} days")]
    ShelfLife {
        /// Maximum accepted value.
        max: u32,
    },
    /// Quantity negative or not finite.
    #[error("quantity must be a non-negative number")]
    Quantity,
    /// Unit blank or too long.
    #[error("unit must be between 1 and {max} characters")]
    Unit {
        /// Maximum length.
        max: usize,
    },
    /// A free-text field exceeded its limit.
    #[error("{field} must be at most {max} characters")]
    TextTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length.
        max: usize,
    },
}

/// Input for building a [`Medication`].
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationDraft {
    /// Identifier.
    pub id: MedicationId,
    /// Owning user.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// Production date, if known.
    pub production_date: Option<NaiveDate>,
    /// Shelf life in days, if known.
    pub shelf_life_days: Option<i64>,
    /// Amount on hand.
    pub quantity: f64,
    /// Unit for `quantity`.
    pub unit: String,
    /// What the medication treats.
    pub efficacy: Option<String>,
    /// Dosage instructions.
    pub usage: Option<String>,
    /// Illustration URL.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied to an existing medication.
///
/// Outer `None` leaves a field unchanged; for nullable fields an inner `None`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicationChanges {
    /// New name.
    pub name: Option<String>,
    /// New production date.
    pub production_date: Option<Option<NaiveDate>>,
    /// New shelf life.
    pub shelf_life_days: Option<Option<i64>>,
    /// New quantity.
    pub quantity: Option<f64>,
    /// New unit.
    pub unit: Option<String>,
    /// New efficacy text.
    pub efficacy: Option<Option<String>>,
    /// New usage text.
    pub usage: Option<Option<String>>,
    /// New image URL.
    pub image_url: Option<Option<String>>,
}

/// A medication owned by a user.
///
/// ## Invariants
/// - `expiry_date == production_date + shelf_life_days` whenever both are
///   known, and `None` otherwise. Every mutation recomputes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Medication {
    id: MedicationId,
    owner: UserId,
    name: String,
    production_date: Option<NaiveDate>,
    shelf_life_days: Option<u32>,
    expiry_date: Option<NaiveDate>,
    quantity: f64,
    unit: String,
    efficacy: Option<String>,
    usage: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn validate_name(name: &str) -> Result<String, MedicationValidationError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > NAME_MAX {
        return Err(MedicationValidationError::Name { max: NAME_MAX });
    }
    Ok(trimmed.to_owned())
}

fn validate_shelf_life(days: Option<i64>) -> Result<Option<u32>, MedicationValidationError> {
    days.map(|value| {
        u32::try_from(value)
            .ok()
            .filter(|days| *days <= MAX_SHELF_LIFE_DAYS)
            .ok_or(MedicationValidationError::ShelfLife {
                max: MAX_SHELF_LIFE_DAYS,
            })
    })
    .transpose()
}

fn validate_quantity(quantity: f64) -> Result<f64, MedicationValidationError> {
    if quantity.is_finite() && quantity >= 0.0 {
        Ok(quantity)
    } else {
        Err(MedicationValidationError::Quantity)
    }
}

fn validate_unit(unit: &str) -> Result<String, MedicationValidationError> {
    let trimmed = unit.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > UNIT_MAX {
        return Err(MedicationValidationError::Unit { max: UNIT_MAX });
    }
    Ok(trimmed.to_owned())
}

fn validate_text(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, MedicationValidationError> {
    match value.map(|text| text.trim().to_owned()) {
        Some(text) if text.is_empty() => Ok(None),
        Some(text) if text.chars().count() > TEXT_MAX => {
            Err(MedicationValidationError::TextTooLong {
                field,
                max: TEXT_MAX,
            })
        }
        other => Ok(other),
    }
}

impl Medication {
    /// Validate a draft and derive the expiry date.
    pub fn new(draft: MedicationDraft) -> Result<Self, MedicationValidationError> {
        let MedicationDraft {
            id,
            owner,
            name,
            production_date,
            shelf_life_days,
            quantity,
            unit,
            efficacy,
            usage,
            image_url,
            created_at,
            updated_at,
        } = draft;

        let shelf_life_days = validate_shelf_life(shelf_life_days)?;
        Ok(Self {
            id,
            owner,
            name: validate_name(&name)?,
            production_date,
            shelf_life_days,
            expiry_date: expiry_date(production_date, shelf_life_days),
            quantity: validate_quantity(quantity)?,
            unit: validate_unit(&unit)?,
            efficacy: validate_text("efficacy", efficacy)?,
            usage: validate_text("usage", usage)?,
            image_url: validate_text("imageUrl", image_url)?,
            created_at,
            updated_at,
        })
    }

    /// Apply a partial update and recompute the expiry date.
    ///
    /// Validation happens before any field changes, so a rejected update
    /// leaves the medication untouched.
    pub fn apply(
        &mut self,
        changes: MedicationChanges,
        now: DateTime<Utc>,
    ) -> Result<(), MedicationValidationError> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;
        let shelf_life_days = changes.shelf_life_days.map(validate_shelf_life).transpose()?;
        let quantity = changes.quantity.map(validate_quantity).transpose()?;
        let unit = changes.unit.as_deref().map(validate_unit).transpose()?;
        let efficacy = changes
            .efficacy
            .map(|value| validate_text("efficacy", value))
            .transpose()?;
        let usage = changes
            .usage
            .map(|value| validate_text("usage", value))
            .transpose()?;
        let image_url = changes
            .image_url
            .map(|value| validate_text("imageUrl", value))
            .transpose()?;

        if let Some(value) = name {
            self.name = value;
        }
        if let Some(value) = changes.production_date {
            self.production_date = value;
        }
        if let Some(value) = shelf_life_days {
            self.shelf_life_days = value;
        }
        if let Some(value) = quantity {
            self.quantity = value;
        }
        if let Some(value) = unit {
            self.unit = value;
        }
        if let Some(value) = efficacy {
            self.efficacy = value;
        }
        if let Some(value) = usage {
            self.usage = value;
        }
        if let Some(value) = image_url {
            self.image_url = value;
        }
        self.expiry_date = expiry_date(self.production_date, self.shelf_life_days);
        self.updated_at = now;
        Ok(())
    }

    /// Fill descriptive fields that are still empty.
    pub fn enrich(&mut self, efficacy: Option<&str>, usage: Option<&str>, image_url: Option<&str>) {
        fn fill(slot: &mut Option<String>, value: Option<&str>) {
            if slot.is_none() {
                *slot = value.map(str::to_owned);
            }
        }
        fill(&mut self.efficacy, efficacy);
        fill(&mut self.usage, usage);
        fill(&mut self.image_url, image_url);
    }

    /// Expiry flags as seen on `today`.
    pub fn status_on(&self, today: NaiveDate, window_days: u32) -> ExpiryStatus {
        ExpiryStatus::evaluate(self.expiry_date, today, window_days)
    }

    /// Identifier.
    pub fn id(&self) -> MedicationId {
        self.id
    }

    /// Owning user.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Production date.
    pub fn production_date(&self) -> Option<NaiveDate> {
        self.production_date
    }

    /// Shelf life in days.
    pub fn shelf_life_days(&self) -> Option<u32> {
        self.shelf_life_days
    }

    /// Derived expiry date.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    /// Amount on hand.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Unit for the quantity.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// What the medication treats.
    pub fn efficacy(&self) -> Option<&str> {
        self.efficacy.as_deref()
    }

    /// Dosage instructions.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// Illustration URL.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
#[path = "medication_tests.rs"]
mod tests;
