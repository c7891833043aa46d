//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Each row converts into its validated
//! domain value through a `row_to_*` function that reports the first
//! validation failure as a string, for the caller to wrap in its port error.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    ContactBinding, Disease, DiseaseId, EmailAddress, Medication, MedicationDraft, MedicationId,
    MedicationRecommendation, NotificationPreferences, PasswordDigest, PendingVerification,
    PhoneNumber, RecommendationId, RecommendationStrength, Reminder, ReminderDraft, ReminderId,
    ReminderKind, ReminderState, User, UserDraft, UserId, Username, VerificationCode,
    WeChatOpenId,
};

use super::schema::{diseases, medication_recommendations, medications, reminders, users};

// ---------------------------------------------------------------------------
// User models
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub wechat_openid: Option<String>,
    pub wechat_verified: bool,
    pub email: Option<String>,
    pub email_verified: bool,
    pub notify_sms: bool,
    pub notify_wechat: bool,
    pub notify_email: bool,
    pub verification_code: Option<String>,
    pub verification_issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "maintained by the database for auditing")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable and changeset struct for user upserts.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRecord<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub phone_verified: bool,
    pub wechat_openid: Option<&'a str>,
    pub wechat_verified: bool,
    pub email: Option<&'a str>,
    pub email_verified: bool,
    pub notify_sms: bool,
    pub notify_wechat: bool,
    pub notify_email: bool,
    pub verification_code: Option<&'a str>,
    pub verification_issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> UserRecord<'a> {
    pub(crate) fn from_user(user: &'a User, now: DateTime<Utc>) -> Self {
        let pending = user.pending_verification();
        Self {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            password_hash: user.password().as_ref(),
            phone: user.phone().map(|binding| binding.address.as_ref()),
            phone_verified: user.phone().is_some_and(|binding| binding.verified),
            wechat_openid: user.wechat().map(|binding| binding.address.as_ref()),
            wechat_verified: user.wechat().is_some_and(|binding| binding.verified),
            email: user.email().map(|binding| binding.address.as_ref()),
            email_verified: user.email().is_some_and(|binding| binding.verified),
            notify_sms: user.preferences().sms,
            notify_wechat: user.preferences().wechat,
            notify_email: user.preferences().email,
            verification_code: pending.map(|challenge| challenge.code.as_ref()),
            verification_issued_at: pending.map(|challenge| challenge.issued_at),
            created_at: user.created_at(),
            updated_at: now,
        }
    }
}

/// Convert a database row to a domain user.
pub(crate) fn row_to_user(row: UserRow) -> Result<User, String> {
    let username = Username::new(&row.username).map_err(|err| err.to_string())?;
    let phone = row
        .phone
        .map(|raw| PhoneNumber::new(raw).map_err(|err| err.to_string()))
        .transpose()?
        .map(|address| ContactBinding {
            address,
            verified: row.phone_verified,
        });
    let wechat = row
        .wechat_openid
        .map(|raw| WeChatOpenId::new(raw).map_err(|err| err.to_string()))
        .transpose()?
        .map(|address| ContactBinding {
            address,
            verified: row.wechat_verified,
        });
    let email = row
        .email
        .map(|raw| EmailAddress::new(raw).map_err(|err| err.to_string()))
        .transpose()?
        .map(|address| ContactBinding {
            address,
            verified: row.email_verified,
        });
    let pending_verification = match (row.verification_code, row.verification_issued_at) {
        (Some(code), Some(issued_at)) => Some(PendingVerification {
            code: VerificationCode::new(&code)
                .ok_or_else(|| format!("stored verification code for {} is malformed", row.id))?,
            issued_at,
        }),
        _ => None,
    };

    Ok(User::from(UserDraft {
        id: UserId::from_uuid(row.id),
        username,
        password: PasswordDigest::from_stored(row.password_hash),
        phone,
        wechat,
        email,
        preferences: NotificationPreferences {
            sms: row.notify_sms,
            wechat: row.notify_wechat,
            email: row.notify_email,
        },
        pending_verification,
        created_at: row.created_at,
    }))
}

// ---------------------------------------------------------------------------
// Medication models
// ---------------------------------------------------------------------------

/// Row struct for reading from the medications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = medications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MedicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub production_date: Option<NaiveDate>,
    pub shelf_life_days: Option<i32>,
    #[expect(dead_code, reason = "recomputed by the domain on load")]
    pub expiry_date: Option<NaiveDate>,
    pub quantity: f64,
    pub unit: String,
    pub efficacy: Option<String>,
    pub usage: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable and changeset struct for medication upserts.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = medications)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct MedicationRecord<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub production_date: Option<NaiveDate>,
    pub shelf_life_days: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: f64,
    pub unit: &'a str,
    pub efficacy: Option<&'a str>,
    pub usage: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> MedicationRecord<'a> {
    pub(crate) fn from_medication(medication: &'a Medication) -> Result<Self, String> {
        let shelf_life_days = medication
            .shelf_life_days()
            .map(i32::try_from)
            .transpose()
            .map_err(|err| format!("shelf life out of range: {err}"))?;
        Ok(Self {
            id: *medication.id().as_uuid(),
            user_id: *medication.owner().as_uuid(),
            name: medication.name(),
            production_date: medication.production_date(),
            shelf_life_days,
            expiry_date: medication.expiry_date(),
            quantity: medication.quantity(),
            unit: medication.unit(),
            efficacy: medication.efficacy(),
            usage: medication.usage(),
            image_url: medication.image_url(),
            created_at: medication.created_at(),
            updated_at: medication.updated_at(),
        })
    }
}

/// Convert a database row to a domain medication.
pub(crate) fn row_to_medication(row: MedicationRow) -> Result<Medication, String> {
    Medication::new(MedicationDraft {
        id: MedicationId::from_uuid(row.id),
        owner: UserId::from_uuid(row.user_id),
        name: row.name,
        production_date: row.production_date,
        shelf_life_days: row.shelf_life_days.map(i64::from),
        quantity: row.quantity,
        unit: row.unit,
        efficacy: row.efficacy,
        usage: row.usage,
        image_url: row.image_url,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|err| format!("medication {}: {err}", row.id))
}

// ---------------------------------------------------------------------------
// Reminder models
// ---------------------------------------------------------------------------

/// Row struct for reading from the reminders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reminders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReminderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub medication_id: Uuid,
    pub kind: String,
    pub scheduled_at: DateTime<Utc>,
    pub message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub missed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable and changeset struct for reminder upserts.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = reminders)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ReminderRecord<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub medication_id: Uuid,
    pub kind: &'static str,
    pub scheduled_at: DateTime<Utc>,
    pub message: Option<&'a str>,
    pub sent_at: Option<DateTime<Utc>>,
    pub missed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Reminder> for ReminderRecord<'a> {
    fn from(reminder: &'a Reminder) -> Self {
        let (sent_at, missed_at) = match reminder.state() {
            ReminderState::Pending => (None, None),
            ReminderState::Sent { at } => (Some(at), None),
            ReminderState::Missed { at } => (None, Some(at)),
        };
        Self {
            id: *reminder.id().as_uuid(),
            user_id: *reminder.owner().as_uuid(),
            medication_id: *reminder.medication_id().as_uuid(),
            kind: reminder.kind().as_str(),
            scheduled_at: reminder.scheduled_at(),
            message: reminder.message(),
            sent_at,
            missed_at,
            created_at: reminder.created_at(),
        }
    }
}

/// Convert a database row to a domain reminder.
pub(crate) fn row_to_reminder(row: ReminderRow) -> Result<Reminder, String> {
    let kind: ReminderKind = row.kind.parse().map_err(|err| format!("{err}"))?;
    Reminder::new(ReminderDraft {
        id: ReminderId::from_uuid(row.id),
        owner: UserId::from_uuid(row.user_id),
        medication_id: MedicationId::from_uuid(row.medication_id),
        kind,
        scheduled_at: row.scheduled_at,
        message: row.message,
        state: ReminderState::from_timestamps(row.sent_at, row.missed_at),
        created_at: row.created_at,
    })
    .map_err(|err| format!("reminder {}: {err}", row.id))
}

// ---------------------------------------------------------------------------
// Disease models
// ---------------------------------------------------------------------------

/// Row struct for reading from the diseases table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = diseases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DiseaseRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Insertable and changeset struct for disease upserts.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = diseases)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DiseaseRecord<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Convert a database row to a domain disease.
pub(crate) fn row_to_disease(row: DiseaseRow) -> Result<Disease, String> {
    Disease::new(DiseaseId::from_uuid(row.id), &row.name, row.description)
        .map_err(|err| format!("disease {}: {err}", row.id))
}

/// Row struct for reading from the medication_recommendations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = medication_recommendations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecommendationRow {
    pub id: Uuid,
    pub disease_id: Uuid,
    pub medication_name: String,
    pub strength: i16,
}

/// Insertable struct for recommendation upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = medication_recommendations)]
pub(crate) struct NewRecommendationRow<'a> {
    pub id: Uuid,
    pub disease_id: Uuid,
    pub medication_name: &'a str,
    pub strength: i16,
}

impl<'a> From<&'a MedicationRecommendation> for NewRecommendationRow<'a> {
    fn from(recommendation: &'a MedicationRecommendation) -> Self {
        Self {
            id: *recommendation.id().as_uuid(),
            disease_id: *recommendation.disease_id().as_uuid(),
            medication_name: recommendation.medication_name(),
            strength: i16::from(recommendation.strength().value()),
        }
    }
}

/// Convert a database row to a domain recommendation.
pub(crate) fn row_to_recommendation(
    row: RecommendationRow,
) -> Result<MedicationRecommendation, String> {
    let strength =
        RecommendationStrength::new(i64::from(row.strength)).map_err(|err| err.to_string())?;
    MedicationRecommendation::new(
        RecommendationId::from_uuid(row.id),
        DiseaseId::from_uuid(row.disease_id),
        &row.medication_name,
        strength,
    )
    .map_err(|err| format!("recommendation {}: {err}", row.id))
}
