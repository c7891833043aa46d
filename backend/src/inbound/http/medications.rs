//! Medication cabinet HTTP handlers.
//!
//! ```text
//! POST   /api/v1/medications
//! GET    /api/v1/medications
//! GET    /api/v1/medications/{id}
//! PUT    /api/v1/medications/{id}
//! DELETE /api/v1/medications/{id}
//! GET    /api/v1/medications/search/{name}
//! GET    /api/v1/medications/by-disease/{disease}
//! ```
//!
//! Dates are `YYYY-MM-DD`; timestamps are RFC 3339 in UTC.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    DiseaseMedicationReport, MedicationView, MissingMedication, NewMedication,
};
use crate::domain::{MedicationChanges, MedicationId, MedicationInfo};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, nullable, parse_date, parse_uuid,
};

const NAME: FieldName = FieldName::new("name");
const PRODUCTION_DATE: FieldName = FieldName::new("productionDate");
const MEDICATION_ID: FieldName = FieldName::new("medicationId");

/// Body for `POST /api/v1/medications`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub name: Option<String>,
    /// `YYYY-MM-DD`.
    pub production_date: Option<String>,
    pub shelf_life_days: Option<i64>,
    /// Defaults to 1.
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    /// Filled from the knowledge base when omitted.
    pub efficacy: Option<String>,
    /// Filled from the knowledge base when omitted.
    pub usage: Option<String>,
    /// Filled from the knowledge base when omitted.
    pub image_url: Option<String>,
}

impl MedicationRequest {
    fn into_new_medication(self) -> ApiResult<NewMedication> {
        Ok(NewMedication {
            name: self.name.ok_or_else(|| missing_field_error(NAME))?,
            production_date: self
                .production_date
                .as_deref()
                .map(|raw| parse_date(raw, PRODUCTION_DATE))
                .transpose()?,
            shelf_life_days: self.shelf_life_days,
            quantity: self.quantity,
            unit: self.unit,
            efficacy: self.efficacy,
            usage: self.usage,
            image_url: self.image_url,
        })
    }
}

/// Body for `PUT /api/v1/medications/{id}`. Omitted fields are left alone;
/// `null` clears a nullable field.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationUpdateRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub production_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub shelf_life_days: Option<Option<i64>>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub efficacy: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub usage: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

impl MedicationUpdateRequest {
    fn into_changes(self) -> ApiResult<MedicationChanges> {
        let production_date = match self.production_date {
            Some(Some(raw)) => Some(Some(parse_date(&raw, PRODUCTION_DATE)?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(MedicationChanges {
            name: self.name,
            production_date,
            shelf_life_days: self.shelf_life_days,
            quantity: self.quantity,
            unit: self.unit,
            efficacy: self.efficacy,
            usage: self.usage,
            image_url: self.image_url,
        })
    }
}

/// A medication with its expiry flags as of today.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationResponse {
    pub id: String,
    pub name: String,
    pub production_date: Option<String>,
    pub shelf_life_days: Option<u32>,
    pub expiry_date: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub efficacy: Option<String>,
    pub usage: Option<String>,
    pub image_url: Option<String>,
    pub is_expired: bool,
    pub is_near_expiry: bool,
    /// Negative once expired.
    pub days_until_expiry: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<MedicationView> for MedicationResponse {
    fn from(view: MedicationView) -> Self {
        let MedicationView { medication, status } = view;
        Self {
            id: medication.id().to_string(),
            name: medication.name().to_owned(),
            production_date: medication.production_date().map(|date| date.to_string()),
            shelf_life_days: medication.shelf_life_days(),
            expiry_date: status.expiry_date.map(|date| date.to_string()),
            quantity: medication.quantity(),
            unit: medication.unit().to_owned(),
            efficacy: medication.efficacy().map(str::to_owned),
            usage: medication.usage().map(str::to_owned),
            image_url: medication.image_url().map(str::to_owned),
            is_expired: status.is_expired,
            is_near_expiry: status.is_near_expiry,
            days_until_expiry: status.days_until_expiry,
            created_at: medication.created_at().to_rfc3339(),
            updated_at: medication.updated_at().to_rfc3339(),
        }
    }
}

/// Knowledge-base entry for a medication.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInfoResponse {
    pub name: String,
    pub efficacy: Option<String>,
    pub usage: Option<String>,
    pub image_url: Option<String>,
    pub side_effects: Option<String>,
    pub precautions: Option<String>,
}

impl From<MedicationInfo> for MedicationInfoResponse {
    fn from(info: MedicationInfo) -> Self {
        Self {
            name: info.name,
            efficacy: info.efficacy,
            usage: info.usage,
            image_url: info.image_url,
            side_effects: info.side_effects,
            precautions: info.precautions,
        }
    }
}

/// A recommended medication the caller does not have.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissingMedicationResponse {
    pub name: String,
    pub info: Option<MedicationInfoResponse>,
    /// 1–5, present for catalogue recommendations.
    pub strength: Option<u8>,
}

impl From<MissingMedication> for MissingMedicationResponse {
    fn from(missing: MissingMedication) -> Self {
        Self {
            name: missing.name,
            info: missing.info.map(Into::into),
            strength: missing.strength.map(|strength| strength.value()),
        }
    }
}

/// What the caller's cabinet offers for a disease.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseReportResponse {
    pub disease: String,
    pub available: Vec<MedicationResponse>,
    pub missing: Vec<MissingMedicationResponse>,
    pub near_expiry: Vec<MedicationResponse>,
    pub expired: Vec<MedicationResponse>,
}

fn views(items: Vec<MedicationView>) -> Vec<MedicationResponse> {
    items.into_iter().map(Into::into).collect()
}

impl From<DiseaseMedicationReport> for DiseaseReportResponse {
    fn from(report: DiseaseMedicationReport) -> Self {
        Self {
            disease: report.disease,
            available: views(report.available),
            missing: report.missing.into_iter().map(Into::into).collect(),
            near_expiry: views(report.near_expiry),
            expired: views(report.expired),
        }
    }
}

pub(crate) fn medication_id(raw: &str) -> ApiResult<MedicationId> {
    parse_uuid(raw, MEDICATION_ID).map(MedicationId::from_uuid)
}

/// Register a medication.
#[utoipa::path(
    post,
    path = "/api/v1/medications",
    request_body = MedicationRequest,
    responses(
        (status = 201, description = "Medication stored", body = MedicationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "createMedication"
)]
#[post("/medications")]
pub async fn create_medication(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<MedicationRequest>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner().into_new_medication()?;
    let view = state.medications.create(&auth.user_id, input).await?;
    Ok(HttpResponse::Created().json(MedicationResponse::from(view)))
}

/// List the caller's medications.
#[utoipa::path(
    get,
    path = "/api/v1/medications",
    responses(
        (status = 200, description = "Medications", body = [MedicationResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "listMedications"
)]
#[get("/medications")]
pub async fn list_medications(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<MedicationResponse>>> {
    let items = state.medications.list(&auth.user_id).await?;
    Ok(web::Json(views(items)))
}

/// Look a medication up in the knowledge base.
#[utoipa::path(
    get,
    path = "/api/v1/medications/search/{name}",
    params(("name" = String, Path, description = "2–50 characters")),
    responses(
        (status = 200, description = "Reference details", body = MedicationInfoResponse),
        (status = 400, description = "Invalid search term", body = ErrorSchema),
        (status = 404, description = "Unknown medication", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "searchMedication"
)]
#[get("/medications/search/{name}")]
pub async fn search_medication(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<MedicationInfoResponse>> {
    let info = state.medications.search(&path.into_inner()).await?;
    Ok(web::Json(info.into()))
}

/// Report what the caller's cabinet offers for a disease.
#[utoipa::path(
    get,
    path = "/api/v1/medications/by-disease/{disease}",
    params(("disease" = String, Path, description = "Disease name")),
    responses(
        (status = 200, description = "Cabinet report", body = DiseaseReportResponse),
        (status = 400, description = "Blank disease name", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "medicationsForDisease"
)]
#[get("/medications/by-disease/{disease}")]
pub async fn medications_for_disease(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<DiseaseReportResponse>> {
    let report = state
        .medications
        .for_disease(&auth.user_id, &path.into_inner())
        .await?;
    Ok(web::Json(report.into()))
}

/// Fetch one medication.
#[utoipa::path(
    get,
    path = "/api/v1/medications/{id}",
    params(("id" = String, Path, description = "Medication id")),
    responses(
        (status = 200, description = "Medication", body = MedicationResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "getMedication"
)]
#[get("/medications/{id}")]
pub async fn get_medication(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<MedicationResponse>> {
    let id = medication_id(&path)?;
    let view = state.medications.get(&auth.user_id, id).await?;
    Ok(web::Json(view.into()))
}

/// Apply a partial update; expiry is recomputed.
#[utoipa::path(
    put,
    path = "/api/v1/medications/{id}",
    params(("id" = String, Path, description = "Medication id")),
    request_body = MedicationUpdateRequest,
    responses(
        (status = 200, description = "Updated medication", body = MedicationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "updateMedication"
)]
#[put("/medications/{id}")]
pub async fn update_medication(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<MedicationUpdateRequest>,
) -> ApiResult<web::Json<MedicationResponse>> {
    let id = medication_id(&path)?;
    let changes = payload.into_inner().into_changes()?;
    let view = state.medications.update(&auth.user_id, id, changes).await?;
    Ok(web::Json(view.into()))
}

/// Delete a medication and its reminders.
#[utoipa::path(
    delete,
    path = "/api/v1/medications/{id}",
    params(("id" = String, Path, description = "Medication id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["medications"],
    operation_id = "deleteMedication"
)]
#[delete("/medications/{id}")]
pub async fn delete_medication(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = medication_id(&path)?;
    state.medications.delete(&auth.user_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
