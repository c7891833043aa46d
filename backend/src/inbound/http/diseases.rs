//! Disease catalogue HTTP handlers.
//!
//! ```text
//! POST   /api/v1/diseases
//! GET    /api/v1/diseases
//! GET    /api/v1/diseases/{id}
//! PUT    /api/v1/diseases/{id}
//! DELETE /api/v1/diseases/{id}
//! POST   /api/v1/diseases/{id}/recommendations
//! DELETE /api/v1/diseases/recommendations/{id}
//! ```
//!
//! The catalogue is shared; every route still requires a signed-in caller.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::DiseaseDetails;
use crate::domain::{Disease, DiseaseId, MedicationRecommendation, RecommendationId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, nullable, parse_uuid};

const NAME: FieldName = FieldName::new("name");
const MEDICATION_NAME: FieldName = FieldName::new("medicationName");
const DISEASE_ID: FieldName = FieldName::new("diseaseId");
const RECOMMENDATION_ID: FieldName = FieldName::new("recommendationId");

/// Body for `POST /api/v1/diseases`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct DiseaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Body for `PUT /api/v1/diseases/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct DiseaseUpdateRequest {
    pub name: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Body for `POST /api/v1/diseases/{id}/recommendations`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub medication_name: Option<String>,
    /// 1–5; defaults to 1.
    pub strength: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Disease> for DiseaseResponse {
    fn from(disease: Disease) -> Self {
        Self {
            id: disease.id().to_string(),
            name: disease.name().to_owned(),
            description: disease.description().map(str::to_owned),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub id: String,
    pub disease_id: String,
    pub medication_name: String,
    pub strength: u8,
}

impl From<MedicationRecommendation> for RecommendationResponse {
    fn from(recommendation: MedicationRecommendation) -> Self {
        Self {
            id: recommendation.id().to_string(),
            disease_id: recommendation.disease_id().to_string(),
            medication_name: recommendation.medication_name().to_owned(),
            strength: recommendation.strength().value(),
        }
    }
}

/// A disease with its recommendations, strongest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseDetailsResponse {
    #[serde(flatten)]
    pub disease: DiseaseResponse,
    pub recommendations: Vec<RecommendationResponse>,
}

impl From<DiseaseDetails> for DiseaseDetailsResponse {
    fn from(details: DiseaseDetails) -> Self {
        Self {
            disease: details.disease.into(),
            recommendations: details.recommendations.into_iter().map(Into::into).collect(),
        }
    }
}

fn disease_id(raw: &str) -> ApiResult<DiseaseId> {
    parse_uuid(raw, DISEASE_ID).map(DiseaseId::from_uuid)
}

/// Add a disease.
#[utoipa::path(
    post,
    path = "/api/v1/diseases",
    request_body = DiseaseRequest,
    responses(
        (status = 201, description = "Disease created", body = DiseaseResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Name already taken", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "createDisease"
)]
#[post("/diseases")]
pub async fn create_disease(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    payload: web::Json<DiseaseRequest>,
) -> ApiResult<HttpResponse> {
    let DiseaseRequest { name, description } = payload.into_inner();
    let name = name.ok_or_else(|| missing_field_error(NAME))?;
    let disease = state.diseases.create(&name, description).await?;
    Ok(HttpResponse::Created().json(DiseaseResponse::from(disease)))
}

/// List diseases by name.
#[utoipa::path(
    get,
    path = "/api/v1/diseases",
    responses(
        (status = 200, description = "Diseases", body = [DiseaseResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "listDiseases"
)]
#[get("/diseases")]
pub async fn list_diseases(
    state: web::Data<HttpState>,
    _auth: Authenticated,
) -> ApiResult<web::Json<Vec<DiseaseResponse>>> {
    let items = state.diseases.list().await?;
    Ok(web::Json(items.into_iter().map(Into::into).collect()))
}

/// Fetch a disease with its recommendations.
#[utoipa::path(
    get,
    path = "/api/v1/diseases/{id}",
    params(("id" = String, Path, description = "Disease id")),
    responses(
        (status = 200, description = "Disease", body = DiseaseDetailsResponse),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "getDisease"
)]
#[get("/diseases/{id}")]
pub async fn get_disease(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<DiseaseDetailsResponse>> {
    let details = state.diseases.get(disease_id(&path)?).await?;
    Ok(web::Json(details.into()))
}

/// Rename or re-describe a disease.
#[utoipa::path(
    put,
    path = "/api/v1/diseases/{id}",
    params(("id" = String, Path, description = "Disease id")),
    request_body = DiseaseUpdateRequest,
    responses(
        (status = 200, description = "Updated disease", body = DiseaseResponse),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already taken", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "updateDisease"
)]
#[put("/diseases/{id}")]
pub async fn update_disease(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<DiseaseUpdateRequest>,
) -> ApiResult<web::Json<DiseaseResponse>> {
    let id = disease_id(&path)?;
    let DiseaseUpdateRequest { name, description } = payload.into_inner();
    let disease = state.diseases.update(id, name, description).await?;
    Ok(web::Json(disease.into()))
}

/// Delete a disease and its recommendations.
#[utoipa::path(
    delete,
    path = "/api/v1/diseases/{id}",
    params(("id" = String, Path, description = "Disease id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "deleteDisease"
)]
#[delete("/diseases/{id}")]
pub async fn delete_disease(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.diseases.delete(disease_id(&path)?).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Recommend a medication for a disease; repeating a name updates its
/// strength.
#[utoipa::path(
    post,
    path = "/api/v1/diseases/{id}/recommendations",
    params(("id" = String, Path, description = "Disease id")),
    request_body = RecommendationRequest,
    responses(
        (status = 201, description = "Recommendation stored", body = RecommendationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown disease", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "recommendMedication"
)]
#[post("/diseases/{id}/recommendations")]
pub async fn add_recommendation(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<RecommendationRequest>,
) -> ApiResult<HttpResponse> {
    let id = disease_id(&path)?;
    let RecommendationRequest {
        medication_name,
        strength,
    } = payload.into_inner();
    let medication_name = medication_name.ok_or_else(|| missing_field_error(MEDICATION_NAME))?;
    let recommendation = state
        .diseases
        .recommend(id, &medication_name, strength)
        .await?;
    Ok(HttpResponse::Created().json(RecommendationResponse::from(recommendation)))
}

/// Remove a recommendation.
#[utoipa::path(
    delete,
    path = "/api/v1/diseases/recommendations/{id}",
    params(("id" = String, Path, description = "Recommendation id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["diseases"],
    operation_id = "removeRecommendation"
)]
#[delete("/diseases/recommendations/{id}")]
pub async fn remove_recommendation(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path, RECOMMENDATION_ID).map(RecommendationId::from_uuid)?;
    state.diseases.remove_recommendation(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
