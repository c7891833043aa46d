//! Reminder HTTP handlers.
//!
//! ```text
//! POST   /api/v1/reminders
//! GET    /api/v1/reminders
//! GET    /api/v1/reminders/upcoming?hours=24
//! GET    /api/v1/reminders/{id}
//! PUT    /api/v1/reminders/{id}
//! DELETE /api/v1/reminders/{id}
//! POST   /api/v1/medications/{id}/usage-schedule
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{NewReminder, ReminderUpdate, UsageScheduleRequest};
use crate::domain::{RecurrenceKind, Reminder, ReminderId, ReminderKind, ReminderState};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::medications::medication_id;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, missing_field_error, nullable, parse_optional_rfc3339_timestamp,
    parse_rfc3339_timestamp, parse_uuid,
};

const MEDICATION_ID: FieldName = FieldName::new("medicationId");
const REMINDER_ID: FieldName = FieldName::new("reminderId");
const KIND: FieldName = FieldName::new("kind");
const SCHEDULED_AT: FieldName = FieldName::new("scheduledAt");
const FREQUENCY: FieldName = FieldName::new("frequency");
const START: FieldName = FieldName::new("start");
const END: FieldName = FieldName::new("end");

/// Body for `POST /api/v1/reminders`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub medication_id: Option<String>,
    /// `expiry` or `usage`.
    #[schema(example = "usage")]
    pub kind: Option<String>,
    /// RFC 3339.
    pub scheduled_at: Option<String>,
    pub message: Option<String>,
}

impl ReminderRequest {
    fn into_new_reminder(self) -> ApiResult<NewReminder> {
        let raw_medication = self
            .medication_id
            .ok_or_else(|| missing_field_error(MEDICATION_ID))?;
        let raw_kind = self.kind.ok_or_else(|| missing_field_error(KIND))?;
        let raw_scheduled = self
            .scheduled_at
            .ok_or_else(|| missing_field_error(SCHEDULED_AT))?;
        Ok(NewReminder {
            medication_id: medication_id(&raw_medication)?,
            kind: raw_kind
                .parse::<ReminderKind>()
                .map_err(|err| field_error(KIND, err))?,
            scheduled_at: parse_rfc3339_timestamp(&raw_scheduled, SCHEDULED_AT)?,
            message: self.message,
        })
    }
}

/// Body for `PUT /api/v1/reminders/{id}`; only pending reminders accept it.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderUpdateRequest {
    pub scheduled_at: Option<String>,
    /// `null` clears the custom message.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub message: Option<Option<String>>,
}

impl ReminderUpdateRequest {
    fn into_update(self) -> ApiResult<ReminderUpdate> {
        Ok(ReminderUpdate {
            scheduled_at: parse_optional_rfc3339_timestamp(
                self.scheduled_at.as_deref(),
                SCHEDULED_AT,
            )?,
            message: self.message,
        })
    }
}

/// Body for `POST /api/v1/medications/{id}/usage-schedule`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageScheduleBody {
    /// `daily`, `weekly` or `monthly`.
    #[schema(example = "daily")]
    pub frequency: Option<String>,
    /// Doses per day for daily schedules, 1–6.
    pub times_per_day: Option<u32>,
    /// Defaults to today at 08:00 UTC.
    pub start: Option<String>,
    pub end: Option<String>,
    pub message: Option<String>,
}

impl UsageScheduleBody {
    fn into_request(self) -> ApiResult<UsageScheduleRequest> {
        let raw_kind = self.frequency.ok_or_else(|| missing_field_error(FREQUENCY))?;
        Ok(UsageScheduleRequest {
            kind: raw_kind
                .parse::<RecurrenceKind>()
                .map_err(|err| field_error(FREQUENCY, err))?,
            occurrences_per_day: self.times_per_day,
            start: parse_optional_rfc3339_timestamp(self.start.as_deref(), START)?,
            end: parse_optional_rfc3339_timestamp(self.end.as_deref(), END)?,
            message: self.message,
        })
    }
}

/// Query for `GET /api/v1/reminders/upcoming`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpcomingQuery {
    /// Look-ahead in hours, 1–168; defaults to 24.
    pub hours: Option<u32>,
}

/// A reminder as returned to its owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub id: String,
    pub medication_id: String,
    pub kind: String,
    pub scheduled_at: String,
    pub message: Option<String>,
    /// `pending`, `sent` or `missed`.
    pub status: String,
    pub sent_at: Option<String>,
    pub missed_at: Option<String>,
    pub created_at: String,
}

impl From<Reminder> for ReminderResponse {
    fn from(reminder: Reminder) -> Self {
        let state = reminder.state();
        let (sent_at, missed_at) = match state {
            ReminderState::Pending => (None, None),
            ReminderState::Sent { at } => (Some(at.to_rfc3339()), None),
            ReminderState::Missed { at } => (None, Some(at.to_rfc3339())),
        };
        Self {
            id: reminder.id().to_string(),
            medication_id: reminder.medication_id().to_string(),
            kind: reminder.kind().as_str().to_owned(),
            scheduled_at: reminder.scheduled_at().to_rfc3339(),
            message: reminder.message().map(str::to_owned),
            status: state.as_str().to_owned(),
            sent_at,
            missed_at,
            created_at: reminder.created_at().to_rfc3339(),
        }
    }
}

fn responses(items: Vec<Reminder>) -> Vec<ReminderResponse> {
    items.into_iter().map(Into::into).collect()
}

fn reminder_id(raw: &str) -> ApiResult<ReminderId> {
    parse_uuid(raw, REMINDER_ID).map(ReminderId::from_uuid)
}

/// Schedule a single reminder.
#[utoipa::path(
    post,
    path = "/api/v1/reminders",
    request_body = ReminderRequest,
    responses(
        (status = 201, description = "Reminder scheduled", body = ReminderResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown medication", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "createReminder"
)]
#[post("/reminders")]
pub async fn create_reminder(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<ReminderRequest>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner().into_new_reminder()?;
    let reminder = state.reminders.create(&auth.user_id, input).await?;
    Ok(HttpResponse::Created().json(ReminderResponse::from(reminder)))
}

/// List the caller's reminders by scheduled time.
#[utoipa::path(
    get,
    path = "/api/v1/reminders",
    responses(
        (status = 200, description = "Reminders", body = [ReminderResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "listReminders"
)]
#[get("/reminders")]
pub async fn list_reminders(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<ReminderResponse>>> {
    let items = state.reminders.list(&auth.user_id).await?;
    Ok(web::Json(responses(items)))
}

/// Pending reminders due within the look-ahead window.
#[utoipa::path(
    get,
    path = "/api/v1/reminders/upcoming",
    params(UpcomingQuery),
    responses(
        (status = 200, description = "Upcoming reminders", body = [ReminderResponse]),
        (status = 400, description = "Look-ahead out of range", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "upcomingReminders"
)]
#[get("/reminders/upcoming")]
pub async fn upcoming_reminders(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<UpcomingQuery>,
) -> ApiResult<web::Json<Vec<ReminderResponse>>> {
    let items = state
        .reminders
        .upcoming(&auth.user_id, query.into_inner().hours)
        .await?;
    Ok(web::Json(responses(items)))
}

/// Fetch one reminder.
#[utoipa::path(
    get,
    path = "/api/v1/reminders/{id}",
    params(("id" = String, Path, description = "Reminder id")),
    responses(
        (status = 200, description = "Reminder", body = ReminderResponse),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "getReminder"
)]
#[get("/reminders/{id}")]
pub async fn get_reminder(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<ReminderResponse>> {
    let id = reminder_id(&path)?;
    let reminder = state.reminders.get(&auth.user_id, id).await?;
    Ok(web::Json(reminder.into()))
}

/// Reschedule or reword a pending reminder.
#[utoipa::path(
    put,
    path = "/api/v1/reminders/{id}",
    params(("id" = String, Path, description = "Reminder id")),
    request_body = ReminderUpdateRequest,
    responses(
        (status = 200, description = "Updated reminder", body = ReminderResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Reminder already delivered", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "updateReminder"
)]
#[put("/reminders/{id}")]
pub async fn update_reminder(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<ReminderUpdateRequest>,
) -> ApiResult<web::Json<ReminderResponse>> {
    let id = reminder_id(&path)?;
    let update = payload.into_inner().into_update()?;
    let reminder = state.reminders.update(&auth.user_id, id, update).await?;
    Ok(web::Json(reminder.into()))
}

/// Delete a reminder.
#[utoipa::path(
    delete,
    path = "/api/v1/reminders/{id}",
    params(("id" = String, Path, description = "Reminder id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "deleteReminder"
)]
#[delete("/reminders/{id}")]
pub async fn delete_reminder(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = reminder_id(&path)?;
    state.reminders.delete(&auth.user_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Expand a recurrence into usage reminders for one medication.
#[utoipa::path(
    post,
    path = "/api/v1/medications/{id}/usage-schedule",
    params(("id" = String, Path, description = "Medication id")),
    request_body = UsageScheduleBody,
    responses(
        (status = 201, description = "Generated reminders", body = [ReminderResponse]),
        (status = 400, description = "Invalid recurrence", body = ErrorSchema),
        (status = 404, description = "Unknown medication", body = ErrorSchema)
    ),
    tags = ["reminders"],
    operation_id = "generateUsageSchedule"
)]
#[post("/medications/{id}/usage-schedule")]
pub async fn generate_usage_schedule(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UsageScheduleBody>,
) -> ApiResult<HttpResponse> {
    let medication = medication_id(&path)?;
    let request = payload.into_inner().into_request()?;
    let created = state
        .reminders
        .generate_usage_schedule(&auth.user_id, medication, request)
        .await?;
    Ok(HttpResponse::Created().json(responses(created)))
}
