//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer
//! - **Schemas**: request and response bodies plus the domain error wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]), which keep utoipa out of the
//!   domain types
//! - **Security**: bearer token authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::diseases::{
    DiseaseDetailsResponse, DiseaseRequest, DiseaseResponse, DiseaseUpdateRequest,
    RecommendationRequest, RecommendationResponse,
};
use crate::inbound::http::medications::{
    DiseaseReportResponse, MedicationInfoResponse, MedicationRequest, MedicationResponse,
    MedicationUpdateRequest, MissingMedicationResponse,
};
use crate::inbound::http::preferences::{PreferencesBody, PreferencesRequest};
use crate::inbound::http::reminders::{
    ReminderRequest, ReminderResponse, ReminderUpdateRequest, UsageScheduleBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{
    BindEmailRequest, BindPhoneRequest, BindWeChatRequest, LoginRequest, LoginResponse,
    ProfileRequest, RegisterRequest, UserResponse, VerifyPhoneRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Access token issued by POST /api/v1/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Medminder API",
        description = "Medication cabinet, expiry tracking and reminder scheduling."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::delete_current_user,
        crate::inbound::http::users::bind_phone,
        crate::inbound::http::users::verify_phone,
        crate::inbound::http::users::bind_wechat,
        crate::inbound::http::users::bind_email,
        crate::inbound::http::preferences::get_preferences,
        crate::inbound::http::preferences::update_preferences,
        crate::inbound::http::medications::create_medication,
        crate::inbound::http::medications::list_medications,
        crate::inbound::http::medications::search_medication,
        crate::inbound::http::medications::medications_for_disease,
        crate::inbound::http::medications::get_medication,
        crate::inbound::http::medications::update_medication,
        crate::inbound::http::medications::delete_medication,
        crate::inbound::http::reminders::create_reminder,
        crate::inbound::http::reminders::list_reminders,
        crate::inbound::http::reminders::upcoming_reminders,
        crate::inbound::http::reminders::get_reminder,
        crate::inbound::http::reminders::update_reminder,
        crate::inbound::http::reminders::delete_reminder,
        crate::inbound::http::reminders::generate_usage_schedule,
        crate::inbound::http::diseases::create_disease,
        crate::inbound::http::diseases::list_diseases,
        crate::inbound::http::diseases::get_disease,
        crate::inbound::http::diseases::update_disease,
        crate::inbound::http::diseases::delete_disease,
        crate::inbound::http::diseases::add_recommendation,
        crate::inbound::http::diseases::remove_recommendation,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserResponse,
        ProfileRequest,
        BindPhoneRequest,
        VerifyPhoneRequest,
        BindWeChatRequest,
        BindEmailRequest,
        PreferencesBody,
        PreferencesRequest,
        MedicationRequest,
        MedicationUpdateRequest,
        MedicationResponse,
        MedicationInfoResponse,
        MissingMedicationResponse,
        DiseaseReportResponse,
        ReminderRequest,
        ReminderUpdateRequest,
        UsageScheduleBody,
        ReminderResponse,
        DiseaseRequest,
        DiseaseUpdateRequest,
        DiseaseResponse,
        DiseaseDetailsResponse,
        RecommendationRequest,
        RecommendationResponse,
    )),
    tags(
        (name = "auth", description = "Registration and bearer tokens"),
        (name = "users", description = "Profile, channel binding and preferences"),
        (name = "medications", description = "The caller's medication cabinet"),
        (name = "reminders", description = "Expiry and usage reminders"),
        (name = "diseases", description = "Disease catalogue and recommendations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
