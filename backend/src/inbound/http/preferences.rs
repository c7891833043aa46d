//! Notification preference HTTP handlers.
//!
//! ```text
//! GET /api/v1/users/me/notification-preferences
//! PUT /api/v1/users/me/notification-preferences {"sms":false}
//! ```

use actix_web::{HttpResponse, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::NotificationPreferences;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Per-channel opt-in flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PreferencesBody {
    pub sms: bool,
    pub wechat: bool,
    pub email: bool,
}

impl From<NotificationPreferences> for PreferencesBody {
    fn from(value: NotificationPreferences) -> Self {
        Self {
            sms: value.sms,
            wechat: value.wechat,
            email: value.email,
        }
    }
}

/// Partial preference update; omitted channels keep their current flag.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PreferencesRequest {
    pub sms: Option<bool>,
    pub wechat: Option<bool>,
    pub email: Option<bool>,
}

impl PreferencesRequest {
    fn apply_to(&self, current: NotificationPreferences) -> NotificationPreferences {
        NotificationPreferences {
            sms: self.sms.unwrap_or(current.sms),
            wechat: self.wechat.unwrap_or(current.wechat),
            email: self.email.unwrap_or(current.email),
        }
    }
}

/// Fetch the caller's notification preferences.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/notification-preferences",
    responses(
        (
            status = 200,
            description = "Notification preferences",
            headers(("Cache-Control" = String, description = "Cache control header")),
            body = PreferencesBody
        ),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getNotificationPreferences"
)]
#[get("/users/me/notification-preferences")]
pub async fn get_preferences(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<HttpResponse> {
    let preferences = state.accounts.preferences(&auth.user_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "private, must-revalidate, no-cache"))
        .json(PreferencesBody::from(preferences)))
}

/// Update the caller's notification preferences.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/notification-preferences",
    request_body = PreferencesRequest,
    responses(
        (status = 200, description = "Updated preferences", body = PreferencesBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateNotificationPreferences"
)]
#[put("/users/me/notification-preferences")]
pub async fn update_preferences(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<PreferencesRequest>,
) -> ApiResult<web::Json<PreferencesBody>> {
    let current = state.accounts.preferences(&auth.user_id).await?;
    let updated = state
        .accounts
        .update_preferences(&auth.user_id, payload.apply_to(current))
        .await?;
    Ok(web::Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::inbound::http::test_utils::{TestPorts, token_for};
    use actix_web::{App, http::StatusCode, test as actix_test};
    use mockall::predicate::eq;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case(PreferencesRequest::default(), NotificationPreferences::default())]
    #[case(
        PreferencesRequest { sms: Some(false), ..PreferencesRequest::default() },
        NotificationPreferences { sms: false, wechat: true, email: true }
    )]
    #[case(
        PreferencesRequest { sms: Some(false), wechat: Some(false), email: Some(false) },
        NotificationPreferences { sms: false, wechat: false, email: false }
    )]
    fn omitted_flags_keep_their_value(
        #[case] request: PreferencesRequest,
        #[case] expected: NotificationPreferences,
    ) {
        assert_eq!(request.apply_to(NotificationPreferences::default()), expected);
    }

    #[actix_web::test]
    async fn get_returns_flags_with_no_cache_header() {
        let user = UserId::random();
        let mut ports = TestPorts::signed_in(&user);
        ports
            .accounts
            .expect_preferences()
            .with(eq(user.clone()))
            .return_once(|_| {
                Ok(NotificationPreferences {
                    sms: true,
                    wechat: false,
                    email: true,
                })
            });
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .service(get_preferences),
        )
        .await;

        let request = actix_test::TestRequest::get()
            .uri("/users/me/notification-preferences")
            .insert_header(token_for(&user))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("Cache-Control")
                .and_then(|value| value.to_str().ok()),
            Some("private, must-revalidate, no-cache")
        );
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body, json!({"sms": true, "wechat": false, "email": true}));
    }

    #[actix_web::test]
    async fn put_merges_with_current_flags() {
        let user = UserId::random();
        let mut ports = TestPorts::signed_in(&user);
        ports
            .accounts
            .expect_preferences()
            .return_once(|_| Ok(NotificationPreferences::default()));
        ports
            .accounts
            .expect_update_preferences()
            .withf(|_, prefs| !prefs.email && prefs.sms && prefs.wechat)
            .return_once(|_, prefs| Ok(prefs));
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .service(update_preferences),
        )
        .await;

        let request = actix_test::TestRequest::put()
            .uri("/users/me/notification-preferences")
            .insert_header(token_for(&user))
            .set_json(json!({"email": false}))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body.get("email"), Some(&Value::Bool(false)));
    }
}
