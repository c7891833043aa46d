//! Account HTTP handlers: registration, bearer-token login and the caller's
//! profile with its contact channels.
//!
//! ```text
//! POST /api/v1/auth/register {"username":"alice","password":"correct horse"}
//! POST /api/v1/auth/login {"username":"alice","password":"correct horse"}
//! POST /api/v1/auth/logout
//! GET|PUT|DELETE /api/v1/users/me
//! POST /api/v1/users/me/phone {"phone":"13800138000"}
//! POST /api/v1/users/me/phone/verify {"code":"123456"}
//! POST /api/v1/users/me/wechat {"openid":"o6_bmjrPTlm6_2sgVt7hMZOPfL2M"}
//! POST /api/v1/users/me/email {"email":"alice@example.com"}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ports::{ProfileUpdate, Registration};
use crate::domain::{Error, LoginCredentials, LoginValidationError, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::preferences::PreferencesBody;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Registration body for `POST /api/v1/auth/register`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// 3–50 characters: letters, digits, `_`, `-`, `.`.
    pub username: String,
    /// At least 8 characters.
    pub password: String,
    pub phone: Option<String>,
    pub wechat_openid: Option<String>,
    pub email: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(value: RegisterRequest) -> Self {
        Self {
            username: value.username,
            password: Zeroizing::new(value.password),
            phone: value.phone,
            wechat_openid: value.wechat_openid,
            email: value.email,
        }
    }
}

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Bearer token returned by a successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
    /// RFC 3339 expiry instant.
    pub expires_at: String,
}

/// Public view of an account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub wechat_openid: Option<String>,
    pub wechat_verified: bool,
    pub email: Option<String>,
    pub email_verified: bool,
    pub notification_preferences: PreferencesBody,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let phone = user.phone();
        let wechat = user.wechat();
        let email = user.email();
        Self {
            id: user.id().to_string(),
            username: user.username().as_ref().to_owned(),
            phone: phone.map(|binding| binding.address.as_ref().to_owned()),
            phone_verified: phone.is_some_and(|binding| binding.verified),
            wechat_openid: wechat.map(|binding| binding.address.as_ref().to_owned()),
            wechat_verified: wechat.is_some_and(|binding| binding.verified),
            email: email.map(|binding| binding.address.as_ref().to_owned()),
            email_verified: email.is_some_and(|binding| binding.verified),
            notification_preferences: user.preferences().into(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

/// Partial profile update for `PUT /api/v1/users/me`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Body for `POST /api/v1/users/me/phone`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct BindPhoneRequest {
    pub phone: String,
}

/// Body for `POST /api/v1/users/me/phone/verify`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct VerifyPhoneRequest {
    /// Six-digit code received by SMS.
    pub code: String,
}

/// Body for `POST /api/v1/users/me/wechat`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct BindWeChatRequest {
    pub openid: String,
}

/// Body for `POST /api/v1/users/me/email`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct BindEmailRequest {
    pub email: String,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Username or contact already taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let user = state.accounts.register(payload.into_inner().into()).await?;
    info!(user = %user.id(), "account registered");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    let issued = state.tokens.issue(&user_id).await?;
    Ok(web::Json(LoginResponse {
        access_token: issued.token.expose().to_owned(),
        token_type: "bearer".to_owned(),
        expires_at: issued.expires_at.to_rfc3339(),
    }))
}

/// Revoke the presented bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(state: web::Data<HttpState>, auth: Authenticated) -> ApiResult<HttpResponse> {
    state.tokens.revoke(&auth.token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.accounts.profile(&auth.user_id).await?;
    Ok(web::Json(user.into()))
}

/// Change username and/or email.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Username or email already taken", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[put("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let ProfileRequest { username, email } = payload.into_inner();
    let user = state
        .accounts
        .update_profile(&auth.user_id, ProfileUpdate { username, email })
        .await?;
    Ok(web::Json(user.into()))
}

/// Delete the caller's account with its medications and reminders.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteCurrentUser"
)]
#[delete("/users/me")]
pub async fn delete_current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<HttpResponse> {
    state.accounts.delete_account(&auth.user_id).await?;
    state.tokens.revoke(&auth.token).await?;
    info!(user = %auth.user_id, "account deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Bind a phone number and text it a verification code.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/phone",
    request_body = BindPhoneRequest,
    responses(
        (status = 200, description = "Code sent; phone awaiting verification", body = UserResponse),
        (status = 400, description = "Invalid phone number", body = ErrorSchema),
        (status = 409, description = "Phone bound to another account", body = ErrorSchema),
        (status = 503, description = "SMS delivery unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "bindPhone"
)]
#[post("/users/me/phone")]
pub async fn bind_phone(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<BindPhoneRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .accounts
        .bind_phone(&auth.user_id, &payload.phone)
        .await?;
    Ok(web::Json(user.into()))
}

/// Redeem a phone verification code.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/phone/verify",
    request_body = VerifyPhoneRequest,
    responses(
        (status = 200, description = "Phone verified", body = UserResponse),
        (status = 400, description = "Wrong, expired or missing code", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "verifyPhone"
)]
#[post("/users/me/phone/verify")]
pub async fn verify_phone(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<VerifyPhoneRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .accounts
        .verify_phone(&auth.user_id, &payload.code)
        .await?;
    Ok(web::Json(user.into()))
}

/// Bind a WeChat openid.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/wechat",
    request_body = BindWeChatRequest,
    responses(
        (status = 200, description = "WeChat bound", body = UserResponse),
        (status = 400, description = "Invalid openid", body = ErrorSchema),
        (status = 409, description = "Openid bound to another account", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "bindWeChat"
)]
#[post("/users/me/wechat")]
pub async fn bind_wechat(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<BindWeChatRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .accounts
        .bind_wechat(&auth.user_id, &payload.openid)
        .await?;
    Ok(web::Json(user.into()))
}

/// Bind an email address.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/email",
    request_body = BindEmailRequest,
    responses(
        (status = 200, description = "Email bound", body = UserResponse),
        (status = 400, description = "Invalid address", body = ErrorSchema),
        (status = 409, description = "Address bound to another account", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "bindEmail"
)]
#[post("/users/me/email")]
pub async fn bind_email(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<BindEmailRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .accounts
        .bind_email(&auth.user_id, &payload.email)
        .await?;
    Ok(web::Json(user.into()))
}

#[cfg(test)]
mod tests;
