//! Handler tests for registration, login and profile endpoints.

use super::*;
use crate::domain::{
    ContactBinding, NotificationPreferences, PasswordDigest, PhoneNumber, UserDraft, UserId,
    Username,
};
use crate::inbound::http::test_utils::{TestPorts, fixed_now, token_for};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use mockall::predicate::eq;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn alice() -> User {
    User::from(UserDraft {
        id: UserId::random(),
        username: Username::new("alice").expect("valid username"),
        password: PasswordDigest::from_stored("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
        phone: Some(ContactBinding {
            address: PhoneNumber::new("13800138000").expect("valid phone"),
            verified: false,
        }),
        wechat: None,
        email: None,
        preferences: NotificationPreferences::default(),
        pending_verification: None,
        created_at: fixed_now(),
    })
}

fn test_app(
    ports: TestPorts,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(ports.into_state()).service(
        web::scope("/api/v1")
            .service(register)
            .service(login)
            .service(logout)
            .service(current_user)
            .service(update_current_user)
            .service(delete_current_user)
            .service(bind_phone)
            .service(verify_phone)
            .service(bind_wechat)
            .service(bind_email),
    )
}

#[rstest]
#[actix_web::test]
async fn register_returns_created_camel_case_profile(alice: User) {
    let mut ports = TestPorts::anonymous();
    let created = alice.clone();
    ports
        .accounts
        .expect_register()
        .withf(|registration| {
            registration.username == "alice"
                && registration.password.as_str() == "correct horse"
                && registration.phone.as_deref() == Some("13800138000")
        })
        .return_once(move |_| Ok(created));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "username": "alice",
            "password": "correct horse",
            "phone": "13800138000"
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("username").and_then(Value::as_str), Some("alice"));
    assert_eq!(body.get("phoneVerified"), Some(&Value::Bool(false)));
    assert_eq!(body.get("wechatOpenid"), Some(&Value::Null));
    assert!(body.get("password").is_none());
    assert_eq!(
        body.pointer("/notificationPreferences/sms"),
        Some(&Value::Bool(true))
    );
}

#[rstest]
#[actix_web::test]
async fn register_surfaces_conflicts() {
    let mut ports = TestPorts::anonymous();
    ports
        .accounts
        .expect_register()
        .return_once(|_| Err(Error::conflict("username alice is already taken")));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"username": "alice", "password": "correct horse"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn login_issues_a_bearer_token() {
    let user = UserId::random();
    let mut ports = TestPorts::anonymous();
    let authenticated = user.clone();
    ports
        .login
        .expect_authenticate()
        .withf(|credentials| {
            credentials.username() == "alice" && credentials.password() == "correct horse"
        })
        .return_once(move |_| Ok(authenticated));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(&LoginRequest {
            username: "alice".into(),
            password: "correct horse".into(),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: LoginResponse = actix_test::read_body_json(response).await;
    assert_eq!(body.token_type, "bearer");
    assert_eq!(body.access_token, format!("token-{user}"));
    assert!(body.expires_at.starts_with("2026-03-02T09:00:00"));
}

#[rstest]
#[case("   ", "password", "username must not be empty", "empty_username")]
#[case("alice", "", "password must not be empty", "empty_password")]
#[actix_web::test]
async fn login_rejects_blank_credentials(
    #[case] username: &str,
    #[case] password: &str,
    #[case] message: &str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(test_app(TestPorts::anonymous())).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(&LoginRequest {
            username: username.into(),
            password: password.into(),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value.get("message").and_then(Value::as_str), Some(message));
    assert_eq!(value.pointer("/details/code").and_then(Value::as_str), Some(code));
}

#[rstest]
#[actix_web::test]
async fn wrong_credentials_are_unauthorised() {
    let mut ports = TestPorts::anonymous();
    ports
        .login
        .expect_authenticate()
        .return_once(|_| Err(Error::unauthorized("invalid username or password")));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(&LoginRequest {
            username: "alice".into(),
            password: "wrong-password".into(),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        value.get("message").and_then(Value::as_str),
        Some("invalid username or password")
    );
}

#[rstest]
#[actix_web::test]
async fn profile_requires_a_token() {
    let app = actix_test::init_service(test_app(TestPorts::anonymous())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn profile_is_read_for_the_token_owner(alice: User) {
    let owner = alice.id().clone();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .accounts
        .expect_profile()
        .with(eq(owner.clone()))
        .return_once(move |_| Ok(alice));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: UserResponse = actix_test::read_body_json(response).await;
    assert_eq!(body.id, owner.to_string());
    assert_eq!(body.phone.as_deref(), Some("13800138000"));
}

#[rstest]
#[actix_web::test]
async fn bind_phone_reports_missing_sms_channel(alice: User) {
    let owner = alice.id().clone();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .accounts
        .expect_bind_phone()
        .withf(|_, phone| phone == "13900139000")
        .return_once(|_, _| Err(Error::service_unavailable("SMS delivery is not configured")));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users/me/phone")
        .insert_header(token_for(&owner))
        .set_json(json!({"phone": "13900139000"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn verify_phone_forwards_the_code(alice: User) {
    let owner = alice.id().clone();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .accounts
        .expect_verify_phone()
        .withf(|_, code| code == "123456")
        .return_once(move |_, _| Ok(alice));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users/me/phone/verify")
        .insert_header(token_for(&owner))
        .set_json(json!({"code": "123456"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn delete_account_returns_no_content() {
    let owner = UserId::random();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .accounts
        .expect_delete_account()
        .with(eq(owner.clone()))
        .return_once(|_| Ok(()));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::delete()
        .uri("/api/v1/users/me")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn logout_returns_no_content() {
    let owner = UserId::random();
    let app = actix_test::init_service(test_app(TestPorts::signed_in(&owner))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
