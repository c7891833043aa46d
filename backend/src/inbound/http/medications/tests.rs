//! Handler tests for the medication cabinet endpoints.

use super::*;
use crate::domain::{
    Error, ExpiryStatus, Medication, MedicationDraft, RecommendationStrength, UserId,
};
use crate::inbound::http::test_utils::{TestPorts, fixed_now, token_for};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::NaiveDate;
use rstest::rstest;
use serde_json::{Value, json};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn aspirin(owner: &UserId) -> MedicationView {
    let medication = Medication::new(MedicationDraft {
        id: MedicationId::random(),
        owner: owner.clone(),
        name: "Aspirin".into(),
        production_date: Some(date(2025, 3, 20)),
        shelf_life_days: Some(365),
        quantity: 20.0,
        unit: "tablet".into(),
        efficacy: Some("Relieves pain".into()),
        usage: None,
        image_url: None,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    })
    .expect("valid medication");
    let status = medication.status_on(fixed_now().date_naive(), 30);
    MedicationView { medication, status }
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
            .service(create_medication)
            .service(list_medications)
            .service(search_medication)
            .service(medications_for_disease)
            .service(get_medication)
            .service(update_medication)
            .service(delete_medication),
    )
}

#[rstest]
#[actix_web::test]
async fn create_parses_dates_and_reports_expiry_flags() {
    let owner = UserId::random();
    let mut ports = TestPorts::signed_in(&owner);
    let view = aspirin(&owner);
    ports
        .medications
        .expect_create()
        .withf(|_, input| {
            input.name == "Aspirin"
                && input.production_date == Some(date(2025, 3, 20))
                && input.shelf_life_days == Some(365)
        })
        .return_once(move |_, _| Ok(view));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/medications")
        .insert_header(token_for(&owner))
        .set_json(json!({
            "name": "Aspirin",
            "productionDate": "2025-03-20",
            "shelfLifeDays": 365
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("expiryDate").and_then(Value::as_str), Some("2026-03-20"));
    assert_eq!(body.get("daysUntilExpiry").and_then(Value::as_i64), Some(19));
    assert_eq!(body.get("isNearExpiry"), Some(&Value::Bool(true)));
    assert_eq!(body.get("isExpired"), Some(&Value::Bool(false)));
}

#[rstest]
#[case(json!({"productionDate": "2025-03-20"}), "name")]
#[case(json!({"name": "Aspirin", "productionDate": "20/03/2025"}), "productionDate")]
#[actix_web::test]
async fn create_rejects_malformed_bodies(#[case] body: Value, #[case] field: &str) {
    let owner = UserId::random();
    let app = actix_test::init_service(test_app(TestPorts::signed_in(&owner))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/medications")
        .insert_header(token_for(&owner))
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value.pointer("/details/field").and_then(Value::as_str), Some(field));
}

#[rstest]
#[actix_web::test]
async fn list_requires_a_token() {
    let app = actix_test::init_service(test_app(TestPorts::anonymous())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/medications")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn malformed_ids_are_rejected_before_the_service() {
    let owner = UserId::random();
    let app = actix_test::init_service(test_app(TestPorts::signed_in(&owner))).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/medications/not-a-uuid")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        value.pointer("/details/code").and_then(Value::as_str),
        Some("invalid_uuid")
    );
}

#[rstest]
#[actix_web::test]
async fn update_distinguishes_null_from_absent() {
    let owner = UserId::random();
    let mut ports = TestPorts::signed_in(&owner);
    let view = aspirin(&owner);
    let id = view.medication.id();
    ports
        .medications
        .expect_update()
        .withf(move |_, target, changes| {
            *target == id
                && changes.efficacy == Some(None)
                && changes.usage.is_none()
                && changes.quantity == Some(5.0)
        })
        .return_once(move |_, _, _| Ok(view));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::put()
        .uri(&format!("/api/v1/medications/{id}"))
        .insert_header(token_for(&owner))
        .set_json(json!({"efficacy": null, "quantity": 5.0}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn delete_returns_no_content() {
    let owner = UserId::random();
    let id = MedicationId::random();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .medications
        .expect_delete()
        .withf(move |_, target| *target == id)
        .return_once(|_, _| Ok(()));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/medications/{id}"))
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn search_returns_knowledge_base_entry() {
    let owner = UserId::random();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .medications
        .expect_search()
        .withf(|name| name == "Ibuprofen")
        .return_once(|_| {
            Ok(MedicationInfo {
                name: "Ibuprofen".into(),
                efficacy: Some("Reduces fever".into()),
                usage: None,
                image_url: None,
                side_effects: Some("Stomach upset".into()),
                precautions: None,
            })
        });
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/medications/search/Ibuprofen")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("sideEffects").and_then(Value::as_str),
        Some("Stomach upset")
    );
}

#[rstest]
#[actix_web::test]
async fn search_surfaces_not_found() {
    let owner = UserId::random();
    let mut ports = TestPorts::signed_in(&owner);
    ports
        .medications
        .expect_search()
        .return_once(|_| Err(Error::not_found("no information for medication Unknownium")));
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/medications/search/Unknownium")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn disease_report_lists_missing_recommendations() {
    let owner = UserId::random();
    let mut ports = TestPorts::signed_in(&owner);
    let view = aspirin(&owner);
    ports
        .medications
        .expect_for_disease()
        .withf(|_, disease| disease == "headache")
        .return_once(move |_, _| {
            Ok(DiseaseMedicationReport {
                disease: "headache".into(),
                available: vec![view.clone()],
                missing: vec![MissingMedication {
                    name: "Ibuprofen".into(),
                    info: None,
                    strength: Some(RecommendationStrength::new(4).expect("valid strength")),
                }],
                near_expiry: vec![view],
                expired: Vec::new(),
            })
        });
    let app = actix_test::init_service(test_app(ports)).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/medications/by-disease/headache")
        .insert_header(token_for(&owner))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: DiseaseReportResponse = actix_test::read_body_json(response).await;
    assert_eq!(body.available.len(), 1);
    assert_eq!(body.near_expiry.len(), 1);
    assert!(body.expired.is_empty());
    assert_eq!(body.missing.first().map(|m| m.name.as_str()), Some("Ibuprofen"));
    assert_eq!(body.missing.first().and_then(|m| m.strength), Some(4));
}

#[rstest]
fn expired_status_maps_to_negative_days(#[values(-1_i64, -30)] days: i64) {
    let owner = UserId::random();
    let mut view = aspirin(&owner);
    let today = fixed_now().date_naive();
    view.status = ExpiryStatus::evaluate(
        today.checked_add_signed(chrono::Duration::days(days)),
        today,
        30,
    );
    let response = MedicationResponse::from(view);
    assert!(response.is_expired);
    assert!(!response.is_near_expiry);
    assert_eq!(response.days_until_expiry, Some(days));
}
