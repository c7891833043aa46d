//! Tests for the medication cabinet service.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    KnowledgeBaseError, MedicationRepositoryError, MockDiseaseRepository,
    MockMedicationKnowledge, MockMedicationRepository, MockReminderRepository,
};
use crate::domain::{Disease, DiseaseId, ErrorCode, MedicationRecommendation, RecommendationId};
use crate::test_support::MutableClock;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[fixture]
fn owner() -> UserId {
    UserId::random()
}

struct Mocks {
    medications: MockMedicationRepository,
    reminders: MockReminderRepository,
    diseases: MockDiseaseRepository,
    knowledge: MockMedicationKnowledge,
}

impl Mocks {
    fn new() -> Self {
        Self {
            medications: MockMedicationRepository::new(),
            reminders: MockReminderRepository::new(),
            diseases: MockDiseaseRepository::new(),
            knowledge: MockMedicationKnowledge::new(),
        }
    }

    fn into_service(self) -> MedicationService {
        let today = Utc
            .with_ymd_and_hms(2026, 3, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        MedicationService::new(
            Arc::new(self.medications),
            Arc::new(self.reminders),
            Arc::new(self.diseases),
            Arc::new(self.knowledge),
            Arc::new(MutableClock::new(today)),
        )
    }
}

fn stored(owner: &UserId, name: &str, produced: NaiveDate, shelf_life: i64) -> Medication {
    let now = Utc::now();
    Medication::new(MedicationDraft {
        id: MedicationId::random(),
        owner: owner.clone(),
        name: name.to_owned(),
        production_date: Some(produced),
        shelf_life_days: Some(shelf_life),
        quantity: 10.0,
        unit: "tablet".to_owned(),
        efficacy: None,
        usage: None,
        image_url: None,
        created_at: now,
        updated_at: now,
    })
    .expect("valid medication")
}

fn info(name: &str) -> MedicationInfo {
    MedicationInfo {
        name: name.to_owned(),
        efficacy: Some("pain relief".to_owned()),
        usage: Some("1 tablet after meals".to_owned()),
        image_url: Some("https://example.com/ibuprofen.jpg".to_owned()),
        side_effects: None,
        precautions: None,
    }
}

#[rstest]
#[tokio::test]
async fn create_enriches_blank_fields_and_applies_defaults(owner: UserId) {
    let mut mocks = Mocks::new();
    mocks
        .knowledge
        .expect_lookup()
        .times(1)
        .return_once(|name| Ok(Some(info(name))));
    mocks.medications.expect_save().times(1).return_once(|_| Ok(()));
    let service = mocks.into_service();

    let view = service
        .create(
            &owner,
            NewMedication {
                name: "布洛芬".to_owned(),
                production_date: Some(date(2025, 3, 1)),
                shelf_life_days: Some(380),
                usage: Some("as prescribed".to_owned()),
                ..NewMedication::default()
            },
        )
        .await
        .expect("create succeeds");

    let medication = &view.medication;
    assert_eq!(medication.quantity(), 1.0);
    assert_eq!(medication.unit(), "tablet");
    assert_eq!(medication.efficacy(), Some("pain relief"));
    assert_eq!(medication.usage(), Some("as prescribed"));
    assert_eq!(medication.expiry_date(), Some(date(2026, 3, 16)));
    assert!(view.status.is_near_expiry);
    assert_eq!(view.status.days_until_expiry, Some(15));
}

#[rstest]
#[tokio::test]
async fn create_survives_knowledge_base_outage(owner: UserId) {
    let mut mocks = Mocks::new();
    mocks
        .knowledge
        .expect_lookup()
        .return_once(|_| Err(KnowledgeBaseError::unavailable("file missing")));
    mocks.medications.expect_save().times(1).return_once(|_| Ok(()));
    let service = mocks.into_service();

    let view = service
        .create(
            &owner,
            NewMedication {
                name: "Aspirin".to_owned(),
                ..NewMedication::default()
            },
        )
        .await
        .expect("create succeeds");
    assert_eq!(view.medication.efficacy(), None);
    assert_eq!(view.status.expiry_date, None);
}

#[rstest]
#[tokio::test]
async fn create_rejects_invalid_input_without_saving(owner: UserId) {
    let mut mocks = Mocks::new();
    mocks.medications.expect_save().times(0);
    let service = mocks.into_service();

    let error = service
        .create(
            &owner,
            NewMedication {
                name: "Aspirin".to_owned(),
                shelf_life_days: Some(-5),
                ..NewMedication::default()
            },
        )
        .await
        .expect_err("invalid shelf life");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn foreign_medications_read_as_not_found(owner: UserId) {
    let mut mocks = Mocks::new();
    mocks
        .medications
        .expect_find_owned()
        .times(1)
        .return_once(|_, _| Ok(None));
    let service = mocks.into_service();

    let error = service
        .get(&owner, MedicationId::random())
        .await
        .expect_err("not found");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_recomputes_expiry(owner: UserId) {
    let existing = stored(&owner, "Aspirin", date(2025, 1, 1), 365);
    let id = existing.id();
    let mut mocks = Mocks::new();
    mocks
        .medications
        .expect_find_owned()
        .return_once(move |_, _| Ok(Some(existing)));
    mocks.medications.expect_save().times(1).return_once(|_| Ok(()));
    let service = mocks.into_service();

    let view = service
        .update(
            &owner,
            id,
            MedicationChanges {
                shelf_life_days: Some(Some(730)),
                ..MedicationChanges::default()
            },
        )
        .await
        .expect("update succeeds");

    assert_eq!(view.medication.expiry_date(), Some(date(2027, 1, 1)));
    assert!(!view.status.is_expired);
}

#[rstest]
#[tokio::test]
async fn delete_removes_reminders_first(owner: UserId) {
    let existing = stored(&owner, "Aspirin", date(2025, 1, 1), 365);
    let id = existing.id();
    let mut mocks = Mocks::new();
    mocks
        .medications
        .expect_find_owned()
        .return_once(move |_, _| Ok(Some(existing)));
    mocks
        .reminders
        .expect_delete_for_medication()
        .withf(move |medication| *medication == id)
        .times(1)
        .return_once(|_| Ok(3));
    mocks
        .medications
        .expect_delete_owned()
        .times(1)
        .return_once(|_, _| Ok(true));
    let service = mocks.into_service();

    service.delete(&owner, id).await.expect("delete succeeds");
}

#[rstest]
#[tokio::test]
async fn repository_outage_maps_to_service_unavailable(owner: UserId) {
    let mut mocks = Mocks::new();
    mocks
        .medications
        .expect_list_by_owner()
        .return_once(|_| Err(MedicationRepositoryError::connection("pool exhausted")));
    let service = mocks.into_service();

    let error = service.list(&owner).await.expect_err("outage");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[case("a", ErrorCode::InvalidRequest)]
#[case("drop;", ErrorCode::InvalidRequest)]
#[case("Unknown", ErrorCode::NotFound)]
#[tokio::test]
async fn search_validates_then_looks_up(#[case] name: &str, #[case] expected: ErrorCode) {
    let mut mocks = Mocks::new();
    mocks.knowledge.expect_lookup().return_once(|_| Ok(None));
    let service = mocks.into_service();

    let error = service.search(name).await.expect_err("search fails");
    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn disease_report_splits_cabinet(owner: UserId) {
    let cabinet = vec![
        stored(&owner, "布洛芬", date(2025, 1, 1), 730),
        stored(&owner, "阿司匹林", date(2025, 1, 1), 365),
        stored(&owner, "维生素C", date(2025, 3, 1), 370),
    ];
    let mut mocks = Mocks::new();
    mocks.knowledge.expect_recommended_for().return_once(|_| {
        Ok(vec![
            "布洛芬".to_owned(),
            "阿司匹林".to_owned(),
            "对乙酰氨基酚".to_owned(),
        ])
    });
    mocks
        .knowledge
        .expect_lookup()
        .returning(|name| Ok(Some(info(name))));
    mocks
        .medications
        .expect_list_by_owner()
        .return_once(move |_| Ok(cabinet));
    let service = mocks.into_service();

    let report = service
        .for_disease(&owner, " 头痛 ")
        .await
        .expect("report succeeds");

    let names = |views: &[MedicationView]| {
        views
            .iter()
            .map(|view| view.medication.name().to_owned())
            .collect::<Vec<_>>()
    };
    assert_eq!(report.disease, "头痛");
    assert_eq!(names(&report.available), vec!["布洛芬"]);
    assert_eq!(
        report
            .missing
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>(),
        vec!["阿司匹林", "对乙酰氨基酚"]
    );
    assert_eq!(names(&report.expired), vec!["阿司匹林"]);
    assert_eq!(names(&report.near_expiry), vec!["维生素C"]);
}

#[rstest]
#[tokio::test]
async fn disease_report_falls_back_to_catalogue(owner: UserId) {
    let disease = Disease::new(DiseaseId::random(), "Gout", None).expect("valid disease");
    let disease_id = disease.id();
    let recommendation = MedicationRecommendation::new(
        RecommendationId::random(),
        disease_id,
        "Colchicine",
        RecommendationStrength::new(4).expect("valid strength"),
    )
    .expect("valid recommendation");

    let mut mocks = Mocks::new();
    mocks
        .knowledge
        .expect_recommended_for()
        .return_once(|_| Ok(Vec::new()));
    mocks.knowledge.expect_lookup().returning(|_| Ok(None));
    mocks
        .diseases
        .expect_find_by_name()
        .return_once(move |_| Ok(Some(disease)));
    mocks
        .diseases
        .expect_recommendations()
        .withf(move |id| *id == disease_id)
        .return_once(move |_| Ok(vec![recommendation]));
    mocks
        .medications
        .expect_list_by_owner()
        .return_once(|_| Ok(Vec::new()));
    let service = mocks.into_service();

    let report = service
        .for_disease(&owner, "Gout")
        .await
        .expect("report succeeds");

    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].name, "Colchicine");
    assert_eq!(report.missing[0].strength.map(RecommendationStrength::value), Some(4));
    assert!(report.missing[0].info.is_none());
}
