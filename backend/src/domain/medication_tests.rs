//! Tests for medication validation and expiry computation.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[fixture]
fn draft() -> MedicationDraft {
    let created = Utc
        .with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    MedicationDraft {
        id: MedicationId::random(),
        owner: UserId::random(),
        name: "  Ibuprofen  ".to_owned(),
        production_date: Some(date(2026, 1, 1)),
        shelf_life_days: Some(365),
        quantity: 12.0,
        unit: "tablet".to_owned(),
        efficacy: None,
        usage: Some("   ".to_owned()),
        image_url: None,
        created_at: created,
        updated_at: created,
    }
}

#[rstest]
#[case(date(2026, 1, 1), 0, date(2026, 1, 1))]
#[case(date(2026, 1, 1), 31, date(2026, 2, 1))]
#[case(date(2024, 2, 28), 1, date(2024, 2, 29))]
#[case(date(2025, 12, 31), 365, date(2026, 12, 31))]
fn expiry_is_production_plus_shelf_life(
    #[case] produced: NaiveDate,
    #[case] days: u32,
    #[case] expected: NaiveDate,
) {
    assert_eq!(expiry_date(Some(produced), Some(days)), Some(expected));
}

#[rstest]
#[case(None, Some(10))]
#[case(Some(date(2026, 1, 1)), None)]
#[case(None, None)]
fn missing_inputs_leave_expiry_unknown(
    #[case] produced: Option<NaiveDate>,
    #[case] days: Option<u32>,
) {
    assert_eq!(expiry_date(produced, days), None);
    let status = ExpiryStatus::evaluate(None, date(2026, 1, 1), 30);
    assert!(!status.is_expired);
    assert!(!status.is_near_expiry);
    assert_eq!(status.days_until_expiry, None);
}

#[rstest]
#[case(date(2026, 3, 1), false, true)]
#[case(date(2026, 3, 31), false, true)]
#[case(date(2026, 4, 1), false, false)]
#[case(date(2026, 2, 28), true, false)]
fn status_flags_follow_window_boundaries(
    #[case] expiry: NaiveDate,
    #[case] expired: bool,
    #[case] near: bool,
) {
    let status = ExpiryStatus::evaluate(Some(expiry), date(2026, 3, 1), 30);
    assert_eq!(status.is_expired, expired);
    assert_eq!(status.is_near_expiry, near);
}

#[rstest]
fn new_derives_expiry_and_normalises_text(draft: MedicationDraft) {
    let medication = Medication::new(draft).expect("valid draft");
    assert_eq!(medication.name(), "Ibuprofen");
    assert_eq!(medication.expiry_date(), Some(date(2027, 1, 1)));
    assert_eq!(medication.usage(), None);
}

#[rstest]
#[case(Some(-1))]
#[case(Some(36_501))]
fn new_rejects_out_of_range_shelf_life(mut draft: MedicationDraft, #[case] days: Option<i64>) {
    draft.shelf_life_days = days;
    let error = Medication::new(draft).expect_err("invalid shelf life");
    assert_eq!(error, MedicationValidationError::ShelfLife { max: 36_500 });
}

#[rstest]
#[case(-1.0)]
#[case(f64::NAN)]
fn new_rejects_invalid_quantity(mut draft: MedicationDraft, #[case] quantity: f64) {
    draft.quantity = quantity;
    let error = Medication::new(draft).expect_err("invalid quantity");
    assert_eq!(error, MedicationValidationError::Quantity);
}

#[rstest]
fn new_rejects_blank_name(mut draft: MedicationDraft) {
    draft.name = "   ".to_owned();
    assert!(matches!(
        Medication::new(draft),
        Err(MedicationValidationError::Name { .. })
    ));
}

#[rstest]
fn apply_recomputes_expiry_when_inputs_change(draft: MedicationDraft) {
    let mut medication = Medication::new(draft).expect("valid draft");
    let now = Utc::now();

    medication
        .apply(
            MedicationChanges {
                shelf_life_days: Some(Some(30)),
                ..MedicationChanges::default()
            },
            now,
        )
        .expect("valid update");
    assert_eq!(medication.expiry_date(), Some(date(2026, 1, 31)));

    medication
        .apply(
            MedicationChanges {
                production_date: Some(None),
                ..MedicationChanges::default()
            },
            now,
        )
        .expect("valid update");
    assert_eq!(medication.expiry_date(), None);
    assert_eq!(medication.updated_at(), now);
}

#[rstest]
fn rejected_apply_leaves_medication_unchanged(draft: MedicationDraft) {
    let mut medication = Medication::new(draft).expect("valid draft");
    let before = medication.clone();

    let result = medication.apply(
        MedicationChanges {
            name: Some("Aspirin".to_owned()),
            quantity: Some(-3.0),
            ..MedicationChanges::default()
        },
        Utc::now(),
    );

    assert!(result.is_err());
    assert_eq!(medication, before);
}

#[rstest]
fn enrich_only_fills_empty_fields(mut draft: MedicationDraft) {
    draft.efficacy = Some("pain relief".to_owned());
    let mut medication = Medication::new(draft).expect("valid draft");

    medication.enrich(Some("fever"), Some("1 tablet every 6 hours"), None);

    assert_eq!(medication.efficacy(), Some("pain relief"));
    assert_eq!(medication.usage(), Some("1 tablet every 6 hours"));
    assert_eq!(medication.image_url(), None);
}
