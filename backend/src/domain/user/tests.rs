//! Tests for the user aggregate and its value types.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

use crate::domain::auth::PasswordDigest;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn user() -> User {
    User::from(UserDraft {
        id: UserId::random(),
        username: Username::new("ada").expect("valid username"),
        password: PasswordDigest::from_stored("$argon2id$v=19$stub"),
        phone: None,
        wechat: None,
        email: None,
        preferences: NotificationPreferences::default(),
        pending_verification: None,
        created_at: at(8, 0),
    })
}

fn code(value: &str) -> VerificationCode {
    VerificationCode::new(value).expect("valid code")
}

#[rstest]
#[case("3fa85f64-5717-4562-b3fc-2c963f66afa6", true)]
#[case("", false)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", false)]
#[case("not-a-uuid", false)]
fn user_id_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(UserId::new(raw).is_ok(), valid);
}

#[rstest]
#[case("ab", false)]
#[case("  ada  ", true)]
#[case("ada.lovelace_1", true)]
#[case("ada lovelace", false)]
#[case("药师小王", true)]
fn username_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(Username::new(raw).is_ok(), valid);
}

#[rstest]
#[case("+86 138-0013-8000", Some("+8613800138000"))]
#[case("12345", None)]
#[case("12ab5678", None)]
fn phone_number_is_normalised(#[case] raw: &str, #[case] expected: Option<&str>) {
    let parsed = PhoneNumber::new(raw).ok();
    assert_eq!(parsed.as_ref().map(AsRef::as_ref), expected);
}

#[rstest]
#[case("Ada@Example.org", true)]
#[case("ada@example", false)]
#[case("@example.org", false)]
#[case("ada@@example.org", false)]
fn email_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(EmailAddress::new(raw).is_ok(), valid);
}

#[rstest]
#[case("123456", true)]
#[case("12345", false)]
#[case("12345a", false)]
fn verification_code_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(VerificationCode::new(raw).is_some(), valid);
}

#[rstest]
fn unverified_phone_is_not_a_delivery_target(mut user: User) {
    user.bind_phone(
        PhoneNumber::new("13800138000").expect("phone"),
        PendingVerification {
            code: code("123456"),
            issued_at: at(8, 0),
        },
    );
    assert!(user.delivery_targets().is_empty());
}

#[rstest]
fn verify_phone_with_matching_code_enables_sms(mut user: User) {
    user.bind_phone(
        PhoneNumber::new("13800138000").expect("phone"),
        PendingVerification {
            code: code("123456"),
            issued_at: at(8, 0),
        },
    );

    user.verify_phone(&code("123456"), at(8, 4))
        .expect("verification succeeds");

    assert!(user.pending_verification().is_none());
    assert_eq!(
        user.delivery_targets(),
        vec![(ChannelKind::Sms, "13800138000".to_owned())]
    );
}

#[rstest]
#[case("654321", at(8, 1), PhoneVerificationError::Mismatch)]
#[case("123456", at(8, 6), PhoneVerificationError::Expired)]
fn verify_phone_rejects_bad_attempts(
    mut user: User,
    #[case] attempt: &str,
    #[case] now: DateTime<Utc>,
    #[case] expected: PhoneVerificationError,
) {
    user.bind_phone(
        PhoneNumber::new("13800138000").expect("phone"),
        PendingVerification {
            code: code("123456"),
            issued_at: at(8, 0),
        },
    );

    let error = user
        .verify_phone(&code(attempt), now)
        .expect_err("verification fails");
    assert_eq!(error, expected);
    assert!(!user.phone().expect("phone bound").verified);
}

#[rstest]
fn verify_phone_without_binding_fails(mut user: User) {
    let error = user
        .verify_phone(&code("123456"), at(8, 0))
        .expect_err("no phone bound");
    assert_eq!(error, PhoneVerificationError::NoPhoneBound);
}

#[rstest]
fn delivery_targets_respect_preferences_and_order(mut user: User) {
    user.bind_email(EmailAddress::new("ada@example.org").expect("email"));
    user.bind_wechat(WeChatOpenId::new("o6_bmjrPTlm6_2sgVt7hMZOPfL2M").expect("openid"));

    let kinds: Vec<ChannelKind> = user
        .delivery_targets()
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();
    assert_eq!(kinds, vec![ChannelKind::WeChat, ChannelKind::Email]);

    user.set_preferences(NotificationPreferences {
        sms: true,
        wechat: false,
        email: true,
    });
    assert_eq!(
        user.delivery_targets(),
        vec![(ChannelKind::Email, "ada@example.org".to_owned())]
    );
}
