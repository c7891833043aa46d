//! Unit tests for the reminder dispatch scan.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone};
use rstest::{fixture, rstest};
use tokio::sync::Notify;

use super::*;
use crate::domain::ports::{
    MockMedicationRepository, MockReminderRepository, MockUserRepository,
    ReminderRepositoryError, UserPersistenceError,
};
use crate::domain::{
    ContactBinding, EmailAddress, ErrorCode, Medication, MedicationDraft, MedicationId,
    NotificationPreferences, PasswordDigest, PhoneNumber, ReminderKind, User, UserDraft, UserId,
    Username, WeChatOpenId,
};
use crate::test_support::{MutableClock, RecordingChannel};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn owner() -> User {
    User::from(UserDraft {
        id: UserId::random(),
        username: Username::new("alice").expect("valid username"),
        password: PasswordDigest::from_stored("$argon2id$stub"),
        phone: Some(ContactBinding {
            address: PhoneNumber::new("+8613800000000").expect("valid phone"),
            verified: true,
        }),
        wechat: Some(ContactBinding {
            address: WeChatOpenId::new("openid-1").expect("valid openid"),
            verified: true,
        }),
        email: Some(ContactBinding {
            address: EmailAddress::new("alice@example.com").expect("valid email"),
            verified: true,
        }),
        preferences: NotificationPreferences {
            sms: true,
            wechat: true,
            email: false,
        },
        pending_verification: None,
        created_at: now(),
    })
}

fn medication(owner: &UserId) -> Medication {
    Medication::new(MedicationDraft {
        id: MedicationId::random(),
        owner: owner.clone(),
        name: "Aspirin".to_owned(),
        production_date: NaiveDate::from_ymd_opt(2025, 4, 1),
        shelf_life_days: Some(365),
        quantity: 1.0,
        unit: "tablet".to_owned(),
        efficacy: None,
        usage: None,
        image_url: None,
        created_at: now(),
        updated_at: now(),
    })
    .expect("valid medication")
}

fn reminder(owner: &UserId, medication: MedicationId, offset_minutes: i64) -> Reminder {
    Reminder::pending(
        owner.clone(),
        medication,
        ReminderKind::Expiry,
        now() + Duration::minutes(offset_minutes),
        None,
        now() - Duration::days(1),
    )
    .expect("valid reminder")
}

struct Harness {
    reminders: MockReminderRepository,
    medications: MockMedicationRepository,
    users: MockUserRepository,
    sms: Arc<RecordingChannel>,
    wechat: Arc<RecordingChannel>,
}

impl Harness {
    fn new(sms: RecordingChannel, wechat: RecordingChannel) -> Self {
        let mut reminders = MockReminderRepository::new();
        reminders
            .expect_mark_missed_before()
            .returning(|_, _| Ok(0));
        Self {
            reminders,
            medications: MockMedicationRepository::new(),
            users: MockUserRepository::new(),
            sms: Arc::new(sms),
            wechat: Arc::new(wechat),
        }
    }

    fn with_owner_and_medication(mut self, owner: User, medication: Medication) -> Self {
        self.users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(owner.clone())));
        self.medications
            .expect_find_by_id()
            .returning(move |_| Ok(Some(medication.clone())));
        self
    }

    fn into_dispatcher(self) -> ReminderDispatcher {
        let channels = NotificationChannels::new()
            .with(self.sms.clone())
            .with(self.wechat.clone());
        ReminderDispatcher::new(
            ReminderDispatcherPorts {
                reminders: Arc::new(self.reminders),
                medications: Arc::new(self.medications),
                users: Arc::new(self.users),
                channels,
            },
            Arc::new(MutableClock::new(now())),
            ReminderDispatcherConfig::default(),
        )
    }
}

#[rstest]
#[tokio::test]
async fn due_reminder_is_sent_over_every_eligible_channel(owner: User) {
    let medication = medication(owner.id());
    let due = reminder(owner.id(), medication.id(), 4);
    let due_id = due.id();
    let mut harness = Harness::new(
        RecordingChannel::accepting(ChannelKind::Sms),
        RecordingChannel::accepting(ChannelKind::WeChat),
    )
    .with_owner_and_medication(owner, medication);
    harness
        .reminders
        .expect_list_pending_between()
        .withf(|scope, from, to| {
            scope.is_none()
                && *from == now() - Duration::minutes(5)
                && *to == now() + Duration::minutes(5)
        })
        .return_once(move |_, _, _| Ok(vec![due]));
    harness
        .reminders
        .expect_mark_sent()
        .withf(move |id, _| *id == due_id)
        .times(1)
        .return_once(|_, _| Ok(true));
    let sms = harness.sms.clone();
    let wechat = harness.wechat.clone();
    let dispatcher = harness.into_dispatcher();

    let outcome = dispatcher.dispatch_due().await.expect("scan succeeds");

    assert_eq!(outcome.candidates, 1);
    assert_eq!(outcome.sent, 1);
    assert_eq!(outcome.sms.delivered, 1);
    assert_eq!(outcome.wechat.delivered, 1);
    assert_eq!(outcome.email, ChannelTally::default());
    let sms_sent = sms.sent();
    assert_eq!(sms_sent.len(), 1);
    assert_eq!(sms_sent[0].recipient, "+8613800000000");
    assert_eq!(
        sms_sent[0].message,
        "Your medication 'Aspirin' will expire in 30 days, please deal with it in time."
    );
    assert_eq!(wechat.sent()[0].recipient, "openid-1");
}

#[rstest]
#[tokio::test]
async fn one_working_channel_is_enough(owner: User) {
    let medication = medication(owner.id());
    let due = reminder(owner.id(), medication.id(), 0);
    let mut harness = Harness::new(
        RecordingChannel::failing(ChannelKind::Sms),
        RecordingChannel::accepting(ChannelKind::WeChat),
    )
    .with_owner_and_medication(owner, medication);
    harness
        .reminders
        .expect_list_pending_between()
        .return_once(move |_, _, _| Ok(vec![due]));
    harness
        .reminders
        .expect_mark_sent()
        .times(1)
        .return_once(|_, _| Ok(true));
    let dispatcher = harness.into_dispatcher();

    let outcome = dispatcher.dispatch_due().await.expect("scan succeeds");

    assert_eq!(outcome.sent, 1);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.sms, ChannelTally { delivered: 0, failed: 1 });
    assert_eq!(outcome.wechat.delivered, 1);
}

#[rstest]
#[tokio::test]
async fn total_failure_leaves_reminder_pending(owner: User) {
    let medication = medication(owner.id());
    let due = reminder(owner.id(), medication.id(), -2);
    let mut harness = Harness::new(
        RecordingChannel::failing(ChannelKind::Sms),
        RecordingChannel::failing(ChannelKind::WeChat),
    )
    .with_owner_and_medication(owner, medication);
    harness
        .reminders
        .expect_list_pending_between()
        .return_once(move |_, _, _| Ok(vec![due]));
    harness.reminders.expect_mark_sent().times(0);
    let dispatcher = harness.into_dispatcher();

    let outcome = dispatcher.dispatch_due().await.expect("scan succeeds");

    assert_eq!(outcome.sent, 0);
    assert_eq!(outcome.failed, 1);
}

#[rstest]
#[tokio::test]
async fn owner_without_verified_channels_counts_as_failure(owner: User) {
    let mut unverified = owner.clone();
    unverified.set_preferences(NotificationPreferences {
        sms: false,
        wechat: false,
        email: false,
    });
    let medication = medication(owner.id());
    let due = reminder(owner.id(), medication.id(), 1);
    let mut harness = Harness::new(
        RecordingChannel::accepting(ChannelKind::Sms),
        RecordingChannel::accepting(ChannelKind::WeChat),
    )
    .with_owner_and_medication(unverified, medication);
    harness
        .reminders
        .expect_list_pending_between()
        .return_once(move |_, _, _| Ok(vec![due]));
    harness.reminders.expect_mark_sent().times(0);
    let sms = harness.sms.clone();
    let dispatcher = harness.into_dispatcher();

    let outcome = dispatcher.dispatch_due().await.expect("scan succeeds");

    assert_eq!(outcome.failed, 1);
    assert!(sms.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn lookup_failure_is_counted_and_scan_continues(owner: User) {
    let medication = medication(owner.id());
    let first = reminder(owner.id(), medication.id(), -1);
    let second = reminder(owner.id(), medication.id(), 1);
    let second_id = second.id();
    let mut harness = Harness::new(
        RecordingChannel::accepting(ChannelKind::Sms),
        RecordingChannel::accepting(ChannelKind::WeChat),
    );
    let mut calls = 0;
    let resolved = owner.clone();
    harness.users.expect_find_by_id().returning(move |_| {
        calls += 1;
        if calls == 1 {
            Err(UserPersistenceError::connection("pool exhausted"))
        } else {
            Ok(Some(resolved.clone()))
        }
    });
    harness
        .medications
        .expect_find_by_id()
        .returning(move |_| Ok(Some(medication.clone())));
    harness
        .reminders
        .expect_list_pending_between()
        .return_once(move |_, _, _| Ok(vec![first, second]));
    harness
        .reminders
        .expect_mark_sent()
        .withf(move |id, _| *id == second_id)
        .times(1)
        .return_once(|_, _| Ok(true));
    let dispatcher = harness.into_dispatcher();

    let outcome = dispatcher.dispatch_due().await.expect("scan succeeds");

    assert_eq!(outcome.candidates, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.sent, 1);
}

#[rstest]
#[tokio::test]
async fn failed_sent_mark_is_counted_and_scan_continues(owner: User) {
    let medication = medication(owner.id());
    let first = reminder(owner.id(), medication.id(), -1);
    let second = reminder(owner.id(), medication.id(), 2);
    let first_id = first.id();
    let second_id = second.id();
    let mut harness = Harness::new(
        RecordingChannel::accepting(ChannelKind::Sms),
        RecordingChannel::accepting(ChannelKind::WeChat),
    )
    .with_owner_and_medication(owner, medication);
    harness
        .reminders
        .expect_list_pending_between()
        .return_once(move |_, _, _| Ok(vec![first, second]));
    harness
        .reminders
        .expect_mark_sent()
        .withf(move |id, _| *id == first_id)
        .times(1)
        .return_once(|_, _| Err(ReminderRepositoryError::connection("pool exhausted")));
    harness
        .reminders
        .expect_mark_sent()
        .withf(move |id, _| *id == second_id)
        .times(1)
        .return_once(|_, _| Ok(true));
    let sms = harness.sms.clone();
    let dispatcher = harness.into_dispatcher();

    let outcome = dispatcher.dispatch_due().await.expect("scan completes");

    assert_eq!(outcome.candidates, 2);
    assert_eq!(outcome.sent, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(sms.sent().len(), 2);
}

#[rstest]
#[tokio::test]
async fn stale_reminders_are_marked_missed_first() {
    let mut reminders = MockReminderRepository::new();
    reminders
        .expect_mark_missed_before()
        .withf(|cutoff, at| *cutoff == now() - Duration::minutes(5) && *at == now())
        .times(1)
        .return_once(|_, _| Ok(3));
    reminders
        .expect_list_pending_between()
        .return_once(|_, _, _| Ok(Vec::new()));
    let dispatcher = ReminderDispatcher::new(
        ReminderDispatcherPorts {
            reminders: Arc::new(reminders),
            medications: Arc::new(MockMedicationRepository::new()),
            users: Arc::new(MockUserRepository::new()),
            channels: NotificationChannels::new(),
        },
        Arc::new(MutableClock::new(now())),
        ReminderDispatcherConfig::default(),
    );

    let outcome = dispatcher.dispatch_due().await.expect("scan succeeds");

    assert_eq!(outcome.missed, 3);
    assert_eq!(outcome.candidates, 0);
}

struct BlockingReminders {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl ReminderRepository for BlockingReminders {
    async fn save(&self, _: &Reminder) -> Result<(), ReminderRepositoryError> {
        Ok(())
    }
    async fn insert_all(&self, _: &[Reminder]) -> Result<(), ReminderRepositoryError> {
        Ok(())
    }
    async fn find_owned(
        &self,
        _: &UserId,
        _: crate::domain::ReminderId,
    ) -> Result<Option<Reminder>, ReminderRepositoryError> {
        Ok(None)
    }
    async fn list_by_owner(&self, _: &UserId) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        Ok(Vec::new())
    }
    async fn list_pending_between(
        &self,
        _: Option<UserId>,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        Ok(Vec::new())
    }
    async fn has_pending(
        &self,
        _: MedicationId,
        _: ReminderKind,
    ) -> Result<bool, ReminderRepositoryError> {
        Ok(false)
    }
    async fn delete_owned(
        &self,
        _: &UserId,
        _: crate::domain::ReminderId,
    ) -> Result<bool, ReminderRepositoryError> {
        Ok(false)
    }
    async fn delete_for_medication(&self, _: MedicationId) -> Result<u64, ReminderRepositoryError> {
        Ok(0)
    }
    async fn mark_sent(
        &self,
        _: crate::domain::ReminderId,
        _: DateTime<Utc>,
    ) -> Result<bool, ReminderRepositoryError> {
        Ok(false)
    }
    async fn mark_missed_before(
        &self,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
    ) -> Result<u64, ReminderRepositoryError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(0)
    }
}

#[tokio::test]
async fn concurrent_scan_is_refused() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let dispatcher = Arc::new(ReminderDispatcher::new(
        ReminderDispatcherPorts {
            reminders: Arc::new(BlockingReminders {
                entered: entered.clone(),
                release: release.clone(),
            }),
            medications: Arc::new(MockMedicationRepository::new()),
            users: Arc::new(MockUserRepository::new()),
            channels: NotificationChannels::new(),
        },
        Arc::new(MutableClock::new(now())),
        ReminderDispatcherConfig::default(),
    ));

    let running = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch_due().await }
    });
    entered.notified().await;

    let error = dispatcher.dispatch_due().await.expect_err("second scan refused");
    assert_eq!(error.code(), ErrorCode::Conflict);

    release.notify_one();
    let first = running.await.expect("task joins").expect("first scan succeeds");
    assert_eq!(first.candidates, 0);
}
