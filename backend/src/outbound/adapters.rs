//! Selection of concrete adapters from [`Settings`].
//!
//! Shared by the HTTP server and the `reminder-jobs` binary so that both
//! talk to the same storage and the same notification transports.

use std::sync::Arc;

use mockable::Clock;
use reqwest::Url;
use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ChannelKind;
use crate::domain::ports::{
    DiseaseRepository, MedicationRepository, NotificationChannel, NotificationChannels,
    ReminderRepository, UserRepository,
};
use crate::outbound::knowledge::{JsonKnowledgeBase, KnowledgeLoadError};
use crate::outbound::memory::MemoryStore;
use crate::outbound::notification::{
    EmailRelayChannel, EmailRelayConfig, LoggingChannel, SmsGatewayChannel, SmsGatewayConfig,
    WeChatChannel, WeChatConfig,
};
use crate::outbound::persistence::{
    DbPool, DieselDiseaseRepository, DieselMedicationRepository, DieselReminderRepository,
    DieselUserRepository, MigrationError, PoolConfig, PoolError, run_migrations,
};
use crate::settings::Settings;

/// Failures while building adapters at startup.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Migrations could not be applied.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The knowledge base could not be loaded.
    #[error(transparent)]
    Knowledge(#[from] KnowledgeLoadError),
    /// A channel is enabled but a required key is unset.
    #[error("{channel} is enabled but {key} is not set")]
    MissingSetting {
        /// Channel being configured.
        channel: ChannelKind,
        /// Missing key.
        key: &'static str,
    },
    /// A configured URL does not parse.
    #[error("{key} is not a valid URL: {message}")]
    InvalidUrl {
        /// Offending key.
        key: &'static str,
        /// Parser message.
        message: String,
    },
    /// The HTTP client for a channel could not be built.
    #[error("failed to build {channel} client: {source}")]
    Client {
        /// Channel being configured.
        channel: ChannelKind,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// The four repositories, backed by PostgreSQL or by one shared
/// [`MemoryStore`].
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub medications: Arc<dyn MedicationRepository>,
    pub reminders: Arc<dyn ReminderRepository>,
    pub diseases: Arc<dyn DiseaseRepository>,
    /// Present when backed by PostgreSQL; the readiness check pings it.
    pub pool: Option<DbPool>,
}

impl Repositories {
    /// Repositories sharing `store`.
    pub fn in_memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.users()),
            medications: Arc::new(store.medications()),
            reminders: Arc::new(store.reminders()),
            diseases: Arc::new(store.diseases()),
            pool: None,
        }
    }

    /// Diesel repositories sharing `pool`.
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            medications: Arc::new(DieselMedicationRepository::new(pool.clone())),
            reminders: Arc::new(DieselReminderRepository::new(pool.clone())),
            diseases: Arc::new(DieselDiseaseRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Apply migrations and connect when `database_url` is set; otherwise
    /// start from an empty in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when migrations fail or the pool cannot be
    /// built.
    pub async fn connect(database_url: Option<&str>) -> Result<Self, AdapterError> {
        let Some(url) = database_url else {
            warn!("no database configured; data lives in process memory only");
            return Ok(Self::in_memory(&MemoryStore::new()));
        };
        run_migrations(url).await?;
        let pool = DbPool::new(PoolConfig::new(url)).await?;
        Ok(Self::postgres(pool))
    }
}

/// Load the configured knowledge base, or the bundled one.
///
/// # Errors
///
/// Returns [`AdapterError::Knowledge`] when the document cannot be read or
/// parsed.
pub fn knowledge_base(settings: &Settings) -> Result<JsonKnowledgeBase, AdapterError> {
    let knowledge = match &settings.knowledge_base_path {
        Some(path) => JsonKnowledgeBase::from_path(path)?,
        None => JsonKnowledgeBase::bundled()?,
    };
    info!(
        medications = knowledge.medication_count(),
        "knowledge base loaded"
    );
    Ok(knowledge)
}

fn required<'a>(
    value: &'a Option<String>,
    channel: ChannelKind,
    key: &'static str,
) -> Result<&'a str, AdapterError> {
    value
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .ok_or(AdapterError::MissingSetting { channel, key })
}

fn url(raw: &str, key: &'static str) -> Result<Url, AdapterError> {
    Url::parse(raw).map_err(|err| AdapterError::InvalidUrl {
        key,
        message: err.to_string(),
    })
}

fn sms_channel(settings: &Settings) -> Result<Arc<dyn NotificationChannel>, AdapterError> {
    let kind = ChannelKind::Sms;
    let config = SmsGatewayConfig {
        endpoint: url(required(&settings.sms_endpoint, kind, "sms_endpoint")?, "sms_endpoint")?,
        api_key: Zeroizing::new(required(&settings.sms_api_key, kind, "sms_api_key")?.to_owned()),
        timeout: settings.provider_timeout(),
    };
    let channel = SmsGatewayChannel::new(config)
        .map_err(|source| AdapterError::Client { channel: kind, source })?;
    Ok(Arc::new(channel))
}

fn wechat_channel(
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn NotificationChannel>, AdapterError> {
    let kind = ChannelKind::WeChat;
    let config = WeChatConfig {
        api_base: url(settings.wechat_api_base(), "wechat_api_base")?,
        app_id: required(&settings.wechat_app_id, kind, "wechat_app_id")?.to_owned(),
        app_secret: Zeroizing::new(
            required(&settings.wechat_app_secret, kind, "wechat_app_secret")?.to_owned(),
        ),
        timeout: settings.provider_timeout(),
    };
    let channel = WeChatChannel::new(config, clock)
        .map_err(|source| AdapterError::Client { channel: kind, source })?;
    Ok(Arc::new(channel))
}

fn email_channel(settings: &Settings) -> Result<Arc<dyn NotificationChannel>, AdapterError> {
    let kind = ChannelKind::Email;
    let config = EmailRelayConfig {
        endpoint: url(
            required(&settings.email_endpoint, kind, "email_endpoint")?,
            "email_endpoint",
        )?,
        api_key: Zeroizing::new(
            required(&settings.email_api_key, kind, "email_api_key")?.to_owned(),
        ),
        sender: required(&settings.email_sender, kind, "email_sender")?.to_owned(),
        timeout: settings.provider_timeout(),
    };
    let channel = EmailRelayChannel::new(config)
        .map_err(|source| AdapterError::Client { channel: kind, source })?;
    Ok(Arc::new(channel))
}

fn enabled_or_logging(
    enabled: bool,
    kind: ChannelKind,
    build: impl FnOnce() -> Result<Arc<dyn NotificationChannel>, AdapterError>,
) -> Result<Arc<dyn NotificationChannel>, AdapterError> {
    if !enabled {
        return Ok(Arc::new(LoggingChannel::new(kind)));
    }
    info!(channel = %kind, "notification channel enabled");
    build()
}

/// Build every channel: the real transport when enabled, otherwise a
/// [`LoggingChannel`].
///
/// # Errors
///
/// Returns [`AdapterError`] when an enabled channel lacks a required key or
/// its client cannot be built.
pub fn notification_channels(
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Result<NotificationChannels, AdapterError> {
    let sms = enabled_or_logging(settings.sms_enabled, ChannelKind::Sms, || {
        sms_channel(settings)
    })?;
    let wechat = enabled_or_logging(settings.wechat_enabled, ChannelKind::WeChat, || {
        wechat_channel(settings, clock)
    })?;
    let email = enabled_or_logging(settings.email_enabled, ChannelKind::Email, || {
        email_channel(settings)
    })?;
    Ok(NotificationChannels::new()
        .with(sms)
        .with(wechat)
        .with(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn settings() -> Settings {
        Settings {
            host: None,
            port: None,
            database_url: None,
            expiry_reminder_days: None,
            token_ttl_hours: None,
            dispatch_interval_seconds: None,
            dispatch_window_minutes: None,
            knowledge_base_path: None,
            provider_timeout_seconds: None,
            sms_enabled: false,
            sms_endpoint: None,
            sms_api_key: None,
            wechat_enabled: false,
            wechat_app_id: None,
            wechat_app_secret: None,
            wechat_api_base: None,
            email_enabled: false,
            email_endpoint: None,
            email_api_key: None,
            email_sender: None,
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time"),
        ))
    }

    #[rstest]
    fn disabled_channels_fall_back_to_logging() {
        let channels = notification_channels(&settings(), clock()).expect("channels");
        for kind in [ChannelKind::Sms, ChannelKind::WeChat, ChannelKind::Email] {
            assert_eq!(channels.get(kind).map(|channel| channel.kind()), Some(kind));
        }
    }

    #[rstest]
    fn enabled_channel_requires_credentials() {
        let mut settings = settings();
        settings.sms_enabled = true;
        settings.sms_endpoint = Some("https://sms.example.test/send".into());

        let error = notification_channels(&settings, clock()).expect_err("missing key");
        assert!(matches!(
            error,
            AdapterError::MissingSetting {
                channel: ChannelKind::Sms,
                key: "sms_api_key"
            }
        ));
    }

    #[rstest]
    fn enabled_channel_rejects_malformed_urls() {
        let mut settings = settings();
        settings.email_enabled = true;
        settings.email_endpoint = Some("not a url".into());
        settings.email_api_key = Some("secret".into());
        settings.email_sender = Some("reminders@example.test".into());

        let error = notification_channels(&settings, clock()).expect_err("bad url");
        assert!(matches!(
            error,
            AdapterError::InvalidUrl {
                key: "email_endpoint",
                ..
            }
        ));
    }

    #[rstest]
    fn configured_wechat_channel_builds() {
        let mut settings = settings();
        settings.wechat_enabled = true;
        settings.wechat_app_id = Some("wx123".into());
        settings.wechat_app_secret = Some("secret".into());

        let channels = notification_channels(&settings, clock()).expect("channels");
        assert!(channels.get(ChannelKind::WeChat).is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn missing_database_url_uses_memory() {
        let repositories = Repositories::connect(None).await.expect("memory store");
        assert!(repositories.pool.is_none());
    }

    #[rstest]
    fn bundled_knowledge_base_loads_without_a_path() {
        let knowledge = knowledge_base(&settings()).expect("bundled data");
        assert!(knowledge.medication_count() > 0);
    }
}
