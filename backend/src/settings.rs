//! Service configuration loaded via OrthoConfig.
//!
//! Every key may come from the command line (`--port 9000`) or the
//! environment (`MEDMINDER_PORT=9000`). Unset keys fall back to the accessor
//! defaults below.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_EXPIRY_WINDOW_DAYS;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_TTL_HOURS: u32 = 24;
const DEFAULT_DISPATCH_WINDOW_MINUTES: u32 = 5;
const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_WECHAT_API_BASE: &str = "https://api.weixin.qq.com/cgi-bin";

/// Runtime settings for the HTTP service and the reminder jobs.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MEDMINDER")]
pub struct Settings {
    /// Interface to bind.
    pub host: Option<IpAddr>,
    /// Port to bind.
    pub port: Option<u16>,
    /// PostgreSQL URL; the in-memory adapters are used when unset.
    pub database_url: Option<String>,
    /// Days before expiry at which a medication counts as near expiry.
    pub expiry_reminder_days: Option<u32>,
    /// Lifetime of issued access tokens.
    pub token_ttl_hours: Option<u32>,
    /// Run a dispatch scan in-process at this interval.
    pub dispatch_interval_seconds: Option<u64>,
    /// Half-width of the dispatch window around "now".
    pub dispatch_window_minutes: Option<u32>,
    /// JSON knowledge base replacing the bundled dataset.
    pub knowledge_base_path: Option<PathBuf>,
    /// Timeout for calls to notification providers.
    pub provider_timeout_seconds: Option<u64>,

    /// Deliver SMS through the configured gateway.
    #[ortho_config(default = false)]
    pub sms_enabled: bool,
    pub sms_endpoint: Option<String>,
    pub sms_api_key: Option<String>,

    /// Deliver WeChat messages through the official-account API.
    #[ortho_config(default = false)]
    pub wechat_enabled: bool,
    pub wechat_app_id: Option<String>,
    pub wechat_app_secret: Option<String>,
    pub wechat_api_base: Option<String>,

    /// Deliver email through the configured relay.
    #[ortho_config(default = false)]
    pub email_enabled: bool,
    pub email_endpoint: Option<String>,
    pub email_api_key: Option<String>,
    pub email_sender: Option<String>,
}

impl Settings {
    /// Socket address to bind, defaulting to `0.0.0.0:8000`.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Near-expiry window in days.
    pub fn expiry_reminder_days(&self) -> u32 {
        self.expiry_reminder_days
            .unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS)
    }

    /// Token lifetime.
    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(
            self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
        ))
    }

    /// Interval of the in-process dispatch loop, if enabled. Zero disables
    /// the loop.
    pub fn dispatch_interval(&self) -> Option<Duration> {
        self.dispatch_interval_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    /// Dispatch window half-width.
    pub fn dispatch_window(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(
            self.dispatch_window_minutes
                .unwrap_or(DEFAULT_DISPATCH_WINDOW_MINUTES),
        ))
    }

    /// Timeout applied to every provider request.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(
            self.provider_timeout_seconds
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECONDS),
        )
    }

    /// WeChat API base URL.
    pub fn wechat_api_base(&self) -> &str {
        self.wechat_api_base
            .as_deref()
            .unwrap_or(DEFAULT_WECHAT_API_BASE)
    }
}
