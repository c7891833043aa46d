//! WeChat official-account transport.
//!
//! The API requires an access token obtained with the app id and secret.
//! Tokens are cached until `expires_in` (7200 s by default) less a 300 s
//! margin, and refreshed under the cache lock so concurrent sends share one
//! fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{map_transport_error, send_checked};
use crate::domain::ChannelKind;
use crate::domain::ports::{NotificationChannel, NotificationError};

/// Default lifetime when the token response omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7200;
/// Refresh this long before the provider expires the token.
const REFRESH_MARGIN_SECONDS: i64 = 300;
/// Error codes meaning the cached token is no longer accepted.
const STALE_TOKEN_CODES: [i64; 2] = [40001, 42001];

/// Credentials and endpoint for the WeChat API.
#[derive(Clone)]
pub struct WeChatConfig {
    /// API base, e.g. `https://api.weixin.qq.com/cgi-bin`.
    pub api_base: Url,
    /// Official-account app id.
    pub app_id: String,
    /// Official-account app secret.
    pub app_secret: Zeroizing<String>,
    /// Request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    #[serde(default)]
    errcode: i64,
    errmsg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    errcode: i64,
    errmsg: Option<String>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CustomMessage<'a> {
    touser: &'a str,
    msgtype: &'static str,
    text: TextBody<'a>,
}

struct CachedToken {
    value: Zeroizing<String>,
    refresh_at: DateTime<Utc>,
}

/// Sends customer-service text messages to WeChat openids.
pub struct WeChatChannel {
    client: Client,
    api_base: String,
    app_id: String,
    app_secret: Zeroizing<String>,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<CachedToken>>,
}

fn provider_error(errcode: i64, errmsg: Option<String>) -> NotificationError {
    NotificationError::rejected(format!(
        "errcode {errcode}: {}",
        errmsg.unwrap_or_else(|| "no message".to_owned())
    ))
}

impl WeChatChannel {
    /// Build the channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: WeChatConfig, clock: Arc<dyn Clock>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.as_str().trim_end_matches('/').to_owned(),
            app_id: config.app_id,
            app_secret: config.app_secret,
            clock,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<Zeroizing<String>, NotificationError> {
        let mut cached = self.token.lock().await;
        let now = self.clock.utc();
        if let Some(token) = cached.as_ref().filter(|token| token.refresh_at > now) {
            return Ok(token.value.clone());
        }

        let response = send_checked(self.client.get(format!("{}/token", self.api_base)).query(&[
            ("grant_type", "client_credential"),
            ("appid", self.app_id.as_str()),
            ("secret", self.app_secret.as_str()),
        ]))
        .await?;
        let body: TokenResponse = response.json().await.map_err(map_transport_error)?;
        let Some(value) = body.access_token.filter(|_| body.errcode == 0) else {
            return Err(provider_error(body.errcode, body.errmsg));
        };
        let ttl = body.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);
        let refresh_at = now + TimeDelta::seconds(ttl - REFRESH_MARGIN_SECONDS);
        debug!(%refresh_at, "refreshed WeChat access token");

        let value = Zeroizing::new(value);
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at,
        });
        Ok(value)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl NotificationChannel for WeChatChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WeChat
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        let token = self.access_token().await?;
        let response = send_checked(
            self.client
                .post(format!("{}/message/custom/send", self.api_base))
                .query(&[("access_token", token.as_str())])
                .json(&CustomMessage {
                    touser: recipient,
                    msgtype: "text",
                    text: TextBody { content: message },
                }),
        )
        .await?;
        let body: SendResponse = response.json().await.map_err(map_transport_error)?;
        if body.errcode == 0 {
            return Ok(());
        }
        if STALE_TOKEN_CODES.contains(&body.errcode) {
            warn!(errcode = body.errcode, "WeChat rejected the cached access token");
            self.forget_token().await;
        }
        Err(provider_error(body.errcode, body.errmsg))
    }
}
