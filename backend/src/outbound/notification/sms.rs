//! SMS gateway transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use super::send_checked;
use crate::domain::ChannelKind;
use crate::domain::ports::{NotificationChannel, NotificationError};

/// Connection details for the SMS gateway.
#[derive(Clone)]
pub struct SmsGatewayConfig {
    /// Endpoint receiving `POST {"phone", "content"}`.
    pub endpoint: Url,
    /// Bearer key sent in the `Authorization` header.
    pub api_key: Zeroizing<String>,
    /// Request timeout.
    pub timeout: Duration,
}

#[derive(Serialize)]
struct SmsPayload<'a> {
    phone: &'a str,
    content: &'a str,
}

/// Sends text messages through an HTTP SMS gateway.
pub struct SmsGatewayChannel {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl SmsGatewayChannel {
    /// Build the channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: SmsGatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl NotificationChannel for SmsGatewayChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        send_checked(
            self.client
                .post(self.endpoint.clone())
                .bearer_auth(self.api_key.as_str())
                .json(&SmsPayload {
                    phone: recipient,
                    content: message,
                }),
        )
        .await?;
        debug!(channel = "sms", "message accepted by gateway");
        Ok(())
    }
}
