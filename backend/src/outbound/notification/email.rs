//! Email relay transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use super::send_checked;
use crate::domain::ChannelKind;
use crate::domain::ports::{NotificationChannel, NotificationError};

const SUBJECT: &str = "Medication reminder";

/// Connection details for the email relay.
#[derive(Clone)]
pub struct EmailRelayConfig {
    /// Endpoint receiving `POST {"from", "to", "subject", "text"}`.
    pub endpoint: Url,
    /// Bearer key sent in the `Authorization` header.
    pub api_key: Zeroizing<String>,
    /// Sender address.
    pub sender: String,
    /// Request timeout.
    pub timeout: Duration,
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends plain-text email through an HTTP relay.
pub struct EmailRelayChannel {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    sender: String,
}

impl EmailRelayChannel {
    /// Build the channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: EmailRelayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
            sender: config.sender,
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailRelayChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        send_checked(
            self.client
                .post(self.endpoint.clone())
                .bearer_auth(self.api_key.as_str())
                .json(&EmailPayload {
                    from: &self.sender,
                    to: recipient,
                    subject: SUBJECT,
                    text: message,
                }),
        )
        .await?;
        debug!(channel = "email", "message accepted by relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake_provider::FakeProvider;
    use super::*;
    use actix_web::http::StatusCode;
    use serde_json::json;

    #[actix_web::test]
    async fn posts_plain_text_mail() {
        let provider = FakeProvider::start([("/mail", StatusCode::ACCEPTED, json!({}))]);
        let channel = EmailRelayChannel::new(EmailRelayConfig {
            endpoint: Url::parse(&format!("{}/mail", provider.base_url)).expect("url"),
            api_key: Zeroizing::new("relay-key".to_owned()),
            sender: "reminders@medminder.invalid".to_owned(),
            timeout: Duration::from_secs(5),
        })
        .expect("client");

        channel
            .send("alice@example.com", "Your aspirin expires soon")
            .await
            .expect("sent");

        let captured = provider.captured();
        assert_eq!(
            captured[0].body,
            json!({
                "from": "reminders@medminder.invalid",
                "to": "alice@example.com",
                "subject": "Medication reminder",
                "text": "Your aspirin expires soon"
            })
        );
        provider.stop().await;
    }

    #[actix_web::test]
    async fn unreachable_relays_are_transport_errors() {
        let channel = EmailRelayChannel::new(EmailRelayConfig {
            endpoint: Url::parse("http://127.0.0.1:9/mail").expect("url"),
            api_key: Zeroizing::new("relay-key".to_owned()),
            sender: "reminders@medminder.invalid".to_owned(),
            timeout: Duration::from_secs(2),
        })
        .expect("client");

        let error = channel
            .send("alice@example.com", "hello")
            .await
            .expect_err("unreachable");
        assert!(matches!(error, NotificationError::Transport { .. }));
    }
}
