//! Notification transports implementing [`NotificationChannel`].
//!
//! The HTTP adapters speak a plain JSON contract to an SMS gateway, the
//! WeChat official-account API and an email relay. [`LoggingChannel`] stands
//! in for any channel whose credentials are not configured.
//!
//! [`NotificationChannel`]: crate::domain::ports::NotificationChannel

mod email;
mod logging;
mod sms;
mod wechat;

#[cfg(test)]
mod fake_provider;

pub use email::{EmailRelayChannel, EmailRelayConfig};
pub use logging::LoggingChannel;
pub use sms::{SmsGatewayChannel, SmsGatewayConfig};
pub use wechat::{WeChatChannel, WeChatConfig};

use reqwest::StatusCode;

use crate::domain::ports::NotificationError;

fn map_transport_error(error: reqwest::Error) -> NotificationError {
    NotificationError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> NotificationError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };
    if status.is_client_error() {
        NotificationError::rejected(message)
    } else {
        NotificationError::transport(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Send `request`, failing on transport errors and non-success statuses.
async fn send_checked(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, NotificationError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.map_err(map_transport_error)?;
    Err(map_status_error(status, body.as_ref()))
}
