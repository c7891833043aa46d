//! Transport that only logs, used when a channel has no credentials.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ChannelKind;
use crate::domain::ports::{NotificationChannel, NotificationError};

/// Accepts every message and records it in the log.
#[derive(Debug, Clone, Copy)]
pub struct LoggingChannel {
    kind: ChannelKind,
}

impl LoggingChannel {
    /// Stand in for `kind`.
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl NotificationChannel for LoggingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        info!(channel = %self.kind, recipient, message, "notification logged instead of sent");
        Ok(())
    }
}
