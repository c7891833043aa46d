//! Port for outbound notification transports.
//!
//! The dispatcher only needs to know whether a send succeeded. Transports
//! report failures through [`NotificationError`]; callers treat any error as
//! "not delivered".

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ChannelKind;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification transports.
    pub enum NotificationError {
        /// The provider could not be reached.
        Transport { message: String } =>
            "notification transport failed: {message}" as service_unavailable,
        /// The provider answered but refused the message.
        Rejected { message: String } =>
            "notification rejected by provider: {message}" as service_unavailable,
        /// The channel is missing credentials or endpoints.
        Configuration { message: String } =>
            "notification channel misconfigured: {message}" as internal,
    }
}

/// A transport able to deliver a text message to one recipient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel this transport serves.
    fn kind(&self) -> ChannelKind;

    /// Deliver `message` to `recipient` (phone number, openid or email
    /// address, depending on the channel).
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError>;
}

/// Registry resolving the transport for each channel kind.
#[derive(Clone, Default)]
pub struct NotificationChannels {
    channels: BTreeMap<ChannelKind, Arc<dyn NotificationChannel>>,
}

impl NotificationChannels {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport under its own kind, replacing any previous one.
    pub fn with(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.insert(channel.kind(), channel);
        self
    }

    /// Transport for `kind`, if one is registered.
    pub fn get(&self, kind: ChannelKind) -> Option<&Arc<dyn NotificationChannel>> {
        self.channels.get(&kind)
    }

    /// Registered kinds in delivery order.
    pub fn kinds(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        self.channels.keys().copied()
    }
}

impl std::fmt::Debug for NotificationChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn channel(kind: ChannelKind) -> Arc<dyn NotificationChannel> {
        let mut mock = MockNotificationChannel::new();
        mock.expect_kind().return_const(kind);
        Arc::new(mock)
    }

    #[rstest]
    fn registry_resolves_registered_kinds() {
        let registry = NotificationChannels::new()
            .with(channel(ChannelKind::Email))
            .with(channel(ChannelKind::Sms));

        assert!(registry.get(ChannelKind::Sms).is_some());
        assert!(registry.get(ChannelKind::WeChat).is_none());
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec![ChannelKind::Sms, ChannelKind::Email]
        );
    }
}
