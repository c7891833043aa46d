//! Driving port for account management and contact-channel binding.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{Error, NotificationPreferences, User, UserId};

/// Input for creating an account. Contact fields are optional and validated
/// by the service.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Requested login name.
    pub username: String,
    /// Plain-text password, wiped on drop.
    pub password: Zeroizing<String>,
    /// Phone number, stored unverified.
    pub phone: Option<String>,
    /// WeChat openid.
    pub wechat_openid: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

/// Profile fields a user may change directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
}

/// Account use-cases exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Create an account.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Fetch the caller's profile.
    async fn profile(&self, user: &UserId) -> Result<User, Error>;

    /// Change username and/or email.
    async fn update_profile(&self, user: &UserId, update: ProfileUpdate) -> Result<User, Error>;

    /// Delete the account with its medications and reminders.
    async fn delete_account(&self, user: &UserId) -> Result<(), Error>;

    /// Bind a phone number and text it a verification code.
    async fn bind_phone(&self, user: &UserId, phone: &str) -> Result<User, Error>;

    /// Redeem a phone verification code.
    async fn verify_phone(&self, user: &UserId, code: &str) -> Result<User, Error>;

    /// Bind a WeChat openid.
    async fn bind_wechat(&self, user: &UserId, openid: &str) -> Result<User, Error>;

    /// Bind an email address.
    async fn bind_email(&self, user: &UserId, email: &str) -> Result<User, Error>;

    /// Current channel preferences.
    async fn preferences(&self, user: &UserId) -> Result<NotificationPreferences, Error>;

    /// Replace the channel preferences.
    async fn update_preferences(
        &self,
        user: &UserId,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, Error>;
}
