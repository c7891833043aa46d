//! User aggregate: identity, contact channels and notification preferences.
//!
//! Users own medications and reminders. Contact channels carry their own
//! verification state; a channel is only used for delivery once it is bound,
//! verified and enabled in the user's preferences.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::auth::PasswordDigest;
use super::notification::ChannelKind;

/// Validation errors raised by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Username length out of range.
    #[error("username must be between {min} and {max} characters")]
    UsernameLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },
    /// Username contains unsupported characters.
    #[error("username may only contain letters, digits, '_', '-' or '.'")]
    UsernameCharacters,
    /// Phone number is malformed.
    #[error("phone number must contain 6 to 20 digits with an optional leading '+'")]
    InvalidPhoneNumber,
    /// WeChat openid is malformed.
    #[error("wechat openid must be 1 to 100 characters without whitespace")]
    InvalidWeChatOpenId,
    /// Email address is malformed.
    #[error("email address is invalid")]
    InvalidEmail,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        let parsed = Uuid::parse_str(raw).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, raw.to_owned()))
    }

    /// Wrap an existing UUID, typically read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Minimum allowed username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed username length.
pub const USERNAME_MAX: usize = 50;

/// Unique login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate and construct a username. Surrounding whitespace is trimmed.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = value.as_ref().trim();
        let length = trimmed.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
            return Err(UserValidationError::UsernameLength {
                min: USERNAME_MIN,
                max: USERNAME_MAX,
            });
        }
        let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.');
        if !trimmed.chars().all(allowed) {
            return Err(UserValidationError::UsernameCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phone number used for SMS delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a phone number: optional leading `+`, then 6–20 digits.
    /// Spaces and dashes are stripped first.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let compact: String = value
            .as_ref()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        let valid = (6..=20).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(UserValidationError::InvalidPhoneNumber);
        }
        Ok(Self(compact))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// WeChat openid used for messaging-app delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeChatOpenId(String);

impl WeChatOpenId {
    /// Validate an openid: 1–100 characters, no whitespace.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = value.as_ref().trim();
        let length = raw.chars().count();
        if !(1..=100).contains(&length) || raw.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidWeChatOpenId);
        }
        Ok(Self(raw.to_owned()))
    }
}

impl AsRef<str> for WeChatOpenId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Email address used for email delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate an address with a single `@`, a non-empty local part and a
    /// dotted domain. Addresses are stored lower-cased.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = value.as_ref().trim();
        if raw.len() > 254 || raw.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        let Some((local, domain)) = raw.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(raw.to_lowercase()))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Per-channel opt-in flags. All channels are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPreferences {
    /// Receive reminders by SMS.
    pub sms: bool,
    /// Receive reminders through WeChat.
    pub wechat: bool,
    /// Receive reminders by email.
    pub email: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            sms: true,
            wechat: true,
            email: true,
        }
    }
}

/// How long an issued phone verification code stays valid.
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 5;

/// Six-digit phone verification code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Validate a code made of exactly six ASCII digits.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let raw = value.as_ref().trim();
        (raw.len() == 6 && raw.chars().all(|c| c.is_ascii_digit())).then(|| Self(raw.to_owned()))
    }

    /// Zero-pad `value` (modulo one million) into a code.
    pub fn from_digits(value: u32) -> Self {
        Self(format!("{:06}", value % 1_000_000))
    }
}

impl AsRef<str> for VerificationCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Outstanding phone verification challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    /// Code sent to the phone.
    pub code: VerificationCode,
    /// When the code was issued.
    pub issued_at: DateTime<Utc>,
}

impl PendingVerification {
    /// Whether the code can still be redeemed at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.issued_at
            && now - self.issued_at <= Duration::minutes(VERIFICATION_CODE_TTL_MINUTES)
    }
}

/// Reasons a phone verification attempt is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhoneVerificationError {
    /// No phone number has been bound.
    #[error("no phone number is bound")]
    NoPhoneBound,
    /// No code has been issued, or it was already used.
    #[error("no verification code is pending")]
    NoPendingCode,
    /// The code expired.
    #[error("verification code has expired")]
    Expired,
    /// The code does not match.
    #[error("verification code does not match")]
    Mismatch,
}

/// A contact channel bound to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactBinding<T> {
    /// Channel address.
    pub address: T,
    /// Whether ownership of the address has been verified.
    pub verified: bool,
}

/// Input for building a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    /// Identifier.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Stored password digest.
    pub password: PasswordDigest,
    /// Phone binding.
    pub phone: Option<ContactBinding<PhoneNumber>>,
    /// WeChat binding.
    pub wechat: Option<ContactBinding<WeChatOpenId>>,
    /// Email binding.
    pub email: Option<ContactBinding<EmailAddress>>,
    /// Channel preferences.
    pub preferences: NotificationPreferences,
    /// Outstanding phone challenge.
    pub pending_verification: Option<PendingVerification>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Application user.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    username: Username,
    password: PasswordDigest,
    phone: Option<ContactBinding<PhoneNumber>>,
    wechat: Option<ContactBinding<WeChatOpenId>>,
    email: Option<ContactBinding<EmailAddress>>,
    preferences: NotificationPreferences,
    pending_verification: Option<PendingVerification>,
    created_at: DateTime<Utc>,
}

impl From<UserDraft> for User {
    fn from(draft: UserDraft) -> Self {
        let UserDraft {
            id,
            username,
            password,
            phone,
            wechat,
            email,
            preferences,
            pending_verification,
            created_at,
        } = draft;
        Self {
            id,
            username,
            password,
            phone,
            wechat,
            email,
            preferences,
            pending_verification,
            created_at,
        }
    }
}

impl User {
    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Stored password digest.
    pub fn password(&self) -> &PasswordDigest {
        &self.password
    }

    /// Phone binding, if any.
    pub fn phone(&self) -> Option<&ContactBinding<PhoneNumber>> {
        self.phone.as_ref()
    }

    /// WeChat binding, if any.
    pub fn wechat(&self) -> Option<&ContactBinding<WeChatOpenId>> {
        self.wechat.as_ref()
    }

    /// Email binding, if any.
    pub fn email(&self) -> Option<&ContactBinding<EmailAddress>> {
        self.email.as_ref()
    }

    /// Channel preferences.
    pub fn preferences(&self) -> NotificationPreferences {
        self.preferences
    }

    /// Outstanding phone challenge.
    pub fn pending_verification(&self) -> Option<&PendingVerification> {
        self.pending_verification.as_ref()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Replace the login name.
    pub fn rename(&mut self, username: Username) {
        self.username = username;
    }

    /// Replace the channel preferences.
    pub fn set_preferences(&mut self, preferences: NotificationPreferences) {
        self.preferences = preferences;
    }

    /// Bind a phone number and start a verification challenge.
    ///
    /// The phone stays unverified until [`User::verify_phone`] succeeds.
    pub fn bind_phone(&mut self, phone: PhoneNumber, challenge: PendingVerification) {
        self.phone = Some(ContactBinding {
            address: phone,
            verified: false,
        });
        self.pending_verification = Some(challenge);
    }

    /// Redeem a verification code for the bound phone.
    pub fn verify_phone(
        &mut self,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> Result<(), PhoneVerificationError> {
        let Some(phone) = self.phone.as_mut() else {
            return Err(PhoneVerificationError::NoPhoneBound);
        };
        let Some(pending) = self.pending_verification.as_ref() else {
            return Err(PhoneVerificationError::NoPendingCode);
        };
        if !pending.is_valid_at(now) {
            return Err(PhoneVerificationError::Expired);
        }
        if pending.code != *code {
            return Err(PhoneVerificationError::Mismatch);
        }
        phone.verified = true;
        self.pending_verification = None;
        Ok(())
    }

    /// Bind a WeChat account. Binding through the WeChat OAuth flow proves
    /// ownership, so the binding is verified immediately.
    pub fn bind_wechat(&mut self, openid: WeChatOpenId) {
        self.wechat = Some(ContactBinding {
            address: openid,
            verified: true,
        });
    }

    /// Bind an email address, verified on binding.
    pub fn bind_email(&mut self, email: EmailAddress) {
        self.email = Some(ContactBinding {
            address: email,
            verified: true,
        });
    }

    /// Channels eligible for delivery with the address to use for each.
    ///
    /// A channel qualifies when it is enabled in the preferences, bound and
    /// verified. Order is stable: SMS, WeChat, email.
    pub fn delivery_targets(&self) -> Vec<(ChannelKind, String)> {
        fn eligible<T: AsRef<str>>(
            enabled: bool,
            binding: Option<&ContactBinding<T>>,
        ) -> Option<String> {
            binding
                .filter(|binding| enabled && binding.verified)
                .map(|binding| binding.address.as_ref().to_owned())
        }

        [
            (ChannelKind::Sms, eligible(self.preferences.sms, self.phone.as_ref())),
            (
                ChannelKind::WeChat,
                eligible(self.preferences.wechat, self.wechat.as_ref()),
            ),
            (
                ChannelKind::Email,
                eligible(self.preferences.email, self.email.as_ref()),
            ),
        ]
        .into_iter()
        .filter_map(|(kind, address)| address.map(|address| (kind, address)))
        .collect()
    }
}

#[cfg(test)]
mod tests;
