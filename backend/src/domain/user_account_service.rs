//! Account service: registration, login, profile and contact binding.
//!
//! Uniqueness of usernames and contact addresses is checked here before
//! writing; the persistence adapters still enforce it with unique indexes
//! and report races as
//! [`crate::domain::ports::UserPersistenceError::Duplicate`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    LoginService, NotificationChannels, ProfileUpdate, Registration, UserAccounts,
    UserRepository, VerificationCodeSource,
};
use crate::domain::{
    ChannelKind, ContactBinding, EmailAddress, Error, LoginCredentials, NotificationPreferences,
    PasswordDigest, PasswordError, PendingVerification, PhoneNumber, User, UserDraft, UserId,
    UserValidationError, Username, VerificationCode, WeChatOpenId, verification_code_message,
};

/// Port bundle required by the account service.
pub struct UserAccountPorts {
    /// User persistence.
    pub users: Arc<dyn UserRepository>,
    /// Transports; the SMS channel carries verification codes.
    pub channels: NotificationChannels,
    /// Verification code generator.
    pub codes: Arc<dyn VerificationCodeSource>,
}

/// Account service implementing [`UserAccounts`] and [`LoginService`].
#[derive(Clone)]
pub struct UserAccountService {
    users: Arc<dyn UserRepository>,
    channels: NotificationChannels,
    codes: Arc<dyn VerificationCodeSource>,
    clock: Arc<dyn Clock>,
}

fn invalid(err: UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn map_password_error(err: PasswordError) -> Error {
    match err {
        PasswordError::TooShort { .. } => Error::invalid_request(err.to_string()),
        PasswordError::Hashing { .. } => Error::internal(err.to_string()),
    }
}

impl UserAccountService {
    /// Build the service.
    pub fn new(ports: UserAccountPorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: ports.users,
            channels: ports.channels,
            codes: ports.codes,
            clock,
        }
    }

    async fn existing(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn ensure_username_free(
        &self,
        username: &Username,
        current: Option<&UserId>,
    ) -> Result<(), Error> {
        match self.users.find_by_username(username).await? {
            Some(other) if Some(other.id()) != current => Err(Error::conflict(format!(
                "username {} is already taken",
                username.as_ref()
            ))),
            _ => Ok(()),
        }
    }

    async fn ensure_contact_free(
        &self,
        channel: ChannelKind,
        address: &str,
        current: Option<&UserId>,
    ) -> Result<(), Error> {
        match self.users.find_by_contact(channel, address).await? {
            Some(other) if Some(other.id()) != current => Err(Error::conflict(format!(
                "this {channel} address is bound to another account"
            ))),
            _ => Ok(()),
        }
    }

    async fn send_code(&self, phone: &PhoneNumber, code: &VerificationCode) -> Result<(), Error> {
        let channel = self
            .channels
            .get(ChannelKind::Sms)
            .ok_or_else(|| Error::service_unavailable("SMS delivery is not configured"))?;
        channel
            .send(phone.as_ref(), &verification_code_message(code.as_ref()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserAccounts for UserAccountService {
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let username = Username::new(&registration.username).map_err(invalid)?;
        let phone = registration
            .phone
            .as_deref()
            .map(PhoneNumber::new)
            .transpose()
            .map_err(invalid)?;
        let wechat = registration
            .wechat_openid
            .as_deref()
            .map(WeChatOpenId::new)
            .transpose()
            .map_err(invalid)?;
        let email = registration
            .email
            .as_deref()
            .map(EmailAddress::new)
            .transpose()
            .map_err(invalid)?;

        self.ensure_username_free(&username, None).await?;
        if let Some(phone) = &phone {
            self.ensure_contact_free(ChannelKind::Sms, phone.as_ref(), None)
                .await?;
        }
        if let Some(openid) = &wechat {
            self.ensure_contact_free(ChannelKind::WeChat, openid.as_ref(), None)
                .await?;
        }
        if let Some(email) = &email {
            self.ensure_contact_free(ChannelKind::Email, email.as_ref(), None)
                .await?;
        }

        let password = PasswordDigest::hash(&registration.password).map_err(map_password_error)?;
        let user = User::from(UserDraft {
            id: UserId::random(),
            username,
            password,
            phone: phone.map(|address| ContactBinding {
                address,
                verified: false,
            }),
            wechat: wechat.map(|address| ContactBinding {
                address,
                verified: true,
            }),
            email: email.map(|address| ContactBinding {
                address,
                verified: true,
            }),
            preferences: NotificationPreferences::default(),
            pending_verification: None,
            created_at: self.clock.utc(),
        });
        self.users.upsert(&user).await?;
        info!(user = %user.id(), "registered user");
        Ok(user)
    }

    async fn profile(&self, user: &UserId) -> Result<User, Error> {
        self.existing(user).await
    }

    async fn update_profile(&self, user: &UserId, update: ProfileUpdate) -> Result<User, Error> {
        let mut current = self.existing(user).await?;
        if let Some(raw) = update.username.as_deref() {
            let username = Username::new(raw).map_err(invalid)?;
            self.ensure_username_free(&username, Some(user)).await?;
            current.rename(username);
        }
        if let Some(raw) = update.email.as_deref() {
            let email = EmailAddress::new(raw).map_err(invalid)?;
            self.ensure_contact_free(ChannelKind::Email, email.as_ref(), Some(user))
                .await?;
            current.bind_email(email);
        }
        self.users.upsert(&current).await?;
        Ok(current)
    }

    async fn delete_account(&self, user: &UserId) -> Result<(), Error> {
        if self.users.delete(user).await? {
            info!(%user, "deleted account");
            Ok(())
        } else {
            Err(Error::not_found(format!("user {user} not found")))
        }
    }

    async fn bind_phone(&self, user: &UserId, phone: &str) -> Result<User, Error> {
        let phone = PhoneNumber::new(phone).map_err(invalid)?;
        let mut current = self.existing(user).await?;
        self.ensure_contact_free(ChannelKind::Sms, phone.as_ref(), Some(user))
            .await?;

        let code = self.codes.generate();
        self.send_code(&phone, &code).await?;
        current.bind_phone(
            phone,
            PendingVerification {
                code,
                issued_at: self.clock.utc(),
            },
        );
        self.users.upsert(&current).await?;
        debug!(%user, "phone verification code issued");
        Ok(current)
    }

    async fn verify_phone(&self, user: &UserId, code: &str) -> Result<User, Error> {
        let code = VerificationCode::new(code)
            .ok_or_else(|| Error::invalid_request("verification code must be six digits"))?;
        let mut current = self.existing(user).await?;
        current
            .verify_phone(&code, self.clock.utc())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.users.upsert(&current).await?;
        Ok(current)
    }

    async fn bind_wechat(&self, user: &UserId, openid: &str) -> Result<User, Error> {
        let openid = WeChatOpenId::new(openid).map_err(invalid)?;
        let mut current = self.existing(user).await?;
        self.ensure_contact_free(ChannelKind::WeChat, openid.as_ref(), Some(user))
            .await?;
        current.bind_wechat(openid);
        self.users.upsert(&current).await?;
        Ok(current)
    }

    async fn bind_email(&self, user: &UserId, email: &str) -> Result<User, Error> {
        let email = EmailAddress::new(email).map_err(invalid)?;
        let mut current = self.existing(user).await?;
        self.ensure_contact_free(ChannelKind::Email, email.as_ref(), Some(user))
            .await?;
        current.bind_email(email);
        self.users.upsert(&current).await?;
        Ok(current)
    }

    async fn preferences(&self, user: &UserId) -> Result<NotificationPreferences, Error> {
        Ok(self.existing(user).await?.preferences())
    }

    async fn update_preferences(
        &self,
        user: &UserId,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, Error> {
        let mut current = self.existing(user).await?;
        current.set_preferences(preferences);
        self.users.upsert(&current).await?;
        Ok(current.preferences())
    }
}

#[async_trait]
impl LoginService for UserAccountService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let rejected = || Error::unauthorized("invalid username or password");
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(rejected());
        };
        let user = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or_else(rejected)?;
        if user.password().verify(credentials.password()) {
            Ok(user.id().clone())
        } else {
            Err(rejected())
        }
    }
}

#[cfg(test)]
#[path = "user_account_service_tests.rs"]
mod tests;
