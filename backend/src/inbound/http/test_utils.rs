//! Test helpers for inbound HTTP components.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::{
    MockDiseaseCatalogue, MockLoginService, MockMedicationManagement, MockReminderManagement,
    MockUserAccounts, TokenStore, TokenStoreError,
};
use crate::domain::{AccessToken, IssuedToken, UserId};

use super::state::HttpState;

/// Fixed instant used by handler tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn token_value(user: &UserId) -> String {
    format!("token-{user}")
}

/// `Authorization` header accepted for `user` by [`TestPorts::signed_in`].
pub fn token_for(user: &UserId) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {}", token_value(user)))
}

/// Token store that knows a fixed set of tokens and issues predictable ones.
#[derive(Default)]
pub struct StaticTokenStore {
    known: HashMap<String, UserId>,
}

impl StaticTokenStore {
    fn knowing(user: &UserId) -> Self {
        Self {
            known: HashMap::from([(token_value(user), user.clone())]),
        }
    }
}

#[async_trait]
impl TokenStore for StaticTokenStore {
    async fn issue(&self, user: &UserId) -> Result<IssuedToken, TokenStoreError> {
        Ok(IssuedToken {
            token: AccessToken::new(token_value(user)),
            expires_at: fixed_now() + chrono::TimeDelta::hours(24),
        })
    }

    async fn validate(&self, token: &AccessToken) -> Result<Option<UserId>, TokenStoreError> {
        Ok(self.known.get(token.expose()).cloned())
    }

    async fn revoke(&self, token: &AccessToken) -> Result<bool, TokenStoreError> {
        Ok(self.known.contains_key(token.expose()))
    }
}

/// Mocked driving ports; set expectations, then call [`TestPorts::into_state`].
pub struct TestPorts {
    pub login: MockLoginService,
    pub tokens: StaticTokenStore,
    pub accounts: MockUserAccounts,
    pub medications: MockMedicationManagement,
    pub reminders: MockReminderManagement,
    pub diseases: MockDiseaseCatalogue,
}

impl TestPorts {
    /// Ports with no expectations and no known tokens.
    pub fn anonymous() -> Self {
        Self {
            login: MockLoginService::new(),
            tokens: StaticTokenStore::default(),
            accounts: MockUserAccounts::new(),
            medications: MockMedicationManagement::new(),
            reminders: MockReminderManagement::new(),
            diseases: MockDiseaseCatalogue::new(),
        }
    }

    /// Ports whose token store accepts [`token_for`]`(user)`.
    pub fn signed_in(user: &UserId) -> Self {
        Self {
            tokens: StaticTokenStore::knowing(user),
            ..Self::anonymous()
        }
    }

    /// Freeze the mocks into handler state.
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            login: Arc::new(self.login),
            tokens: Arc::new(self.tokens),
            accounts: Arc::new(self.accounts),
            medications: Arc::new(self.medications),
            reminders: Arc::new(self.reminders),
            diseases: Arc::new(self.diseases),
        })
    }
}
