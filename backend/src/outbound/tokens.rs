//! In-memory bearer token store.
//!
//! Tokens are 32 random bytes rendered as lowercase hex. Only their SHA-256
//! digest is kept, so a dump of the store cannot be replayed. Expired tokens
//! are dropped when they are next presented.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::ports::{TokenStore, TokenStoreError};
use crate::domain::{AccessToken, IssuedToken, UserId};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
struct TokenEntry {
    user: UserId,
    expires_at: DateTime<Utc>,
}

/// Token store holding digests in process memory.
pub struct InMemoryTokenStore {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, TokenEntry>>,
}

fn digest(token: &AccessToken) -> String {
    hex::encode(Sha256::digest(token.expose().as_bytes()))
}

impl InMemoryTokenStore {
    /// Tokens issued by this store live for `ttl`.
    pub fn new(ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every expired token. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.utc();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn issue(&self, user: &UserId) -> Result<IssuedToken, TokenStoreError> {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = AccessToken::new(hex::encode(bytes));
        let expires_at = self.clock.utc() + self.ttl;

        self.entries.lock().await.insert(
            digest(&token),
            TokenEntry {
                user: user.clone(),
                expires_at,
            },
        );
        debug!(%user, %expires_at, "issued access token");
        Ok(IssuedToken { token, expires_at })
    }

    async fn validate(&self, token: &AccessToken) -> Result<Option<UserId>, TokenStoreError> {
        let key = digest(token);
        let now = self.clock.utc();
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.user.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: &AccessToken) -> Result<bool, TokenStoreError> {
        Ok(self.entries.lock().await.remove(&digest(token)).is_some())
    }
}
