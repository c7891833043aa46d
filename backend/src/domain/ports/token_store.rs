//! Port for issuing and validating bearer tokens.

use async_trait::async_trait;

use crate::domain::{AccessToken, IssuedToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token store adapters.
    pub enum TokenStoreError {
        /// The backing store is unreachable.
        Unavailable { message: String } => "token store unavailable: {message}" as service_unavailable,
    }
}

/// Narrow token interface handed to the HTTP layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Issue a fresh token for `user`.
    async fn issue(&self, user: &UserId) -> Result<IssuedToken, TokenStoreError>;

    /// Resolve a token to its user. Expired or unknown tokens yield `None`.
    async fn validate(&self, token: &AccessToken) -> Result<Option<UserId>, TokenStoreError>;

    /// Revoke a token. Returns whether the token was known.
    async fn revoke(&self, token: &AccessToken) -> Result<bool, TokenStoreError>;
}
