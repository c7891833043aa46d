//! Driving port for credential checks.
//!
//! Inbound adapters authenticate through this trait and then ask the
//! [`super::TokenStore`] for a bearer token; neither step needs to know how
//! users are stored.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    ///
    /// Unknown usernames and wrong passwords fail with the same
    /// unauthorised error.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}
