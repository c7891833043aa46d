//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{ChannelKind, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}" as service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}" as internal,
        /// A unique field (username or contact address) is already taken.
        Duplicate { message: String } => "user already exists: {message}" as conflict,
    }
}

/// Port for reading and writing users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or update a user record.
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by login name.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch the user a contact address is bound to.
    async fn find_by_contact(
        &self,
        channel: ChannelKind,
        address: &str,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Remove a user and everything they own.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}
