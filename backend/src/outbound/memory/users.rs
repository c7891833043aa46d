//! In-memory `UserRepository`.

use async_trait::async_trait;

use super::{MemoryStore, Tables};
use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{ChannelKind, User, UserId, Username};

/// User repository over a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryUserRepository {
    store: MemoryStore,
}

impl MemoryUserRepository {
    pub(super) fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn contact(user: &User, channel: ChannelKind) -> Option<&str> {
    match channel {
        ChannelKind::Sms => user.phone().map(|binding| binding.address.as_ref()),
        ChannelKind::WeChat => user.wechat().map(|binding| binding.address.as_ref()),
        ChannelKind::Email => user.email().map(|binding| binding.address.as_ref()),
    }
}

fn conflicting_constraint(tables: &Tables, user: &User) -> Option<&'static str> {
    let others = tables.users.values().filter(|other| other.id() != user.id());
    for other in others {
        if other.username() == user.username() {
            return Some("users_username_key");
        }
        for (channel, constraint) in [
            (ChannelKind::Sms, "users_phone_key"),
            (ChannelKind::WeChat, "users_wechat_openid_key"),
            (ChannelKind::Email, "users_email_key"),
        ] {
            if contact(user, channel).is_some() && contact(user, channel) == contact(other, channel)
            {
                return Some(constraint);
            }
        }
    }
    None
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut tables = self.store.tables.write().await;
        if let Some(constraint) = conflicting_constraint(&tables, user) {
            return Err(UserPersistenceError::duplicate(constraint));
        }
        tables.users.insert(*user.id().as_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.store.tables.read().await.users.get(id.as_uuid()).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username() == username)
            .cloned())
    }

    async fn find_by_contact(
        &self,
        channel: ChannelKind,
        address: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| contact(user, channel) == Some(address))
            .cloned())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut tables = self.store.tables.write().await;
        if tables.users.remove(id.as_uuid()).is_none() {
            return Ok(false);
        }
        tables.medications.retain(|_, medication| medication.owner() != id);
        tables.reminders.retain(|_, reminder| reminder.owner() != id);
        Ok(true)
    }
}
