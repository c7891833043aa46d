//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Usernames and contact addresses carry unique indexes; violations surface
//! as [`UserPersistenceError::Duplicate`]. Deleting a user cascades to their
//! medications and reminders through foreign keys.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{ChannelKind, User, UserId, Username};

use super::diesel_helpers::{map_basic_pool_error, map_unique_diesel_error};
use super::models::{UserRecord, UserRow, row_to_user};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        query: users::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = query
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserPersistenceError::query)
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_unique_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
        UserPersistenceError::duplicate,
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let record = UserRecord::from_user(user, Utc::now());

        diesel::insert_into(users::table)
            .values(&record)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::username.eq(excluded(users::username)),
                users::password_hash.eq(excluded(users::password_hash)),
                users::phone.eq(excluded(users::phone)),
                users::phone_verified.eq(excluded(users::phone_verified)),
                users::wechat_openid.eq(excluded(users::wechat_openid)),
                users::wechat_verified.eq(excluded(users::wechat_verified)),
                users::email.eq(excluded(users::email)),
                users::email_verified.eq(excluded(users::email_verified)),
                users::notify_sms.eq(excluded(users::notify_sms)),
                users::notify_wechat.eq(excluded(users::notify_wechat)),
                users::notify_email.eq(excluded(users::notify_email)),
                users::verification_code.eq(excluded(users::verification_code)),
                users::verification_issued_at.eq(excluded(users::verification_issued_at)),
                users::updated_at.eq(excluded(users::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        self.find_one(users::table.filter(users::id.eq(*id.as_uuid())).into_boxed())
            .await
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        self.find_one(
            users::table
                .filter(users::username.eq(username.as_ref()))
                .into_boxed(),
        )
        .await
    }

    async fn find_by_contact(
        &self,
        channel: ChannelKind,
        address: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let query = users::table.into_boxed();
        let query = match channel {
            ChannelKind::Sms => query.filter(users::phone.eq(address)),
            ChannelKind::WeChat => query.filter(users::wechat_openid.eq(address)),
            ChannelKind::Email => query.filter(users::email.eq(address)),
        };
        self.find_one(query).await
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.filter(users::id.eq(*id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
