//! PostgreSQL-backed `ReminderRepository` implementation using Diesel ORM.
//!
//! Pending rows are those with neither `sent_at` nor `missed_at` set. The
//! delivery transitions update only pending rows, so a reminder claimed by
//! one scan is invisible to the next.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ReminderRepository, ReminderRepositoryError};
use crate::domain::{MedicationId, Reminder, ReminderId, ReminderKind, UserId};

use super::diesel_helpers::{collect_rows, map_basic_diesel_error, map_basic_pool_error};
use super::models::{ReminderRecord, ReminderRow, row_to_reminder};
use super::pool::{DbPool, PoolError};
use super::schema::reminders;

/// Diesel-backed implementation of the `ReminderRepository` port.
#[derive(Clone)]
pub struct DieselReminderRepository {
    pool: DbPool,
}

impl DieselReminderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        query: reminders::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReminderRow> = query
            .select(ReminderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_reminder),
            ReminderRepositoryError::query,
        )
    }
}

fn map_pool_error(error: PoolError) -> ReminderRepositoryError {
    map_basic_pool_error(error, ReminderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ReminderRepositoryError {
    map_basic_diesel_error(
        error,
        ReminderRepositoryError::query,
        ReminderRepositoryError::connection,
    )
}

fn to_count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

#[async_trait]
impl ReminderRepository for DieselReminderRepository {
    async fn save(&self, reminder: &Reminder) -> Result<(), ReminderRepositoryError> {
        let record = ReminderRecord::from(reminder);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(reminders::table)
            .values(&record)
            .on_conflict(reminders::id)
            .do_update()
            .set(&record)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn insert_all(&self, batch: &[Reminder]) -> Result<(), ReminderRepositoryError> {
        if batch.is_empty() {
            return Ok(());
        }
        let records: Vec<ReminderRecord<'_>> = batch.iter().map(ReminderRecord::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // A single multi-row INSERT either stores the whole batch or nothing.
        diesel::insert_into(reminders::table)
            .values(&records)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_owned(
        &self,
        owner: &UserId,
        id: ReminderId,
    ) -> Result<Option<Reminder>, ReminderRepositoryError> {
        let found = self
            .load(
                reminders::table
                    .filter(reminders::id.eq(*id.as_uuid()))
                    .filter(reminders::user_id.eq(*owner.as_uuid()))
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        self.load(
            reminders::table
                .filter(reminders::user_id.eq(*owner.as_uuid()))
                .order((reminders::scheduled_at.asc(), reminders::id.asc()))
                .into_boxed(),
        )
        .await
    }

    async fn list_pending_between(
        &self,
        owner: Option<UserId>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderRepositoryError> {
        let mut query = reminders::table
            .filter(reminders::sent_at.is_null())
            .filter(reminders::missed_at.is_null())
            .filter(reminders::scheduled_at.ge(from))
            .filter(reminders::scheduled_at.le(to))
            .order((reminders::scheduled_at.asc(), reminders::id.asc()))
            .into_boxed();
        if let Some(owner) = owner {
            query = query.filter(reminders::user_id.eq(*owner.as_uuid()));
        }
        self.load(query).await
    }

    async fn has_pending(
        &self,
        medication_id: MedicationId,
        kind: ReminderKind,
    ) -> Result<bool, ReminderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            reminders::table
                .filter(reminders::medication_id.eq(*medication_id.as_uuid()))
                .filter(reminders::kind.eq(kind.as_str()))
                .filter(reminders::sent_at.is_null())
                .filter(reminders::missed_at.is_null()),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn delete_owned(
        &self,
        owner: &UserId,
        id: ReminderId,
    ) -> Result<bool, ReminderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            reminders::table
                .filter(reminders::id.eq(*id.as_uuid()))
                .filter(reminders::user_id.eq(*owner.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn delete_for_medication(
        &self,
        medication_id: MedicationId,
    ) -> Result<u64, ReminderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            reminders::table.filter(reminders::medication_id.eq(*medication_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map(to_count)
        .map_err(map_diesel_error)
    }

    async fn mark_sent(
        &self,
        id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<bool, ReminderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            reminders::table
                .filter(reminders::id.eq(*id.as_uuid()))
                .filter(reminders::sent_at.is_null())
                .filter(reminders::missed_at.is_null()),
        )
        .set(reminders::sent_at.eq(Some(at)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn mark_missed_before(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<u64, ReminderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            reminders::table
                .filter(reminders::scheduled_at.lt(cutoff))
                .filter(reminders::sent_at.is_null())
                .filter(reminders::missed_at.is_null()),
        )
        .set(reminders::missed_at.eq(Some(at)))
        .execute(&mut conn)
        .await
        .map(to_count)
        .map_err(map_diesel_error)
    }
}
