//! PostgreSQL-backed `MedicationRepository` implementation using Diesel ORM.
//!
//! The derived expiry date is written alongside every medication so expiry
//! scans run against the `medications_expiry_date_idx` index.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MedicationRepository, MedicationRepositoryError};
use crate::domain::{Medication, MedicationId, UserId};

use super::diesel_helpers::{collect_rows, map_basic_diesel_error, map_basic_pool_error};
use super::models::{MedicationRecord, MedicationRow, row_to_medication};
use super::pool::{DbPool, PoolError};
use super::schema::medications;

/// Diesel-backed implementation of the `MedicationRepository` port.
#[derive(Clone)]
pub struct DieselMedicationRepository {
    pool: DbPool,
}

impl DieselMedicationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        query: medications::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Vec<Medication>, MedicationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MedicationRow> = query
            .select(MedicationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_medication),
            MedicationRepositoryError::query,
        )
    }
}

fn map_pool_error(error: PoolError) -> MedicationRepositoryError {
    map_basic_pool_error(error, MedicationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MedicationRepositoryError {
    map_basic_diesel_error(
        error,
        MedicationRepositoryError::query,
        MedicationRepositoryError::connection,
    )
}

#[async_trait]
impl MedicationRepository for DieselMedicationRepository {
    async fn save(&self, medication: &Medication) -> Result<(), MedicationRepositoryError> {
        let record =
            MedicationRecord::from_medication(medication).map_err(MedicationRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(medications::table)
            .values(&record)
            .on_conflict(medications::id)
            .do_update()
            .set(&record)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_owned(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<Option<Medication>, MedicationRepositoryError> {
        let found = self
            .load(
                medications::table
                    .filter(medications::id.eq(*id.as_uuid()))
                    .filter(medications::user_id.eq(*owner.as_uuid()))
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_id(
        &self,
        id: MedicationId,
    ) -> Result<Option<Medication>, MedicationRepositoryError> {
        let found = self
            .load(
                medications::table
                    .filter(medications::id.eq(*id.as_uuid()))
                    .into_boxed(),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Medication>, MedicationRepositoryError> {
        self.load(
            medications::table
                .filter(medications::user_id.eq(*owner.as_uuid()))
                .order((medications::created_at.asc(), medications::id.asc()))
                .into_boxed(),
        )
        .await
    }

    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Medication>, MedicationRepositoryError> {
        self.load(
            medications::table
                .filter(medications::expiry_date.ge(from))
                .filter(medications::expiry_date.le(to))
                .order((medications::expiry_date.asc(), medications::id.asc()))
                .into_boxed(),
        )
        .await
    }

    async fn delete_owned(
        &self,
        owner: &UserId,
        id: MedicationId,
    ) -> Result<bool, MedicationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            medications::table
                .filter(medications::id.eq(*id.as_uuid()))
                .filter(medications::user_id.eq(*owner.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
