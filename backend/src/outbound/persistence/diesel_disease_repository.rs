//! PostgreSQL-backed `DiseaseRepository` implementation using Diesel ORM.
//!
//! Recommendations cascade with their disease. Re-saving a
//! `(disease, medication name)` pair updates the stored strength in place.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DiseaseRepository, DiseaseRepositoryError};
use crate::domain::{Disease, DiseaseId, MedicationRecommendation, RecommendationId};

use super::diesel_helpers::{collect_rows, map_basic_pool_error, map_unique_diesel_error};
use super::models::{
    DiseaseRecord, DiseaseRow, NewRecommendationRow, RecommendationRow, row_to_disease,
    row_to_recommendation,
};
use super::pool::{DbPool, PoolError};
use super::schema::{diseases, medication_recommendations};

/// Diesel-backed implementation of the `DiseaseRepository` port.
#[derive(Clone)]
pub struct DieselDiseaseRepository {
    pool: DbPool,
}

impl DieselDiseaseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        query: diseases::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Vec<Disease>, DiseaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<DiseaseRow> = query
            .select(DiseaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_disease), DiseaseRepositoryError::query)
    }
}

fn map_pool_error(error: PoolError) -> DiseaseRepositoryError {
    map_basic_pool_error(error, DiseaseRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DiseaseRepositoryError {
    map_unique_diesel_error(
        error,
        DiseaseRepositoryError::query,
        DiseaseRepositoryError::connection,
        DiseaseRepositoryError::duplicate,
    )
}

#[async_trait]
impl DiseaseRepository for DieselDiseaseRepository {
    async fn save(&self, disease: &Disease) -> Result<(), DiseaseRepositoryError> {
        let record = DiseaseRecord {
            id: *disease.id().as_uuid(),
            name: disease.name(),
            description: disease.description(),
            updated_at: Utc::now(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(diseases::table)
            .values(&record)
            .on_conflict(diseases::id)
            .do_update()
            .set(&record)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(&self, id: DiseaseId) -> Result<Option<Disease>, DiseaseRepositoryError> {
        let found = self
            .load(diseases::table.filter(diseases::id.eq(*id.as_uuid())).into_boxed())
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Disease>, DiseaseRepositoryError> {
        let found = self
            .load(diseases::table.filter(diseases::name.eq(name)).into_boxed())
            .await?;
        Ok(found.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<Disease>, DiseaseRepositoryError> {
        self.load(diseases::table.order(diseases::name.asc()).into_boxed())
            .await
    }

    async fn delete(&self, id: DiseaseId) -> Result<bool, DiseaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(diseases::table.filter(diseases::id.eq(*id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn recommendations(
        &self,
        disease_id: DiseaseId,
    ) -> Result<Vec<MedicationRecommendation>, DiseaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RecommendationRow> = medication_recommendations::table
            .filter(medication_recommendations::disease_id.eq(*disease_id.as_uuid()))
            .order((
                medication_recommendations::strength.desc(),
                medication_recommendations::medication_name.asc(),
            ))
            .select(RecommendationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_recommendation),
            DiseaseRepositoryError::query,
        )
    }

    async fn save_recommendation(
        &self,
        recommendation: &MedicationRecommendation,
    ) -> Result<(), DiseaseRepositoryError> {
        let row = NewRecommendationRow::from(recommendation);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(medication_recommendations::table)
            .values(&row)
            .on_conflict((
                medication_recommendations::disease_id,
                medication_recommendations::medication_name,
            ))
            .do_update()
            .set(
                medication_recommendations::strength
                    .eq(excluded(medication_recommendations::strength)),
            )
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_recommendation(
        &self,
        id: RecommendationId,
    ) -> Result<bool, DiseaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            medication_recommendations::table
                .filter(medication_recommendations::id.eq(*id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
