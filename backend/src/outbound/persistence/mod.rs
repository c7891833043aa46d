//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one domain port over a shared `bb8` pool of
//! `diesel-async` connections. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private to this module; adapters translate
//! rows into validated domain values and map database failures onto the
//! port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use medminder::outbound::persistence::{
//!     DbPool, DieselMedicationRepository, PoolConfig, run_migrations,
//! };
//!
//! run_migrations("postgres://localhost/medminder").await?;
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/medminder")).await?;
//! let medications = DieselMedicationRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_disease_repository;
mod diesel_medication_repository;
mod diesel_reminder_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_disease_repository::DieselDiseaseRepository;
pub use diesel_medication_repository::DieselMedicationRepository;
pub use diesel_reminder_repository::DieselReminderRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
