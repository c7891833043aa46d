//! In-process repositories used when no database is configured and by the
//! integration tests.
//!
//! All four repositories share one [`MemoryStore`] so that the foreign-key
//! behaviour of the PostgreSQL schema carries over: deleting a user removes
//! their medications and reminders, deleting a medication removes its
//! reminders, and deleting a disease removes its recommendations. Unique
//! constraints are enforced the same way and reported as `Duplicate`.

mod diseases;
mod medications;
mod reminders;
mod users;

pub use diseases::MemoryDiseaseRepository;
pub use medications::MemoryMedicationRepository;
pub use reminders::MemoryReminderRepository;
pub use users::MemoryUserRepository;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Disease, Medication, MedicationRecommendation, Reminder, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    medications: BTreeMap<Uuid, Medication>,
    reminders: BTreeMap<Uuid, Reminder>,
    diseases: BTreeMap<Uuid, Disease>,
    recommendations: BTreeMap<Uuid, MedicationRecommendation>,
}

/// Shared backing store for the in-memory repositories.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// User repository view.
    pub fn users(&self) -> MemoryUserRepository {
        MemoryUserRepository::new(self.clone())
    }

    /// Medication repository view.
    pub fn medications(&self) -> MemoryMedicationRepository {
        MemoryMedicationRepository::new(self.clone())
    }

    /// Reminder repository view.
    pub fn reminders(&self) -> MemoryReminderRepository {
        MemoryReminderRepository::new(self.clone())
    }

    /// Disease repository view.
    pub fn diseases(&self) -> MemoryDiseaseRepository {
        MemoryDiseaseRepository::new(self.clone())
    }
}
