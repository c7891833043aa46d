//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, notification channels, the token store and
//! the knowledge base) are implemented by `outbound` adapters. Driving ports
//! (`*Management`, `UserAccounts`, `LoginService`, `DiseaseCatalogue`) are
//! implemented by domain services and called by `inbound` adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod disease_catalogue;
mod disease_repository;
mod login_service;
mod medication_knowledge;
mod medication_management;
mod medication_repository;
mod notification_channel;
mod reminder_management;
mod reminder_repository;
mod token_store;
mod user_accounts;
mod user_repository;
mod verification_code_source;

#[cfg(test)]
pub use disease_catalogue::MockDiseaseCatalogue;
pub use disease_catalogue::{DiseaseCatalogue, DiseaseDetails};
#[cfg(test)]
pub use disease_repository::MockDiseaseRepository;
pub use disease_repository::{DiseaseRepository, DiseaseRepositoryError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use medication_knowledge::MockMedicationKnowledge;
pub use medication_knowledge::{
    FixtureMedicationKnowledge, KnowledgeBaseError, MedicationKnowledge,
};
#[cfg(test)]
pub use medication_management::MockMedicationManagement;
pub use medication_management::{
    DiseaseMedicationReport, MedicationManagement, MedicationView, MissingMedication,
    NewMedication,
};
#[cfg(test)]
pub use medication_repository::MockMedicationRepository;
pub use medication_repository::{MedicationRepository, MedicationRepositoryError};
#[cfg(test)]
pub use notification_channel::MockNotificationChannel;
pub use notification_channel::{NotificationChannel, NotificationChannels, NotificationError};
#[cfg(test)]
pub use reminder_management::MockReminderManagement;
pub use reminder_management::{
    NewReminder, ReminderManagement, ReminderUpdate, UsageScheduleRequest,
};
#[cfg(test)]
pub use reminder_repository::MockReminderRepository;
pub use reminder_repository::{ReminderRepository, ReminderRepositoryError};
#[cfg(test)]
pub use token_store::MockTokenStore;
pub use token_store::{TokenStore, TokenStoreError};
#[cfg(test)]
pub use user_accounts::MockUserAccounts;
pub use user_accounts::{ProfileUpdate, Registration, UserAccounts};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use verification_code_source::MockVerificationCodeSource;
pub use verification_code_source::{
    FixedVerificationCode, RandomVerificationCodes, VerificationCodeSource,
};
