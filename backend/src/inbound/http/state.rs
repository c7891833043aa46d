//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    DiseaseCatalogue, LoginService, MedicationManagement, ReminderManagement, TokenStore,
    UserAccounts,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use medminder::domain::{
///     DiseaseService, MedicationService, ReminderService, ReminderServicePorts,
///     UserAccountPorts, UserAccountService,
/// };
/// use medminder::domain::ports::{NotificationChannels, RandomVerificationCodes};
/// use medminder::inbound::http::state::HttpState;
/// use medminder::outbound::knowledge::JsonKnowledgeBase;
/// use medminder::outbound::memory::MemoryStore;
/// use medminder::outbound::tokens::InMemoryTokenStore;
///
/// let store = MemoryStore::new();
/// let clock = Arc::new(mockable::DefaultClock);
/// let accounts = Arc::new(UserAccountService::new(
///     UserAccountPorts {
///         users: Arc::new(store.users()),
///         channels: NotificationChannels::new(),
///         codes: Arc::new(RandomVerificationCodes),
///     },
///     clock.clone(),
/// ));
/// let state = HttpState {
///     login: accounts.clone(),
///     tokens: Arc::new(InMemoryTokenStore::new(chrono::TimeDelta::hours(24), clock.clone())),
///     accounts,
///     medications: Arc::new(MedicationService::new(
///         Arc::new(store.medications()),
///         Arc::new(store.reminders()),
///         Arc::new(store.diseases()),
///         Arc::new(JsonKnowledgeBase::bundled().expect("bundled knowledge base")),
///         clock.clone(),
///     )),
///     reminders: Arc::new(ReminderService::new(
///         ReminderServicePorts {
///             reminders: Arc::new(store.reminders()),
///             medications: Arc::new(store.medications()),
///         },
///         clock,
///     )),
///     diseases: Arc::new(DiseaseService::new(Arc::new(store.diseases()))),
/// };
/// let _tokens = state.tokens.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    /// Credential checks for `POST /auth/login`.
    pub login: Arc<dyn LoginService>,
    /// Bearer token issue, validation and revocation.
    pub tokens: Arc<dyn TokenStore>,
    /// Registration, profile and contact binding.
    pub accounts: Arc<dyn UserAccounts>,
    /// The medication cabinet.
    pub medications: Arc<dyn MedicationManagement>,
    /// Reminder management.
    pub reminders: Arc<dyn ReminderManagement>,
    /// The disease catalogue.
    pub diseases: Arc<dyn DiseaseCatalogue>,
}
