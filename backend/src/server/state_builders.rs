//! Builders wiring repositories and transports into the domain services.

use std::sync::Arc;

use actix_web::web;
use mockable::Clock;

use medminder::domain::ports::{NotificationChannels, RandomVerificationCodes};
use medminder::domain::{
    DiseaseService, MedicationService, ReminderDispatcher, ReminderDispatcherConfig,
    ReminderDispatcherPorts, ReminderService, ReminderServicePorts, UserAccountPorts,
    UserAccountService,
};
use medminder::inbound::http::state::HttpState;
use medminder::outbound::adapters::Repositories;
use medminder::outbound::knowledge::JsonKnowledgeBase;
use medminder::outbound::tokens::InMemoryTokenStore;
use medminder::settings::Settings;

/// Services shared by the HTTP workers and the background jobs.
pub(crate) struct Services {
    pub(crate) http_state: web::Data<HttpState>,
    pub(crate) tokens: Arc<InMemoryTokenStore>,
    pub(crate) dispatcher: Arc<ReminderDispatcher>,
}

/// Build every service over `repositories`.
pub(crate) fn build_services(
    repositories: &Repositories,
    channels: NotificationChannels,
    knowledge: JsonKnowledgeBase,
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Services {
    let window = settings.expiry_reminder_days();
    let tokens = Arc::new(InMemoryTokenStore::new(settings.token_ttl(), clock.clone()));
    let accounts = Arc::new(UserAccountService::new(
        UserAccountPorts {
            users: repositories.users.clone(),
            channels: channels.clone(),
            codes: Arc::new(RandomVerificationCodes),
        },
        clock.clone(),
    ));
    let medications = MedicationService::new(
        repositories.medications.clone(),
        repositories.reminders.clone(),
        repositories.diseases.clone(),
        Arc::new(knowledge),
        clock.clone(),
    )
    .with_expiry_window(window);
    let reminders = ReminderService::new(
        ReminderServicePorts {
            reminders: repositories.reminders.clone(),
            medications: repositories.medications.clone(),
        },
        clock.clone(),
    )
    .with_expiry_window(window);
    let dispatcher = ReminderDispatcher::new(
        ReminderDispatcherPorts {
            reminders: repositories.reminders.clone(),
            medications: repositories.medications.clone(),
            users: repositories.users.clone(),
            channels,
        },
        clock,
        ReminderDispatcherConfig {
            window: settings.dispatch_window(),
            expiry_window_days: window,
        },
    );

    let http_state = web::Data::new(HttpState {
        login: accounts.clone(),
        tokens: tokens.clone(),
        accounts,
        medications: Arc::new(medications),
        reminders: Arc::new(reminders),
        diseases: Arc::new(DiseaseService::new(repositories.diseases.clone())),
    });

    Services {
        http_state,
        tokens,
        dispatcher: Arc::new(dispatcher),
    }
}
