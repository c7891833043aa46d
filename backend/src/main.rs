//! Backend entry-point: wires REST endpoints, background reminder dispatch,
//! and OpenAPI docs.

mod server;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use medminder::domain::ReminderDispatcher;
use medminder::inbound::http::health::HealthState;
use medminder::outbound::adapters::{Repositories, knowledge_base, notification_channels};
use medminder::outbound::tokens::InMemoryTokenStore;
use medminder::settings::Settings;
use server::{ServerConfig, build_services, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = Settings::load().wrap_err("failed to load configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let repositories = Repositories::connect(settings.database_url.as_deref())
        .await
        .wrap_err("failed to initialise storage")?;
    let knowledge = knowledge_base(&settings)?;
    let channels = notification_channels(&settings, clock.clone())?;

    let mut health = HealthState::new();
    if let Some(pool) = repositories.pool.clone() {
        health = health.with_pool(pool);
    }
    let health_state = web::Data::new(health);

    let services = build_services(&repositories, channels, knowledge, &settings, clock);
    let dispatch_loop = settings
        .dispatch_interval()
        .map(|every| spawn_dispatch_loop(every, services.dispatcher.clone(), services.tokens.clone()));
    if dispatch_loop.is_none() {
        info!("reminder dispatch loop disabled");
    }

    let bind_addr = settings.bind_addr();
    info!(%bind_addr, "starting HTTP server");
    let config = ServerConfig::new(bind_addr, services.http_state);
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;

    health_state.mark_unhealthy();
    if let Some(handle) = dispatch_loop {
        handle.abort();
    }
    result.wrap_err("HTTP server failed")
}

fn spawn_dispatch_loop(
    every: Duration,
    dispatcher: Arc<ReminderDispatcher>,
    tokens: Arc<InMemoryTokenStore>,
) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "reminder dispatch loop enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match dispatcher.dispatch_due().await {
                Ok(outcome) => info!(
                    candidates = outcome.candidates,
                    sent = outcome.sent,
                    failed = outcome.failed,
                    missed = outcome.missed,
                    "reminder dispatch scan finished"
                ),
                Err(err) => error!(error = %err, "reminder dispatch scan failed"),
            }
            let purged = tokens.purge_expired().await;
            if purged > 0 {
                info!(purged, "expired access tokens removed");
            }
        }
    })
}
