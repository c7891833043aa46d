//! Run one reminder job against the configured database and exit.
//!
//! Intended for cron-style scheduling when the HTTP server runs with its
//! dispatch loop disabled.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use medminder::domain::{
    ReminderDispatcher, ReminderDispatcherConfig, ReminderDispatcherPorts, ReminderService,
    ReminderServicePorts,
};
use medminder::outbound::adapters::{Repositories, notification_channels};
use medminder::settings::Settings;

/// `reminder-jobs` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reminder-jobs",
    about = "Run a single reminder maintenance job",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `MEDMINDER_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    job: Job,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Job {
    /// Deliver due reminders and mark stale ones as missed.
    Dispatch,
    /// Create expiry reminders for medications entering the expiry window.
    ScheduleExpiry,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build reminder job runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    // Only environment variables and config files feed the settings here;
    // the command line belongs to clap.
    let settings = Settings::load_from_iter([OsString::from("reminder-jobs")])
        .wrap_err("failed to load configuration")?;
    let database_url = args
        .database_url
        .or_else(|| settings.database_url.clone())
        .ok_or_else(|| eyre!("a database URL is required; set MEDMINDER_DATABASE_URL"))?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repositories = Repositories::connect(Some(&database_url))
        .await
        .wrap_err("failed to connect to the database")?;

    match args.job {
        Job::Dispatch => {
            let dispatcher = ReminderDispatcher::new(
                ReminderDispatcherPorts {
                    reminders: repositories.reminders.clone(),
                    medications: repositories.medications.clone(),
                    users: repositories.users.clone(),
                    channels: notification_channels(&settings, clock.clone())?,
                },
                clock,
                ReminderDispatcherConfig {
                    window: settings.dispatch_window(),
                    expiry_window_days: settings.expiry_reminder_days(),
                },
            );
            let outcome = dispatcher.dispatch_due().await?;
            info!(
                candidates = outcome.candidates,
                sent = outcome.sent,
                failed = outcome.failed,
                missed = outcome.missed,
                sms_delivered = outcome.sms.delivered,
                wechat_delivered = outcome.wechat.delivered,
                email_delivered = outcome.email.delivered,
                "reminder dispatch finished"
            );
        }
        Job::ScheduleExpiry => {
            let service = ReminderService::new(
                ReminderServicePorts {
                    reminders: repositories.reminders.clone(),
                    medications: repositories.medications.clone(),
                },
                clock,
            )
            .with_expiry_window(settings.expiry_reminder_days());
            let outcome = service.schedule_expiry_reminders().await?;
            info!(
                candidates = outcome.candidates,
                scheduled = outcome.scheduled,
                already_scheduled = outcome.already_scheduled,
                past_due = outcome.past_due,
                "expiry reminder scheduling finished"
            );
        }
    }
    Ok(())
}
