//! Reminder dispatch scan.
//!
//! One scan marks stale pending reminders as missed, then delivers every
//! pending reminder whose scheduled time lies within the dispatch window
//! around "now". A reminder is sent when at least one of the owner's enabled
//! and verified channels accepts it; otherwise it stays pending.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    MedicationRepository, NotificationChannels, ReminderRepository, UserRepository,
};
use crate::domain::{ChannelKind, DEFAULT_EXPIRY_WINDOW_DAYS, Error, Reminder};

mod attempt_error;

use attempt_error::AttemptError;

/// Port bundle required by the dispatcher.
pub struct ReminderDispatcherPorts {
    /// Reminder persistence.
    pub reminders: Arc<dyn ReminderRepository>,
    /// Medication persistence, used to name the medication in messages.
    pub medications: Arc<dyn MedicationRepository>,
    /// User persistence, used to resolve delivery targets.
    pub users: Arc<dyn UserRepository>,
    /// Registered notification transports.
    pub channels: NotificationChannels,
}

/// Dispatch tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDispatcherConfig {
    /// Half-width of the window around "now" selecting due reminders.
    pub window: Duration,
    /// Window quoted in synthesised expiry messages.
    pub expiry_window_days: u32,
}

impl Default for ReminderDispatcherConfig {
    fn default() -> Self {
        Self {
            window: Duration::minutes(5),
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
        }
    }
}

/// Per-channel delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelTally {
    /// Messages the transport accepted.
    pub delivered: usize,
    /// Messages the transport refused or could not send.
    pub failed: usize,
}

/// Summary of one dispatch scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Reminders selected by the window.
    pub candidates: usize,
    /// Reminders marked sent.
    pub sent: usize,
    /// Reminders left pending because nothing was delivered.
    pub failed: usize,
    /// Stale reminders moved to the missed state before the scan.
    pub missed: u64,
    /// SMS results.
    pub sms: ChannelTally,
    /// WeChat results.
    pub wechat: ChannelTally,
    /// Email results.
    pub email: ChannelTally,
}

impl DispatchOutcome {
    fn tally_mut(&mut self, kind: ChannelKind) -> &mut ChannelTally {
        match kind {
            ChannelKind::Sms => &mut self.sms,
            ChannelKind::WeChat => &mut self.wechat,
            ChannelKind::Email => &mut self.email,
        }
    }
}

/// Delivers due reminders through the configured channels.
pub struct ReminderDispatcher {
    reminders: Arc<dyn ReminderRepository>,
    medications: Arc<dyn MedicationRepository>,
    users: Arc<dyn UserRepository>,
    channels: NotificationChannels,
    clock: Arc<dyn Clock>,
    config: ReminderDispatcherConfig,
    in_flight: Mutex<()>,
}

impl ReminderDispatcher {
    /// Build a dispatcher.
    pub fn new(
        ports: ReminderDispatcherPorts,
        clock: Arc<dyn Clock>,
        config: ReminderDispatcherConfig,
    ) -> Self {
        Self {
            reminders: ports.reminders,
            medications: ports.medications,
            users: ports.users,
            channels: ports.channels,
            clock,
            config,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one scan.
    ///
    /// Returns a conflict error when another scan on this dispatcher is still
    /// running. Repository failures while selecting reminders abort the scan;
    /// failures for a single reminder, including a failed `mark_sent`, are
    /// counted and skipped.
    pub async fn dispatch_due(&self) -> Result<DispatchOutcome, Error> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(Error::conflict("a dispatch scan is already running"));
        };

        let now = self.clock.utc();
        let from = now - self.config.window;
        let until = now + self.config.window;

        let mut outcome = DispatchOutcome {
            missed: self.reminders.mark_missed_before(from, now).await?,
            ..DispatchOutcome::default()
        };
        if outcome.missed > 0 {
            info!(count = outcome.missed, "marked stale reminders as missed");
        }

        let due = self.reminders.list_pending_between(None, from, until).await?;
        outcome.candidates = due.len();

        for reminder in &due {
            match self.deliver(reminder, &mut outcome).await {
                Ok(()) => match self.reminders.mark_sent(reminder.id(), self.clock.utc()).await {
                    Ok(true) => outcome.sent += 1,
                    Ok(false) => {
                        debug!(reminder = %reminder.id(), "reminder settled by another scan");
                    }
                    Err(error) => {
                        warn!(
                            reminder = %reminder.id(),
                            %error,
                            "reminder delivered but not marked sent"
                        );
                        outcome.failed += 1;
                    }
                },
                Err(error) => {
                    warn!(reminder = %reminder.id(), %error, "reminder not delivered");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            candidates = outcome.candidates,
            sent = outcome.sent,
            failed = outcome.failed,
            missed = outcome.missed,
            sms = outcome.sms.delivered,
            wechat = outcome.wechat.delivered,
            email = outcome.email.delivered,
            "reminder dispatch finished"
        );
        Ok(outcome)
    }

    async fn deliver(
        &self,
        reminder: &Reminder,
        outcome: &mut DispatchOutcome,
    ) -> Result<(), AttemptError> {
        let owner = self
            .users
            .find_by_id(reminder.owner())
            .await
            .map_err(Error::from)?
            .ok_or_else(|| AttemptError::OwnerMissing(reminder.owner().clone()))?;
        let medication = self
            .medications
            .find_by_id(reminder.medication_id())
            .await
            .map_err(Error::from)?
            .ok_or(AttemptError::MedicationMissing(reminder.medication_id()))?;

        let targets = owner.delivery_targets();
        if targets.is_empty() {
            return Err(AttemptError::NoEligibleChannel);
        }

        let message =
            reminder.message_or_default(medication.name(), self.config.expiry_window_days);
        let mut delivered = false;
        for (kind, recipient) in targets {
            let Some(channel) = self.channels.get(kind) else {
                debug!(channel = kind.as_str(), "no transport registered");
                continue;
            };
            match channel.send(&recipient, &message).await {
                Ok(()) => {
                    outcome.tally_mut(kind).delivered += 1;
                    delivered = true;
                }
                Err(error) => {
                    warn!(
                        reminder = %reminder.id(),
                        channel = kind.as_str(),
                        %error,
                        "channel delivery failed"
                    );
                    outcome.tally_mut(kind).failed += 1;
                }
            }
        }

        if delivered {
            Ok(())
        } else {
            Err(AttemptError::AllChannelsFailed)
        }
    }
}

#[cfg(test)]
mod tests;
