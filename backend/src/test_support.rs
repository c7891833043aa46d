//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`,
//! through the `test-support` feature).

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ChannelKind;
use crate::domain::ports::{NotificationChannel, NotificationError};

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward (or back, for negative values).
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// One message captured by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Recipient address.
    pub recipient: String,
    /// Message body.
    pub message: String,
}

/// Notification channel that records every send and can be told to fail.
pub struct RecordingChannel {
    kind: ChannelKind,
    fail: bool,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingChannel {
    /// A channel that accepts every message.
    pub fn accepting(kind: ChannelKind) -> Self {
        Self {
            kind,
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A channel whose transport always fails.
    pub fn failing(kind: ChannelKind) -> Self {
        Self {
            fail: true,
            ..Self::accepting(kind)
        }
    }

    /// Messages sent so far, including failed attempts.
    pub fn sent(&self) -> Vec<SentMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(_) => panic!("recording channel mutex"),
        }
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        match self.sent.lock() {
            Ok(mut sent) => sent.push(SentMessage {
                recipient: recipient.to_owned(),
                message: message.to_owned(),
            }),
            Err(_) => panic!("recording channel mutex"),
        }
        if self.fail {
            Err(NotificationError::transport("simulated outage"))
        } else {
            Ok(())
        }
    }
}

/// Write `contents` to `path` through `cap_std`.
pub fn write_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    Dir::open_ambient_dir(parent, ambient_authority())?.write(file_name, contents)
}
