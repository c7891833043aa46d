//! Reasons a single reminder could not be handed to any channel.
//!
//! These stay local to the scan loop: every variant is counted as a failure
//! and the scan moves on to the next reminder.

use crate::domain::{Error, MedicationId, UserId};

pub(super) enum AttemptError {
    OwnerMissing(UserId),
    MedicationMissing(MedicationId),
    Lookup(Error),
    NoEligibleChannel,
    AllChannelsFailed,
}

impl From<Error> for AttemptError {
    fn from(err: Error) -> Self {
        Self::Lookup(err)
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerMissing(id) => write!(f, "owner {id} not found"),
            Self::MedicationMissing(id) => write!(f, "medication {id} not found"),
            Self::Lookup(err) => write!(f, "lookup failed: {}", err.message()),
            Self::NoEligibleChannel => f.write_str("owner has no enabled, verified channel"),
            Self::AllChannelsFailed => f.write_str("every channel failed"),
        }
    }
}
