//! Venue error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    /// A collaborator rejected the call (an EVM revert).
    #[error("{contract} reverted: {reason}")]
    Reverted {
        contract: &'static str,
        reason: String,
    },

    #[error("Unknown checkpoint: {0}")]
    UnknownCheckpoint(u64),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl VenueError {
    /// Build a revert error.
    pub fn reverted(contract: &'static str, reason: impl Into<String>) -> Self {
        Self::Reverted {
            contract,
            reason: reason.into(),
        }
    }

    /// Revert reason, if this is a revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::Reverted { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

pub type VenueResult<T> = Result<T, VenueError>;
