use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification used to pick the diagnostic shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Connection,
    SafetyBlock,
    NoContent,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion request timed out after {limit:?}")]
    Timeout { limit: Duration },
    #[error("completion service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not parse completion response: {0}")]
    Malformed(String),
    #[error("completion response contained no text")]
    NoContent,
    #[error("completion was blocked by the provider ({reason})")]
    Blocked { reason: String },
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::Status { .. } | Self::Malformed(_) => {
                FailureKind::Connection
            }
            Self::NoContent => FailureKind::NoContent,
            Self::Blocked { .. } => FailureKind::SafetyBlock,
        }
    }
}
