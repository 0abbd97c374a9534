use async_trait::async_trait;
use shared::{domain::Turn, error::CompletionError, protocol::FINISH_REASON_SAFETY};

pub mod controller;
pub mod gemini;
pub mod render;
pub mod script;
pub mod session;

pub use controller::{SessionConfig, SessionController, SubmitOutcome};
pub use gemini::{GeminiClient, GeminiConfig, GeminiSetupError};
pub use session::{OutboundRequest, Phase, ReplyOutcome, SessionState, SessionView};

/// A single successful reply from the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: Option<String>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
        }
    }

    pub fn is_safety_flagged(&self) -> bool {
        self.finish_reason.as_deref() == Some(FINISH_REASON_SAFETY)
    }
}

/// The external generative-language service.
///
/// Each call performs exactly one outbound request for the full transcript.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, transcript: &[Turn]) -> Result<Completion, CompletionError>;
}
