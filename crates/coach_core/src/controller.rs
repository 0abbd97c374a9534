use std::{sync::Arc, time::Duration};

use shared::{domain::GreetingSource, error::CompletionError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    script,
    session::{OutboundRequest, ReplyOutcome, SessionState, SessionView},
    CompletionService,
};

const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub instruction: String,
    pub start_greeting: GreetingSource,
    pub restart_greeting: GreetingSource,
    pub start_greeting_text: String,
    pub restart_greeting_text: String,
    /// Upper bound on a single completion call; `None` waits indefinitely.
    pub reply_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instruction: script::INSTRUCTION.to_string(),
            start_greeting: GreetingSource::External,
            restart_greeting: GreetingSource::Canned,
            start_greeting_text: script::WELCOME_GREETING.to_string(),
            restart_greeting_text: script::WELCOME_BACK_GREETING.to_string(),
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, a reply already in flight, or a finished session.
    Ignored,
    Dispatched(ReplyOutcome),
}

/// Owns the running session and mediates every call to the completion service.
///
/// Clones share the same session. The state lock is released for the duration
/// of the outbound call; the phase alone keeps a second submission out.
#[derive(Clone)]
pub struct SessionController {
    service: Arc<dyn CompletionService>,
    config: Arc<SessionConfig>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    /// Builds the initial session without contacting the service.
    pub fn new(service: Arc<dyn CompletionService>, config: SessionConfig) -> Self {
        let state = SessionState::begin(
            &config.instruction,
            config.start_greeting,
            &config.start_greeting_text,
        );
        info!(session_id = %state.id(), greeting = ?config.start_greeting, "session created");

        Self {
            service,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Creates the session and, for an external greeting, waits for the first model turn.
    pub async fn start(
        service: Arc<dyn CompletionService>,
        config: SessionConfig,
    ) -> (Self, Option<ReplyOutcome>) {
        let controller = Self::new(service, config);
        let outcome = controller.resume().await;
        (controller, outcome)
    }

    /// Issues the greeting call of a freshly created session. Later calls return `None`.
    pub async fn resume(&self) -> Option<ReplyOutcome> {
        let request = self.state.lock().await.take_greeting_request()?;
        Some(self.dispatch(request).await)
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let request = {
            let mut state = self.state.lock().await;
            match state.accept_input(text) {
                Some(request) => request,
                None => {
                    debug!(
                        session_id = %state.id(),
                        phase = ?state.phase(),
                        "submission ignored"
                    );
                    return SubmitOutcome::Ignored;
                }
            }
        };

        SubmitOutcome::Dispatched(self.dispatch(request).await)
    }

    /// Discards the current session and starts over with the restart greeting.
    pub async fn restart(&self) -> Option<ReplyOutcome> {
        let request = {
            let mut state = self.state.lock().await;
            let previous = state.id();
            *state = SessionState::begin(
                &self.config.instruction,
                self.config.restart_greeting,
                &self.config.restart_greeting_text,
            );
            info!(
                previous_session_id = %previous,
                session_id = %state.id(),
                greeting = ?self.config.restart_greeting,
                "session restarted"
            );
            state.take_greeting_request()
        };

        Some(self.dispatch(request?).await)
    }

    pub async fn snapshot(&self) -> SessionView {
        self.state.lock().await.view()
    }

    async fn dispatch(&self, request: OutboundRequest) -> ReplyOutcome {
        debug!(
            session_id = %request.session_id,
            turns = request.transcript.len(),
            "requesting completion"
        );

        let result = match self.config.reply_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.service.complete(&request.transcript)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(CompletionError::Timeout { limit }),
                }
            }
            None => self.service.complete(&request.transcript).await,
        };

        match &result {
            Err(err) => {
                warn!(session_id = %request.session_id, error = %err, "completion failed")
            }
            Ok(completion) if completion.is_safety_flagged() => {
                warn!(session_id = %request.session_id, "reply carried a safety finish reason")
            }
            Ok(_) => {}
        }

        let mut state = self.state.lock().await;
        if state.id() != request.session_id {
            debug!(
                session_id = %request.session_id,
                current_session_id = %state.id(),
                "dropping reply for a discarded session"
            );
            return ReplyOutcome::Stale;
        }

        let outcome = state.apply_completion(result);
        if let ReplyOutcome::Finished { document } = &outcome {
            info!(
                session_id = %request.session_id,
                document_len = document.len(),
                "session finished"
            );
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
