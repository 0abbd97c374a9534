//! Session state and its transitions.
//!
//! Every mutation of a running conversation goes through [`SessionState`].
//! The transitions are synchronous; the controller performs the outbound call
//! between [`SessionState::accept_input`] and [`SessionState::apply_completion`].

use serde::Serialize;
use shared::{
    domain::{GreetingSource, Message, SessionId, Turn},
    error::{CompletionError, FailureKind},
};

use crate::{
    script::{self, contains_completion_marker, extract_final_document},
    Completion,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingModel,
    AwaitingUser,
    Finished,
}

/// Transcript snapshot handed to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub session_id: SessionId,
    pub transcript: Vec<Turn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The reply was shown and the user may answer.
    Continued { message: Message },
    /// The reply carried the completion marker.
    Finished { document: String },
    /// The call failed; a diagnostic was shown and the transcript is unchanged.
    Failed { kind: FailureKind, message: Message },
    /// The session was restarted while the call was in flight.
    Stale,
    /// No reply was expected.
    Ignored,
}

/// Read-only view for a presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
    pub pending: bool,
    pub finished: bool,
    pub final_document: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    id: SessionId,
    transcript: Vec<Turn>,
    messages: Vec<Message>,
    phase: Phase,
    final_document: Option<String>,
    greeting_due: bool,
}

impl SessionState {
    /// Fresh session whose transcript holds only the instruction turn.
    ///
    /// With [`GreetingSource::Canned`] the greeting is recorded locally as the
    /// first assistant turn; otherwise the session waits for the model.
    pub fn begin(instruction: &str, greeting: GreetingSource, canned_greeting: &str) -> Self {
        let mut state = Self {
            id: SessionId::new(),
            transcript: vec![Turn::instruction(instruction)],
            messages: Vec::new(),
            phase: Phase::AwaitingModel,
            final_document: None,
            greeting_due: true,
        };

        if greeting == GreetingSource::Canned {
            state.transcript.push(Turn::assistant(canned_greeting));
            state.messages.push(Message::assistant(canned_greeting));
            state.phase = Phase::AwaitingUser;
            state.greeting_due = false;
        }

        state
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn final_document(&self) -> Option<&str> {
        self.final_document.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::AwaitingModel
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Hands out the opening request of an externally greeted session, once.
    pub fn take_greeting_request(&mut self) -> Option<OutboundRequest> {
        if !self.greeting_due {
            return None;
        }
        self.greeting_due = false;
        Some(self.outbound())
    }

    fn outbound(&self) -> OutboundRequest {
        OutboundRequest {
            session_id: self.id,
            transcript: self.transcript.clone(),
        }
    }

    /// Records a user submission. Returns `None` (and changes nothing) when
    /// the text is blank or the session is not waiting for the user.
    ///
    /// Completion markers typed by the user are removed before the text is
    /// recorded; input that is blank afterwards is rejected.
    pub fn accept_input(&mut self, text: &str) -> Option<OutboundRequest> {
        if self.phase != Phase::AwaitingUser {
            return None;
        }
        let text = if contains_completion_marker(text) {
            script::strip_completion_marker(text)
        } else {
            text.to_string()
        };
        if text.trim().is_empty() {
            return None;
        }

        self.messages.push(Message::user(text.as_str()));
        self.transcript.push(Turn::user(text));
        self.phase = Phase::AwaitingModel;
        Some(self.outbound())
    }

    pub fn apply_completion(
        &mut self,
        result: Result<Completion, CompletionError>,
    ) -> ReplyOutcome {
        if self.phase != Phase::AwaitingModel {
            return ReplyOutcome::Ignored;
        }

        let completion = match result {
            Ok(completion) => completion,
            Err(err) => return self.fail(err.kind()),
        };

        if contains_completion_marker(&completion.text) {
            let Some(document) = extract_final_document(&completion.text) else {
                return self.fail(FailureKind::NoContent);
            };
            self.final_document = Some(document.clone());
            self.phase = Phase::Finished;
            return ReplyOutcome::Finished { document };
        }

        let message = Message::assistant(completion.text.as_str());
        self.transcript.push(Turn::assistant(completion.text));
        self.messages.push(message.clone());
        self.phase = Phase::AwaitingUser;
        ReplyOutcome::Continued { message }
    }

    fn fail(&mut self, kind: FailureKind) -> ReplyOutcome {
        let message = Message::assistant(script::diagnostic_text(kind));
        self.messages.push(message.clone());
        self.phase = Phase::AwaitingUser;
        ReplyOutcome::Failed { kind, message }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            messages: self.messages.clone(),
            pending: self.is_pending(),
            finished: self.is_finished(),
            final_document: self.final_document.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
