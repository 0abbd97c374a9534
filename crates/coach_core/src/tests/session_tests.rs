use super::*;
use shared::domain::{Role, Sender};

fn external() -> SessionState {
    SessionState::begin("script", GreetingSource::External, "unused")
}

fn canned() -> SessionState {
    SessionState::begin("script", GreetingSource::Canned, "Hello there")
}

fn reply(text: &str) -> Result<Completion, CompletionError> {
    Ok(Completion::new(text))
}

#[test]
fn external_start_waits_for_the_model_with_instruction_only() {
    let mut state = external();
    assert_eq!(state.phase(), Phase::AwaitingModel);
    assert!(state.messages().is_empty());

    let request = state.take_greeting_request().expect("greeting request");
    assert_eq!(request.session_id, state.id());
    assert_eq!(request.transcript, vec![Turn::instruction("script")]);
    assert!(state.take_greeting_request().is_none());
}

#[test]
fn canned_start_greets_locally() {
    let mut state = canned();
    assert_eq!(state.phase(), Phase::AwaitingUser);
    assert!(state.take_greeting_request().is_none());
    assert_eq!(
        state.transcript(),
        &[Turn::instruction("script"), Turn::assistant("Hello there")]
    );
    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].sender, Sender::Assistant);
    assert_eq!(state.messages()[0].text, "Hello there");
}

#[test]
fn input_is_rejected_while_awaiting_model() {
    let mut state = external();
    assert!(state.accept_input("too early").is_none());
    assert!(state.messages().is_empty());
    assert_eq!(state.transcript().len(), 1);
}

#[test]
fn blank_input_is_rejected() {
    let mut state = canned();
    assert!(state.accept_input("").is_none());
    assert!(state.accept_input("  \n\t ").is_none());
    assert_eq!(state.phase(), Phase::AwaitingUser);
    assert_eq!(state.messages().len(), 1);
}

#[test]
fn typed_marker_never_reaches_the_display_or_transcript() {
    let mut state = canned();
    let request = state
        .accept_input("please finish [CURRICULUM_COMPLETE]")
        .expect("accepted");

    assert!(state
        .messages()
        .iter()
        .all(|m| !m.text.contains(script::COMPLETION_MARKER)));
    assert_eq!(state.messages().last().map(|m| m.text.as_str()), Some("please finish "));
    assert_eq!(request.transcript.last(), Some(&Turn::user("please finish ")));
    assert_eq!(state.phase(), Phase::AwaitingModel);
}

#[test]
fn input_that_is_only_a_marker_is_rejected() {
    let mut state = canned();
    assert!(state.accept_input(" [CURRICULUM_COMPLETE] ").is_none());
    assert_eq!(state.phase(), Phase::AwaitingUser);
    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.transcript().len(), 2);
}

#[test]
fn accepted_input_is_recorded_before_the_request_is_built() {
    let mut state = canned();
    let request = state.accept_input("Reducing plastic waste").expect("accepted");

    assert_eq!(state.phase(), Phase::AwaitingModel);
    assert_eq!(request.transcript.last(), Some(&Turn::user("Reducing plastic waste")));
    assert_eq!(request.transcript, state.transcript());
    assert_eq!(state.messages().last().map(|m| m.sender), Some(Sender::User));
    assert!(state.accept_input("second").is_none());
}

#[test]
fn plain_reply_is_shown_and_recorded() {
    let mut state = canned();
    state.accept_input("idea").expect("accepted");

    let outcome = state.apply_completion(reply("No marker here."));
    let ReplyOutcome::Continued { message } = outcome else {
        panic!("expected continued, got {outcome:?}");
    };
    assert_eq!(message.text, "No marker here.");
    assert!(!state.is_finished());
    assert_eq!(state.phase(), Phase::AwaitingUser);
    assert_eq!(state.transcript().last(), Some(&Turn::assistant("No marker here.")));
    assert_eq!(state.messages().last(), Some(&message));
}

#[test]
fn safety_flagged_reply_with_text_is_still_shown() {
    let mut state = canned();
    state.accept_input("idea").expect("accepted");

    let outcome = state.apply_completion(Ok(Completion {
        text: "A gentler framing.".to_string(),
        finish_reason: Some("SAFETY".to_string()),
    }));
    assert!(matches!(
        outcome,
        ReplyOutcome::Continued { ref message } if message.text == "A gentler framing."
    ));
    assert_eq!(state.phase(), Phase::AwaitingUser);
}

#[test]
fn marker_reply_finishes_without_a_message() {
    let mut state = canned();
    state.accept_input("idea").expect("accepted");
    let transcript_len = state.transcript().len();
    let message_count = state.messages().len();

    let outcome = state.apply_completion(reply("Plan text. [CURRICULUM_COMPLETE]"));
    assert_eq!(
        outcome,
        ReplyOutcome::Finished {
            document: "Plan text.".to_string()
        }
    );
    assert!(state.is_finished());
    assert_eq!(state.final_document(), Some("Plan text."));
    assert_eq!(state.transcript().len(), transcript_len);
    assert_eq!(state.messages().len(), message_count);
    assert!(state.accept_input("more").is_none());
}

#[test]
fn marker_only_reply_is_treated_as_empty() {
    let mut state = canned();
    state.accept_input("idea").expect("accepted");

    let outcome = state.apply_completion(reply("  [CURRICULUM_COMPLETE]  "));
    assert!(matches!(
        outcome,
        ReplyOutcome::Failed {
            kind: FailureKind::NoContent,
            ..
        }
    ));
    assert!(!state.is_finished());
    assert!(state.final_document().is_none());
}

#[test]
fn failure_appends_one_diagnostic_and_keeps_transcript() {
    let mut state = canned();
    state.accept_input("idea").expect("accepted");
    let transcript_before = state.transcript().to_vec();
    let messages_before = state.messages().len();

    let outcome = state.apply_completion(Err(CompletionError::Transport("refused".into())));
    let ReplyOutcome::Failed { kind, message } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::Connection);
    assert_eq!(message.text, script::CONNECTION_DIAGNOSTIC);
    assert_eq!(state.transcript(), transcript_before.as_slice());
    assert_eq!(state.messages().len(), messages_before + 1);
    assert_eq!(state.phase(), Phase::AwaitingUser);
}

#[test]
fn diagnostics_follow_the_failure_kind() {
    let cases = [
        (
            CompletionError::Blocked {
                reason: "SAFETY".into(),
            },
            script::SAFETY_DIAGNOSTIC,
        ),
        (CompletionError::NoContent, script::NO_CONTENT_DIAGNOSTIC),
        (
            CompletionError::Status {
                status: 403,
                body: "denied".into(),
            },
            script::CONNECTION_DIAGNOSTIC,
        ),
    ];

    for (err, expected) in cases {
        let mut state = canned();
        state.accept_input("idea").expect("accepted");
        match state.apply_completion(Err(err)) {
            ReplyOutcome::Failed { message, .. } => assert_eq!(message.text, expected),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}

#[test]
fn unexpected_reply_is_ignored() {
    let mut state = canned();
    assert_eq!(state.apply_completion(reply("stray")), ReplyOutcome::Ignored);
    assert_eq!(state.messages().len(), 1);
}

#[test]
fn instruction_turn_stays_first_and_unique() {
    let mut state = external();
    state.take_greeting_request().expect("greeting");
    state.apply_completion(reply("Welcome"));
    for round in 0..3 {
        let request = state.accept_input(&format!("answer {round}")).expect("accepted");
        assert_eq!(request.transcript[0], Turn::instruction("script"));
        assert_eq!(
            request
                .transcript
                .iter()
                .filter(|turn| turn.role == Role::Instruction)
                .count(),
            1
        );
        state.apply_completion(reply(&format!("question {round}")));
    }
    assert!(state
        .messages()
        .iter()
        .all(|message| message.text != "script"));
}

#[test]
fn view_reflects_pending_and_finished_flags() {
    let mut state = canned();
    let view = state.view();
    assert!(!view.pending);
    assert!(!view.finished);

    state.accept_input("idea").expect("accepted");
    assert!(state.view().pending);

    state.apply_completion(reply("Done [CURRICULUM_COMPLETE]"));
    let view = state.view();
    assert!(!view.pending);
    assert!(view.finished);
    assert_eq!(view.final_document.as_deref(), Some("Done"));
}
