//! Scripted console sessions driven through `GameSession::run`.
//!
//! The narrator is a `ScriptedNarrator`, so these tests make no network
//! calls. Request lengths count the turns handed to the narrator per call.

use std::future::pending;
use tides_core::prompts::{
    EMPTY_INPUT_HINT, HANGUP_FAREWELL, INPUT_PROMPT, NEW_LOOP_PROMPT, QUIT_FAREWELL,
    RESTART_NOTICE,
};
use tides_core::{GameSession, ScriptedNarrator, SessionError, SessionState};
use tokio::io::BufReader;

/// Run a session over `input` and return it with everything it printed.
async fn play(
    narrator: ScriptedNarrator,
    input: &str,
) -> (GameSession<ScriptedNarrator>, String, Result<(), SessionError>) {
    let mut session = GameSession::new(narrator);
    let mut out = Vec::new();
    let result = session.run(input.as_bytes(), &mut out, pending()).await;
    (session, String::from_utf8(out).unwrap(), result)
}

#[tokio::test]
async fn test_fresh_start_look_restart_quit() {
    let narrator = ScriptedNarrator::new(["INTRO TEXT", "LOOK TEXT", "NEW LOOP TEXT"]);

    let (session, output, result) =
        play(narrator, "look around\n/restart\n/quit\nnever read\n").await;

    result.unwrap();
    assert_eq!(session.narrator().request_lengths(), vec![1, 3, 1]);
    assert_eq!(
        session.narrator().transcripts()[2].turns()[0].text(),
        NEW_LOOP_PROMPT
    );
    assert_eq!(session.state(), SessionState::Terminated);

    let intro = output.find("INTRO TEXT").unwrap();
    let look = output.find("LOOK TEXT").unwrap();
    let notice = output.find(RESTART_NOTICE).unwrap();
    let new_loop = output.find("NEW LOOP TEXT").unwrap();
    let farewell = output.find(QUIT_FAREWELL).unwrap();
    assert!(intro < look && look < notice && notice < new_loop && new_loop < farewell);

    // No prompt after the farewell.
    assert!(!output[farewell..].contains(INPUT_PROMPT));
}

#[tokio::test]
async fn test_nth_request_carries_two_n_plus_one_turns() {
    let actions = ["wake", "stand", "walk to the pier", "repair the lamp", "sail"];
    let input: String = actions.iter().map(|a| format!("{a}\n")).collect();

    let (session, _, result) = play(ScriptedNarrator::default(), &input).await;

    result.unwrap();
    let lengths = session.narrator().request_lengths();
    assert_eq!(lengths[0], 1);
    for n in 1..=actions.len() {
        assert_eq!(lengths[n], 2 * n + 1, "request for action {n}");
    }
    assert!(session.transcript().is_alternating());
    assert_eq!(session.transcript().len(), 2 * actions.len() + 2);
}

#[tokio::test]
async fn test_restart_after_long_loop_sends_single_turn() {
    let input = "a\nb\nc\nd\nnew game\n";

    let (session, _, result) = play(ScriptedNarrator::default(), input).await;

    result.unwrap();
    assert_eq!(
        session.narrator().request_lengths(),
        vec![1, 3, 5, 7, 9, 1]
    );
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn test_empty_lines_only_print_hint() {
    let (session, output, result) = play(ScriptedNarrator::new(["intro"]), "\n   \n/quit\n").await;

    result.unwrap();
    assert_eq!(session.narrator().call_count(), 1);
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(output.matches(EMPTY_INPUT_HINT).count(), 2);
}

#[tokio::test]
async fn test_quit_is_case_insensitive() {
    for quit in ["EXIT", "Quit", "/QUIT"] {
        let (session, output, result) =
            play(ScriptedNarrator::new(["intro"]), &format!("{quit}\nlook\n")).await;

        result.unwrap();
        assert_eq!(session.narrator().call_count(), 1, "{quit}");
        assert!(output.contains(QUIT_FAREWELL));
    }
}

#[tokio::test]
async fn test_end_of_input_says_goodbye() {
    let (session, output, result) = play(ScriptedNarrator::new(["intro", "reply"]), "listen").await;

    result.unwrap();
    assert!(session.is_terminated());
    assert!(output.contains("reply"));
    assert!(output.trim_end().ends_with(HANGUP_FAREWELL));
}

#[tokio::test]
async fn test_interrupt_while_waiting_ends_session() {
    // Keep the writer half alive so reading blocks instead of hitting EOF.
    let (_writer, reader) = tokio::io::duplex(64);
    let mut session = GameSession::new(ScriptedNarrator::new(["intro"]));
    let mut out = Vec::new();

    session
        .run(BufReader::new(reader), &mut out, async {})
        .await
        .unwrap();

    let output = String::from_utf8(out).unwrap();
    assert!(session.is_terminated());
    assert!(output.contains(HANGUP_FAREWELL));
    assert_eq!(session.narrator().call_count(), 1);
}

#[tokio::test]
async fn test_service_failure_stops_reading_input() {
    let narrator = ScriptedNarrator::new(["intro"]).then_fail("API key not valid");

    let (session, output, result) = play(narrator, "look\nlook again\n/quit\n").await;

    let err = result.unwrap_err();
    assert!(matches!(err, SessionError::Narrator(_)));
    assert!(err.to_string().contains("API key not valid"));
    assert_eq!(session.narrator().call_count(), 2);
    assert!(!output.contains(QUIT_FAREWELL));
}

#[tokio::test]
async fn test_failed_intro_returns_error() {
    let (session, _, result) = play(ScriptedNarrator::failing("unreachable"), "look\n").await;

    assert!(result.is_err());
    assert_eq!(session.narrator().call_count(), 1);
}

#[tokio::test]
async fn test_interrupt_during_narration_abandons_call() {
    let narrator = ScriptedNarrator::new(["intro"]).then_hang();
    let hung = narrator.hang_signal();
    let mut session = GameSession::new(narrator);
    let mut out = Vec::new();

    let result = session
        .run(
            "look around\n/quit\n".as_bytes(),
            &mut out,
            async move { hung.notified().await },
        )
        .await;

    let output = String::from_utf8(out).unwrap();
    assert!(matches!(result, Err(SessionError::Interrupted)));
    assert_eq!(session.narrator().call_count(), 2);
    // The abandoned action left the transcript as it was.
    assert_eq!(session.transcript().len(), 2);
    assert!(!output.contains(QUIT_FAREWELL));
    assert!(!output.contains(HANGUP_FAREWELL));
    assert_eq!(output.matches(INPUT_PROMPT).count(), 1);
}
