//! Integration Tests for Redirection
//!
//! While a multi-turn prompt is active every line goes to it, bypassing
//! splitting and the resolver chain.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use shellroute::config::Config;
use shellroute::error::Error;
use shellroute::context::ExecutionContext;
use shellroute::redirect::{RedirectHandler, RedirectObjects, RedirectReply, RedirectionSession};
use std::sync::Arc;
use test_utils::mock_collaborators::EchoUntilDone;
use test_utils::{Harness, MockApps, MockShell, RecordingParser};

fn harness(config: Config) -> (Harness, Arc<RecordingParser>) {
    let parser = Arc::new(RecordingParser::new());
    let registered = parser.clone();
    let h = Harness::build(config, MockApps::new(), MockShell::new(), move |builder| {
        builder.parser(registered)
    });
    (h, parser)
}

/// Start the scripted prompt and wait until it is installed
async fn start_prompt(h: &mut Harness) {
    h.dispatch("ask");
    let seen = h.output.wait_for(|text| text == "asking").await;
    assert_eq!(seen.last().map(String::as_str), Some("asking"));
    assert!(h.dispatcher.is_redirecting());
}

#[tokio::test]
async fn test_active_session_captures_input() {
    let mut config = Config::default();
    config
        .aliases
        .insert("hello".to_string(), "world".to_string());
    let (mut h, parser) = harness(config);
    start_prompt(&mut h).await;

    let report = h.dispatch("hello");

    assert!(report.redirected);
    assert!(report.outcomes.is_empty());
    let snapshot = h.dispatcher.redirection_snapshot().unwrap();
    assert_eq!(snapshot.after, vec!["hello".to_string()]);
    assert_eq!(h.output.texts(), vec!["heard hello"]);
    assert_eq!(parser.offered(), vec!["ask"]);
    assert_eq!(h.shell.count(), 0);
}

#[tokio::test]
async fn test_session_input_is_not_split() {
    let (mut h, parser) = harness(Config::default());
    start_prompt(&mut h).await;

    h.dispatch("  one ;   two ");

    let snapshot = h.dispatcher.redirection_snapshot().unwrap();
    assert_eq!(snapshot.after, vec!["one ; two".to_string()]);
    assert_eq!(parser.offered(), vec!["ask"]);
}

#[tokio::test]
async fn test_session_ends_and_chain_resumes() {
    let (mut h, parser) = harness(Config::default());
    start_prompt(&mut h).await;
    assert_eq!(h.hooks.started(), 1);

    h.dispatch("done");
    assert_eq!(h.output.texts(), vec!["finished"]);
    assert!(!h.dispatcher.is_redirecting());
    assert_eq!(h.hooks.ended(), 1);

    let report = h.dispatch("run again");
    assert!(!report.redirected);
    assert_eq!(parser.offered(), vec!["ask", "run again"]);
}

#[tokio::test]
async fn test_permission_denied_cleans_up() {
    let (mut h, _parser) = harness(Config::default());
    start_prompt(&mut h).await;
    h.dispatch("first");

    assert!(h.dispatcher.permission_denied());
    assert!(h.dispatcher.redirection_snapshot().is_none());
    assert!(!h.dispatcher.permission_denied());
    assert_eq!(h.hooks.ended(), 1);

    h.dispatch("ls");
    assert!(h.shell.wait_for_submissions(1).await);
}

#[tokio::test]
async fn test_waiting_session_skips_capture_until_granted() {
    let (h, _parser) = harness(Config::default());
    let redirector = h.dispatcher.context().redirector();
    redirector
        .prepare(RedirectionSession::new(EchoUntilDone).waiting_for_permission())
        .unwrap();

    h.dispatch("early");
    let snapshot = h.dispatcher.redirection_snapshot().unwrap();
    assert!(snapshot.waiting_permission);
    assert!(snapshot.after.is_empty());

    assert!(h.dispatcher.permission_granted());
    h.dispatch("late");
    let snapshot = h.dispatcher.redirection_snapshot().unwrap();
    assert!(!snapshot.waiting_permission);
    assert_eq!(snapshot.after, vec!["late".to_string()]);
}

#[tokio::test]
async fn test_second_session_is_rejected() {
    let (h, _parser) = harness(Config::default());
    let redirector = h.dispatcher.context().redirector();

    redirector
        .prepare(RedirectionSession::new(EchoUntilDone))
        .unwrap();
    let second = redirector.prepare(RedirectionSession::new(EchoUntilDone));

    assert!(matches!(second, Err(Error::RedirectionActive)));
}

#[tokio::test]
async fn test_alias_clear_confirmation_flow() {
    let mut config = Config::default();
    config.aliases.insert("a".to_string(), "1".to_string());
    config.aliases.insert("b".to_string(), "2".to_string());
    let mut h = Harness::new(config);

    h.dispatch("alias clear");
    let seen = h.output.wait_for(|text| text.starts_with("Remove all")).await;
    assert_eq!(
        seen.last().map(String::as_str),
        Some("Remove all 2 aliases? [y/n]")
    );

    h.dispatch("perhaps");
    assert_eq!(h.output.texts(), vec!["Please answer y or n"]);

    h.dispatch("y");
    assert_eq!(h.output.texts(), vec!["Removed 2 aliases"]);
    assert!(h.dispatcher.context().aliases().is_empty());
}

#[tokio::test]
async fn test_back_gesture_cancels_prompt() {
    let mut config = Config::default();
    config.aliases.insert("a".to_string(), "1".to_string());
    let mut h = Harness::new(config);

    h.dispatch("alias clear");
    h.output.wait_for(|text| text.starts_with("Remove all")).await;

    h.dispatcher.on_long_back();
    let injected = h.injected.try_recv().unwrap();
    let report = h.dispatch(&injected);

    assert!(report.redirected);
    assert_eq!(h.output.texts(), vec!["Cancelled"]);
    assert_eq!(h.dispatcher.context().aliases().len(), 1);
}

#[tokio::test]
async fn test_alias_add_prompt_flow() {
    let mut h = Harness::new(Config::default());

    h.dispatch("alias add up");
    h.output.wait_for(|text| text.starts_with("Template for")).await;
    let snapshot = h.dispatcher.redirection_snapshot().unwrap();
    assert_eq!(snapshot.before, vec!["up".to_string()]);
    assert_eq!(snapshot.hint.as_deref(), Some("alias template"));

    h.dispatch("cd ..; ls");
    assert_eq!(h.output.texts(), vec!["Alias 'up' set"]);
    assert_eq!(
        h.dispatcher.context().aliases().get("up").as_deref(),
        Some("cd ..; ls")
    );
}

struct PanickingPrompt;

impl RedirectHandler for PanickingPrompt {
    fn on_redirect(
        &mut self,
        _objects: &mut RedirectObjects,
        _context: &ExecutionContext,
    ) -> RedirectReply {
        panic!("prompt bug");
    }
}

#[tokio::test]
async fn test_panicking_prompt_leaves_dispatcher_usable() {
    let (mut h, _parser) = harness(Config::default());
    h.dispatcher
        .context()
        .redirector()
        .prepare(RedirectionSession::new(PanickingPrompt))
        .unwrap();

    let report = h.dispatch("anything");

    assert!(report.redirected);
    assert_eq!(
        h.output.texts(),
        vec!["Interactive prompt aborted unexpectedly"]
    );
    assert!(!h.dispatcher.is_redirecting());
    assert_eq!(h.hooks.ended(), 1);

    let report = h.dispatch("ls");
    assert!(!report.redirected);
    assert!(h.shell.wait_for_submissions(1).await);
    h.dispatch("ask");
    let seen = h.output.wait_for(|text| text == "asking").await;
    assert_eq!(seen.last().map(String::as_str), Some("asking"));
}
