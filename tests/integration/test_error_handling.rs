//! Integration Tests for Error Handling
//!
//! No failure is fatal: errors are emitted as text and the dispatcher keeps
//! working.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use shellroute::config::Config;
use shellroute::dispatch::{Trigger, MAX_ALIAS_DEPTH};
use shellroute::GroupRegistry;
use std::sync::Arc;
use test_utils::{FailingGroup, Harness, MockApps, MockShell, RecordingParser};

fn harness_with_parser(config: Config) -> (Harness, Arc<RecordingParser>) {
    let parser = Arc::new(RecordingParser::new());
    let registered = parser.clone();
    let h = Harness::build(config, MockApps::new(), MockShell::new(), move |builder| {
        builder.parser(registered)
    });
    (h, parser)
}

#[tokio::test]
async fn test_error_in_middle_sub_command_is_isolated() {
    let (mut h, parser) = harness_with_parser(Config::default());

    let report = h.dispatch("run a; bad x; run c");

    assert_eq!(
        report.claimed_by(),
        vec![Some(Trigger::Command), Some(Trigger::Command), Some(Trigger::Command)]
    );
    assert_eq!(
        report.errors(),
        vec!["Invalid arguments for 'bad'. Usage: bad ARG"]
    );
    assert!(report.outcomes[1].error.is_some());
    assert!(report.outcomes[2].error.is_none());

    assert!(parser.wait_for_executions(2).await);
    let mut executed = parser.executed();
    executed.sort();
    assert_eq!(executed, vec!["run a", "run c"]);

    let mut seen = Vec::new();
    while seen.len() < 3 {
        match h.output.next().await {
            Some(event) => seen.push(event.text().to_string()),
            None => break,
        }
    }
    assert!(seen.contains(&"Invalid arguments for 'bad'. Usage: bad ARG".to_string()));
    assert!(seen.contains(&"ran run a".to_string()));
    assert!(seen.contains(&"ran run c".to_string()));
}

#[tokio::test]
async fn test_parse_error_does_not_fall_through() {
    let (h, _parser) = harness_with_parser(Config::default());

    let report = h.dispatch("bad");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Command)]);
    tokio::task::yield_now().await;
    assert_eq!(h.shell.count(), 0);
}

#[tokio::test]
async fn test_execution_failure_is_emitted() {
    let (mut h, _parser) = harness_with_parser(Config::default());

    let report = h.dispatch("fail now");
    assert!(report.errors().is_empty());

    let seen = h.output.wait_for(|text| text.contains("requested failure")).await;
    assert_eq!(
        seen.last().map(String::as_str),
        Some("Command 'fail now' failed: requested failure")
    );

    h.dispatch("run after");
    let seen = h.output.wait_for(|text| text == "ran run after").await;
    assert!(!seen.is_empty());
}

#[tokio::test]
async fn test_panicking_command_is_contained() {
    let (mut h, _parser) = harness_with_parser(Config::default());

    h.dispatch("panic");
    let seen = h.output.wait_for(|text| text.contains("aborted")).await;
    assert_eq!(
        seen.last().map(String::as_str),
        Some("Command 'scripted' aborted unexpectedly")
    );

    h.dispatch("run still alive");
    let seen = h.output.wait_for(|text| text == "ran run still alive").await;
    assert!(!seen.is_empty());
}

#[tokio::test]
async fn test_group_error_claims_sub_command() {
    let mut h = Harness::build(
        Config::default(),
        MockApps::new(),
        MockShell::new(),
        |builder| {
            let groups = GroupRegistry::new();
            groups.register(Arc::new(FailingGroup::new("broken"))).unwrap();
            builder.groups(Arc::new(groups))
        },
    );

    let report = h.dispatch("broken thing; ls");

    assert_eq!(
        report.claimed_by(),
        vec![Some(Trigger::Group), Some(Trigger::Shell)]
    );
    assert_eq!(
        h.output.texts(),
        vec!["Group 'broken' failed: cannot handle 'thing'"]
    );
    assert!(h.shell.wait_for_submissions(1).await);
    assert_eq!(h.shell.texts(), vec!["ls"]);
}

#[tokio::test]
async fn test_launch_failure_is_emitted() {
    let mut config = Config::default();
    config.behavior.show_launch_history = false;
    let mut h = Harness::build(
        config,
        MockApps::new().with_app("Camera", true).failing_launch(),
        MockShell::new(),
        |builder| builder,
    );

    let report = h.dispatch("Camera");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::App)]);
    assert_eq!(
        h.output.texts(),
        vec!["Failed to launch 'Camera': mock launch failure"]
    );
}

#[tokio::test]
async fn test_rejected_shell_submission_is_emitted() {
    let mut h = Harness::build(
        Config::default(),
        MockApps::new(),
        MockShell::rejecting(),
        |builder| builder,
    );

    let report = h.dispatch("ls");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Shell)]);
    let seen = h.output.wait_for(|text| text.starts_with("Failed to submit")).await;
    assert_eq!(
        seen.last().map(String::as_str),
        Some("Failed to submit 'ls' to the shell: mock shell rejects submissions")
    );
}

#[tokio::test]
async fn test_alias_expansion_depth_is_bounded() {
    let mut config = Config::default();
    for i in 0..=MAX_ALIAS_DEPTH {
        config
            .aliases
            .insert(format!("step{}", i), format!("step{}", i + 1));
    }
    let mut h = Harness::new(config);

    h.dispatch("step0");

    let texts = h.output.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("expands too deeply"));
    tokio::task::yield_now().await;
    assert_eq!(h.shell.count(), 0);
}

#[tokio::test]
async fn test_missing_alias_removal_is_reported() {
    let mut h = Harness::new(Config::default());

    h.dispatch("alias rm nope");

    let seen = h.output.wait_for(|text| text.contains("nope")).await;
    assert_eq!(seen.last().map(String::as_str), Some("Alias 'nope' not found"));
}

#[tokio::test]
async fn test_builtin_usage_error_is_reported() {
    let mut h = Harness::new(Config::default());

    let report = h.dispatch("alias frobnicate");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Command)]);
    let texts = h.output.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Invalid arguments for 'alias'"));
}
