//! Contract Tests for the Resolver Chain
//!
//! Contract: every sub-command is offered to Group, Alias, Command, App and
//! Shell in that order, and exactly one of them claims it.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use shellroute::config::Config;
use shellroute::dispatch::Trigger;
use shellroute::GroupRegistry;
use std::sync::Arc;
use test_utils::{Harness, MockApps, MockShell, RecordingGroup, RecordingParser};

#[test]
fn test_chain_order_is_fixed() {
    assert_eq!(
        Trigger::CHAIN,
        [
            Trigger::Group,
            Trigger::Alias,
            Trigger::Command,
            Trigger::App,
            Trigger::Shell
        ]
    );
    let names: Vec<_> = Trigger::CHAIN.iter().map(|t| t.to_string()).collect();
    assert_eq!(names, vec!["group", "alias", "command", "app", "shell"]);
}

/// Every resolver knows the word "same"; the earliest one must win
#[tokio::test]
async fn test_earlier_resolver_wins() {
    let mut config = Config::default();
    config.aliases.insert("same".to_string(), "run aliased".to_string());
    let parser = Arc::new(RecordingParser::new());
    let registered = parser.clone();
    let group = Arc::new(RecordingGroup::new("same", &["x"], true));
    let group_handle = group.clone();

    let h = Harness::build(
        config,
        MockApps::new().with_app("same", true),
        MockShell::new(),
        move |builder| {
            let groups = GroupRegistry::new();
            groups.register(group_handle).unwrap();
            builder.parser(registered).groups(Arc::new(groups))
        },
    );

    let report = h.dispatch("same");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Group)]);
    assert!(parser.offered().is_empty());
    assert!(h.apps.launched().is_empty());
    assert_eq!(h.shell.count(), 0);
}

#[tokio::test]
async fn test_command_before_app() {
    let parser = Arc::new(RecordingParser::new());
    let registered = parser.clone();
    let h = Harness::build(
        Config::default(),
        MockApps::new().with_app("run", true),
        MockShell::new(),
        move |builder| builder.parser(registered),
    );

    let report = h.dispatch("run");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Command)]);
    assert!(h.apps.launched().is_empty());
}

#[tokio::test]
async fn test_each_sub_command_offered_once() {
    let parser = Arc::new(RecordingParser::new());
    let registered = parser.clone();
    let h = Harness::build(
        Config::default(),
        MockApps::new(),
        MockShell::new(),
        move |builder| builder.parser(registered),
    );

    let report = h.dispatch("a; run b;; c ;");

    assert_eq!(parser.offered(), vec!["a", "run b", "c"]);
    let inputs: Vec<_> = report.outcomes.iter().map(|o| o.input.as_str()).collect();
    assert_eq!(inputs, vec!["a", "run b", "c"]);
    assert!(h.shell.wait_for_submissions(2).await);
    let mut texts = h.shell.texts();
    texts.sort();
    assert_eq!(texts, vec!["a", "c"]);
}

#[tokio::test]
async fn test_empty_input_reaches_nothing() {
    let h = Harness::new(Config::default());

    let report = h.dispatch("   ");

    assert!(report.outcomes.is_empty());
    assert!(!report.redirected);
    tokio::task::yield_now().await;
    assert_eq!(h.shell.count(), 0);
}

#[tokio::test]
async fn test_matched_alias_never_falls_through() {
    let mut config = Config::default();
    config.aliases.insert("oops".to_string(), "bad %1".to_string());
    let parser = Arc::new(RecordingParser::new());
    let registered = parser.clone();
    let h = Harness::build(config, MockApps::new(), MockShell::new(), move |builder| {
        builder.parser(registered)
    });

    let report = h.dispatch("oops arg");

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Alias)]);
    let expansion = report.outcomes[0].expansion.as_ref().unwrap();
    assert_eq!(expansion.outcomes[0].input, "bad arg");
    assert_eq!(expansion.errors().len(), 1);
    tokio::task::yield_now().await;
    assert_eq!(h.shell.count(), 0);
}

#[tokio::test]
async fn test_multi_word_alias_takes_precedence() {
    let mut config = Config::default();
    config.aliases.insert("open".to_string(), "xdg-open".to_string());
    config
        .aliases
        .insert("open mail".to_string(), "thunderbird".to_string());
    let h = Harness::new(config);

    h.dispatch("open mail");
    h.dispatch("open notes.txt");

    assert!(h.shell.wait_for_submissions(2).await);
    let mut texts = h.shell.texts();
    texts.sort();
    assert_eq!(texts, vec!["thunderbird", "xdg-open notes.txt"]);
}

#[tokio::test]
async fn test_alias_origin_is_not_reexpanded() {
    let mut config = Config::default();
    config.aliases.insert("ls".to_string(), "ls --color".to_string());
    let h = Harness::new(config);

    let report = h.dispatcher.dispatch("ls --color", Some("ls"));

    assert_eq!(report.claimed_by(), vec![Some(Trigger::Shell)]);
    assert!(h.shell.wait_for_submissions(1).await);
    assert_eq!(h.shell.texts(), vec!["ls --color"]);
}
