//! Unit Tests for Alias Lookup and Expansion

use shellroute::alias::{expand_template, AliasTable};
use shellroute::config::Config;

fn table(marker: &str, entries: &[(&str, &str)]) -> AliasTable {
    let table = AliasTable::new(marker);
    for (name, template) in entries {
        table.set(name, template).unwrap();
    }
    table
}

#[test]
fn test_residual_is_single_spaced() {
    let aliases = table("%1", &[("g", "git %1")]);

    let found = aliases.resolve("g   commit    -m   x").unwrap();

    assert_eq!(found.name, "g");
    assert_eq!(found.residual, "commit -m x");
    assert_eq!(aliases.format(&found.value, &found.residual), "git commit -m x");
}

#[test]
fn test_custom_marker() {
    let aliases = table("{}", &[("find", "grep -rn {} .")]);

    let found = aliases.resolve("find needle").unwrap();

    assert_eq!(aliases.marker(), "{}");
    assert_eq!(aliases.format(&found.value, &found.residual), "grep -rn needle .");
}

#[test]
fn test_marker_appears_several_times() {
    assert_eq!(
        expand_template("cp %1 %1.bak", "%1", "notes.txt"),
        "cp notes.txt notes.txt.bak"
    );
}

#[test]
fn test_empty_residual_removes_marker() {
    assert_eq!(expand_template("ls %1", "%1", ""), "ls ");
    assert_eq!(expand_template("ls", "%1", "   "), "ls");
}

#[test]
fn test_longest_multi_word_name_wins() {
    let aliases = table(
        "%1",
        &[("git", "git"), ("git st", "git status -sb"), ("git st x", "nope")],
    );

    let found = aliases.resolve("git st --short").unwrap();
    assert_eq!(found.name, "git st");
    assert_eq!(found.residual, "--short");

    let found = aliases.resolve("git log").unwrap();
    assert_eq!(found.name, "git");
    assert_eq!(found.residual, "log");
}

#[test]
fn test_name_must_end_at_word_boundary() {
    let aliases = table("%1", &[("ls", "ls -la")]);

    assert!(aliases.resolve("lsblk").is_none());
    assert!(aliases.resolve("ls").is_some());
}

#[test]
fn test_names_are_normalized_on_set() {
    let aliases = AliasTable::default();

    aliases.set("  open   mail ", "thunderbird").unwrap();

    assert_eq!(aliases.get("open mail").as_deref(), Some("thunderbird"));
    assert!(aliases.set("a=b", "x").is_err());
    assert!(aliases.set("   ", "x").is_err());
}

#[test]
fn test_format_label_placeholders() {
    let aliases = AliasTable::default().with_label_format("[%A] %v (%a)");

    assert_eq!(aliases.format_label("up", "cd .."), "[up] cd .. (up)");
}

#[test]
fn test_table_from_config() {
    let mut config = Config::default();
    config.behavior.alias_param_marker = "$@".to_string();
    config.behavior.alias_content_format = "%a => %v".to_string();
    config.aliases.insert("say".to_string(), " echo $@ ".to_string());

    let aliases = AliasTable::from_config(&config).unwrap();

    assert_eq!(aliases.marker(), "$@");
    assert_eq!(aliases.get("say").as_deref(), Some("echo $@"));
    assert_eq!(aliases.format("echo $@", "hi"), "echo hi");
    assert_eq!(aliases.format_label("say", "echo hi"), "say => echo hi");
}
