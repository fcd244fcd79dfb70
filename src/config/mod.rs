//! Configuration management for shellroute
//!
//! This module provides the configuration model read by the dispatcher and
//! its reference collaborators: dispatch behavior switches, output colors,
//! the shell backend, seed aliases, application groups and the application
//! list. Loading and validation live in [`loader`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::models::Color;

/// Main configuration structure for shellroute
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional alias file (`name=template` lines) backing the alias table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases_file: Option<PathBuf>,

    /// Dispatch behavior
    pub behavior: BehaviorConfig,

    /// Output colors
    pub theme: ThemeConfig,

    /// Shell backend configuration
    pub shell: ShellConfig,

    /// Seed aliases (name -> template)
    pub aliases: BTreeMap<String, String>,

    /// Application groups
    pub groups: Vec<GroupConfig>,

    /// Known applications
    pub apps: Vec<AppConfig>,
}

/// Dispatch behavior switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Echo a preview line when an alias is expanded
    pub show_alias_content: bool,

    /// Echo a formatted line for every application launch
    pub show_launch_history: bool,

    /// Separator for several commands on one line (empty disables splitting)
    pub multiple_cmd_separator: String,

    /// Launch history template (`%a` class, `%p` package, `%l` label, `%n` newline, `%t` time)
    pub app_launch_format: String,

    /// Placeholder replaced by the residual input in alias templates
    pub alias_param_marker: String,

    /// Alias preview template (`%a` alias name, `%v` expanded input)
    pub alias_content_format: String,

    /// chrono format used for `%t` in launch history
    pub time_format: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            show_alias_content: false,
            show_launch_history: true,
            multiple_cmd_separator: ";".to_string(),
            app_launch_format: "-->%l".to_string(),
            alias_param_marker: "%1".to_string(),
            alias_content_format: "%a --> [%v]".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

/// Output colors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color of alias preview lines
    pub alias_content_color: Color,

    /// Color of launch history lines
    pub output_color: Color,

    /// Color of the time shown in the interactive prompt
    pub time_color: Color,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            alias_content_color: Color::rgb(0x14, 0x9F, 0xF0),
            output_color: Color::rgb(0xFF, 0xFF, 0xFF),
            time_color: Color::rgb(0x03, 0xA9, 0xF4),
        }
    }
}

/// Shell backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell executable
    pub program: PathBuf,

    /// Arguments passed to the shell executable
    pub args: Vec<String>,

    /// How long teardown waits for the shell to exit
    pub terminate_timeout_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("sh"),
            args: Vec::new(),
            terminate_timeout_ms: 5000,
        }
    }
}

/// A named group of applications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name, typed as the first word of a command
    pub name: String,

    /// Member application labels, in listing order
    #[serde(default)]
    pub members: Vec<String>,
}

/// An application known to the configured registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Label typed by the user
    pub label: String,

    /// Package identifier
    #[serde(default)]
    pub package: String,

    /// Entry point identifier
    #[serde(default)]
    pub activity: String,

    /// Command line run on launch; apps without one cannot be launched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,

    /// Hidden apps are not matched by label
    #[serde(default)]
    pub hidden: bool,
}
