//! Shell collaborator
//!
//! Lines no other resolver claims are forwarded to an underlying OS shell.
//! The dispatcher only needs to hand a command over, optionally tagged with
//! a numeric code and a completion callback, and to stop the shell during
//! teardown. [`InteractiveShell`] is the reference backend: one long-lived
//! `sh` process fed through a single worker task.

pub mod interactive;

pub use interactive::InteractiveShell;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Code attached to change-directory submissions
pub const CD_CODE: i32 = 10;

/// Code attached to the working-directory query that follows a `cd`
pub const PWD_CODE: i32 = 11;

/// Keyword requesting elevated privileges
pub const PRIVILEGE_KEYWORD: &str = "su";

/// Completion report for a submitted command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellResult {
    /// Code the command was submitted with
    pub code: Option<i32>,
    /// Exit status reported by the shell
    pub exit_code: i32,
    /// Output lines printed by the command
    pub output: Vec<String>,
}

/// Callback invoked once a submitted command completes
pub type ResultCallback = Arc<dyn Fn(ShellResult) + Send + Sync>;

/// A command handed to the shell
#[derive(Clone)]
pub struct ShellCommand {
    /// Command line, forwarded verbatim
    pub text: String,
    /// Optional code echoed back in the result
    pub code: Option<i32>,
    /// Optional completion callback
    pub on_result: Option<ResultCallback>,
}

impl ShellCommand {
    /// Plain command with no code and no callback
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
            on_result: None,
        }
    }

    /// Command tagged with a code whose completion is reported to `callback`
    pub fn with_result(text: impl Into<String>, code: i32, callback: ResultCallback) -> Self {
        Self {
            text: text.into(),
            code: Some(code),
            on_result: Some(callback),
        }
    }

    /// Whether the command expects a completion report
    pub fn wants_result(&self) -> bool {
        self.on_result.is_some()
    }
}

impl fmt::Debug for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellCommand")
            .field("text", &self.text)
            .field("code", &self.code)
            .field("on_result", &self.on_result.is_some())
            .finish()
    }
}

/// Underlying shell collaborator
#[async_trait]
pub trait ShellBackend: Send + Sync {
    /// Queue a command; returns as soon as it is queued
    fn submit(&self, command: ShellCommand) -> Result<()>;

    /// Whether a privilege-escalation binary is available
    fn is_privilege_available(&self) -> bool;

    /// Stop the shell and any outstanding work
    async fn terminate(&self) -> Result<()>;
}

/// Classification of a line bound for the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellLineKind {
    /// The privilege-escalation keyword on its own
    Privilege,
    /// A line containing a change-directory command
    ChangeDirectory,
    /// Anything else
    Plain,
}

/// Classify a line the way shell passthrough treats it
pub fn classify(input: &str) -> ShellLineKind {
    if input.trim().eq_ignore_ascii_case(PRIVILEGE_KEYWORD) {
        ShellLineKind::Privilege
    } else if input.contains("cd ") {
        ShellLineKind::ChangeDirectory
    } else {
        ShellLineKind::Plain
    }
}
