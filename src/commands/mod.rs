//! Structured commands
//!
//! A [`CommandParser`] turns one sub-command into an executable
//! [`Command`] or reports that it does not recognize it. The dispatcher runs
//! recognized commands on a background task and emits whatever text they
//! return. [`BuiltinParser`] provides the built-in command set.

pub mod builtin;

pub use builtin::BuiltinParser;

use async_trait::async_trait;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::Result;

/// An executable structured command
#[async_trait]
pub trait Command: Send {
    /// Command name, used in logs and panic reports
    fn name(&self) -> &str;

    /// Run the command, returning text to emit
    async fn execute(self: Box<Self>, context: Arc<ExecutionContext>) -> Result<Option<String>>;
}

/// Parser for the structured command set
pub trait CommandParser: Send + Sync {
    /// Parse one sub-command
    ///
    /// `Ok(None)` means the input is not a structured command. An error
    /// means the input named a command but could not be parsed.
    fn parse(
        &self,
        input: &str,
        context: &ExecutionContext,
        lenient: bool,
    ) -> Result<Option<Box<dyn Command>>>;
}
