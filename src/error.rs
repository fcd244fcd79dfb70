//! Error types and Result aliases for shellroute

use std::path::PathBuf;

/// Result type alias for shellroute operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shellroute
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Alias errors ===
    /// Alias not present in the table
    #[error("Alias '{name}' not found")]
    AliasNotFound { name: String },

    /// Alias name is empty or contains the separator character
    #[error("Invalid alias name '{name}': {reason}")]
    InvalidAliasName { name: String, reason: String },

    /// Alias expansion nested too deeply
    #[error("Alias '{name}' expands too deeply (limit {limit})")]
    AliasExpansionTooDeep { name: String, limit: usize },

    /// Failed to read or write the alias file
    #[error("Failed to access alias file '{}': {reason}", path.display())]
    AliasFileFailed { path: PathBuf, reason: String },

    // === Group errors ===
    /// A group with the same name is already registered
    #[error("Group '{name}' is already registered")]
    DuplicateGroup { name: String },

    /// A group rejected its sub-command input
    #[error("Group '{name}' failed: {reason}")]
    GroupFailed { name: String, reason: String },

    // === Command errors ===
    /// Structured command recognized but its arguments are wrong
    #[error("Invalid arguments for '{command}'. Usage: {usage}")]
    InvalidArguments { command: String, usage: String },

    /// Structured command failed while executing
    #[error("Command '{command}' failed: {reason}")]
    CommandExecutionFailed { command: String, reason: String },

    /// Structured command panicked on its background task
    #[error("Command '{command}' aborted unexpectedly")]
    CommandPanicked { command: String },

    // === Launch errors ===
    /// Application launch was resolved but could not be performed
    #[error("Failed to launch '{label}': {reason}")]
    LaunchFailed { label: String, reason: String },

    // === Shell errors ===
    /// Shell backend refused or lost a submitted command
    #[error("Failed to submit '{command}' to the shell: {reason}")]
    ShellSubmitFailed { command: String, reason: String },

    /// Shell backend is no longer running
    #[error("Shell is not running")]
    ShellNotRunning,

    /// Shell backend could not be stopped during teardown
    #[error("Failed to stop the shell: {reason}")]
    ShellTeardownFailed { reason: String },

    // === Redirection errors ===
    /// A redirection session is already active
    #[error("Another interactive prompt is already active")]
    RedirectionActive,

    /// A redirection handler panicked; its session was ended
    #[error("Interactive prompt aborted unexpectedly")]
    RedirectionPanicked,

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Color value is not `#RRGGBB` or `#RRGGBBAA`
    #[error("Invalid hex color: '{value}'")]
    InvalidColor { value: String },

    // === I/O errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
