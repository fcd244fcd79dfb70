//! shellroute - command dispatch core for an embedded text shell
//!
//! A user types a line; shellroute decides what it means and routes it to
//! exactly one handler: a group action, an alias expansion, a built-in
//! structured command, an application launch, or the underlying OS shell.
//!
//! ## Features
//!
//! - **Resolver chain:** Group, Alias, Command, App and Shell, in that order
//! - **Aliases:** Multi-word names, parameter marker, `name=template` files
//! - **Multi-command input:** Configurable separator, per sub-command error isolation
//! - **Redirection:** Multi-turn prompts that capture all input until they end
//! - **Background execution:** Commands and shell submissions never block dispatch
//! - **Configuration:** TOML or JSON files with validation and defaults
//!
//! ## Module Organization
//!
//! ### Core
//!
//! - [`dispatch`] - The dispatcher, its builder and the resolver chain
//! - [`redirect`] - Redirection sessions and the shared slot
//! - [`context`] - Execution context shared by resolvers and commands
//! - [`input`] - Whitespace normalization and multi-command splitting
//!
//! ### Collaborators
//!
//! - [`alias`] - Alias table and expansion
//! - [`group`] - Named groups of applications
//! - [`commands`] - Structured command trait and the built-in set
//! - [`apps`] - Application registry and the configured reference registry
//! - [`launch`] - Launch-history formatting and the launch path
//! - [`shell`] - Shell backend trait and the interactive `sh` backend
//! - [`output`] - Output sink and input source
//!
//! ### Support
//!
//! - [`config`] - Configuration model, loading and validation
//! - [`models`] - Plain data types (colors, launchables)
//! - [`mod@error`] - Error types and Result alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use shellroute::{ChannelSink, Dispatcher, InteractiveShell};
//!
//! # async fn run() -> shellroute::Result<()> {
//! let config = shellroute::init()?;
//! let (sink, mut output) = ChannelSink::new();
//! let sink = Arc::new(sink);
//! let shell = InteractiveShell::spawn(&config.shell, sink.clone())?;
//!
//! let dispatcher = Dispatcher::builder(config)
//!     .output(sink)
//!     .shell(Arc::new(shell))
//!     .build()?;
//!
//! dispatcher.dispatch("echo hello; ls", None);
//! while let Some(event) = output.recv().await {
//!     println!("{}", event.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Dispatch runs on the caller's thread up to resolver selection. Structured
//! commands and shell submissions are spawned as tokio tasks; their output
//! reaches the sink whenever they finish, so output order across
//! sub-commands is not guaranteed. Shared state lives in the
//! [`ExecutionContext`], one lock per field, never held across an await.

#[macro_use]
extern crate tracing;

pub mod alias;
pub mod apps;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod group;
pub mod input;
pub mod launch;
pub mod models;
pub mod output;
pub mod redirect;
pub mod shell;

// Re-exports for the common entry points
pub use alias::AliasTable;
pub use apps::{AppRegistry, ConfiguredApps};
pub use commands::{BuiltinParser, Command, CommandParser};
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use context::{ExecutionContext, HintListener, Rooter};
pub use dispatch::{DispatchReport, Dispatcher, DispatcherBuilder, SubCommandOutcome, Trigger};
pub use error::{Error, Result};
pub use group::{AppGroup, Group, GroupRegistry};
pub use models::{Color, LaunchTarget, Launchable};
pub use output::{ChannelInput, ChannelSink, InputSource, OutputEvent, OutputSink};
pub use redirect::{
    RedirectHandler, RedirectObjects, RedirectReply, RedirectionListener, RedirectionSession,
};
pub use shell::{InteractiveShell, ShellBackend, ShellCommand, ShellResult};

/// The current version of shellroute from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load the configuration from the default locations
///
/// Falls back to defaults when no file is found or the file cannot be
/// used.
pub fn init() -> Result<Config> {
    info!("Initializing {} v{}", NAME, VERSION);

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }
    };

    Ok(config)
}

/// Load the configuration from an explicit file
///
/// Unlike [`init`], a missing or invalid file is an error.
pub fn init_with_config(path: &std::path::Path) -> Result<Config> {
    info!("Initializing {} v{} from {}", NAME, VERSION, path.display());
    ConfigLoader::load_from_path(path, true)
}
