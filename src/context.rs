//! Execution context shared by every resolver and command
//!
//! One context exists per dispatcher. It is handed to background command
//! tasks behind an `Arc`, so every mutable field sits behind its own lock
//! and no lock is ever held across an await point.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::alias::AliasTable;
use crate::apps::AppRegistry;
use crate::config::{BehaviorConfig, Config, ThemeConfig};
use crate::group::GroupRegistry;
use crate::output::OutputSink;
use crate::redirect::Redirector;
use crate::shell::ShellBackend;

/// Collaborator notified when the user asks for elevated privileges
pub trait Rooter: Send + Sync {
    fn on_root(&self);
}

/// Collaborator notified when the current directory changes
pub trait HintListener: Send + Sync {
    fn update_hint(&self);
}

/// Shared mutable state of one shell session
pub struct ExecutionContext {
    current_directory: RwLock<Option<PathBuf>>,
    last_command: RwLock<Option<String>>,
    aliases: Arc<AliasTable>,
    groups: Arc<GroupRegistry>,
    apps: Arc<dyn AppRegistry>,
    shell: Arc<dyn ShellBackend>,
    output: Arc<dyn OutputSink>,
    redirector: Redirector,
    rooter: Option<Arc<dyn Rooter>>,
    hint_listener: Option<Arc<dyn HintListener>>,
    config: Arc<Config>,
}

impl ExecutionContext {
    pub fn new(
        config: Arc<Config>,
        aliases: Arc<AliasTable>,
        groups: Arc<GroupRegistry>,
        apps: Arc<dyn AppRegistry>,
        shell: Arc<dyn ShellBackend>,
        output: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            current_directory: RwLock::new(None),
            last_command: RwLock::new(None),
            aliases,
            groups,
            apps,
            shell,
            output,
            redirector: Redirector::new(),
            rooter: None,
            hint_listener: None,
            config,
        }
    }

    pub fn with_redirector(mut self, redirector: Redirector) -> Self {
        self.redirector = redirector;
        self
    }

    pub fn with_rooter(mut self, rooter: Arc<dyn Rooter>) -> Self {
        self.rooter = Some(rooter);
        self
    }

    pub fn with_hint_listener(mut self, listener: Arc<dyn HintListener>) -> Self {
        self.hint_listener = Some(listener);
        self
    }

    pub fn with_current_directory(self, path: PathBuf) -> Self {
        self.set_current_directory(Some(path));
        self
    }

    /// Directory last reported by the shell, if known
    pub fn current_directory(&self) -> Option<PathBuf> {
        self.current_directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_current_directory(&self, path: Option<PathBuf>) {
        *self
            .current_directory
            .write()
            .unwrap_or_else(PoisonError::into_inner) = path;
    }

    /// Adopt `path` as the current directory if it names an existing
    /// directory, notifying the hint listener
    pub fn update_current_directory(&self, path: &Path) -> bool {
        if !path.is_dir() {
            debug!("Ignoring reported directory {}", path.display());
            return false;
        }

        self.set_current_directory(Some(path.to_path_buf()));
        debug!("Current directory is now {}", path.display());
        if let Some(listener) = &self.hint_listener {
            listener.update_hint();
        }
        true
    }

    /// Raw input of the last structured command
    pub fn last_command(&self) -> Option<String> {
        self.last_command
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_last_command(&self, input: &str) {
        *self
            .last_command
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(input.to_string());
    }

    pub fn aliases(&self) -> &Arc<AliasTable> {
        &self.aliases
    }

    pub fn groups(&self) -> &Arc<GroupRegistry> {
        &self.groups
    }

    pub fn apps(&self) -> &Arc<dyn AppRegistry> {
        &self.apps
    }

    pub fn shell(&self) -> &Arc<dyn ShellBackend> {
        &self.shell
    }

    pub fn output(&self) -> &Arc<dyn OutputSink> {
        &self.output
    }

    pub fn redirector(&self) -> &Redirector {
        &self.redirector
    }

    pub fn rooter(&self) -> Option<&Arc<dyn Rooter>> {
        self.rooter.as_ref()
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn behavior(&self) -> &BehaviorConfig {
        &self.config.behavior
    }

    pub fn theme(&self) -> &ThemeConfig {
        &self.config.theme
    }

    /// Emit plain output
    pub fn emit(&self, text: &str) {
        self.output.on_output(text);
    }
}
