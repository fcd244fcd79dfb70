//! The command dispatcher
//!
//! [`Dispatcher::dispatch`] takes one logical input line through the
//! pipeline:
//!
//! 1. collapse redundant whitespace
//! 2. hand the line to the active redirection session, if any, and stop
//! 3. emit the alias preview when the line came from an alias expansion
//! 4. split on the configured separator
//! 5. offer each sub-command to the resolver chain (see [`Trigger`])
//!
//! Resolution is synchronous. Structured commands and shell submissions
//! run on background tasks spawned on the runtime captured at build time,
//! so `dispatch` never waits for them.

mod triggers;

pub use triggers::Trigger;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::alias::AliasTable;
use crate::apps::{AppRegistry, ConfiguredApps};
use crate::commands::{BuiltinParser, CommandParser};
use crate::config::Config;
use crate::context::{ExecutionContext, HintListener, Rooter};
use crate::error::{Error, Result};
use crate::group::GroupRegistry;
use crate::input;
use crate::launch;
use crate::models::Launchable;
use crate::output::{InputSource, OutputSink};
use crate::redirect::{RedirectionListener, RedirectionSnapshot, Redirector};
use crate::shell::ShellBackend;
use triggers::Claim;

/// Deepest allowed chain of alias expansions
pub const MAX_ALIAS_DEPTH: usize = 16;

/// What happened to one dispatched line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// The line went to the redirection session
    pub redirected: bool,
    /// One entry per sub-command, in dispatch order
    pub outcomes: Vec<SubCommandOutcome>,
}

impl DispatchReport {
    fn redirected() -> Self {
        Self {
            redirected: true,
            outcomes: Vec::new(),
        }
    }

    /// Claiming trigger of each sub-command
    pub fn claimed_by(&self) -> Vec<Option<Trigger>> {
        self.outcomes.iter().map(|outcome| outcome.trigger).collect()
    }

    /// Emitted error texts, in dispatch order
    pub fn errors(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.error.as_deref())
            .collect()
    }
}

/// Resolution of one sub-command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommandOutcome {
    /// Sub-command text
    pub input: String,
    /// Trigger that claimed it, `None` if nothing did
    pub trigger: Option<Trigger>,
    /// Error text emitted while resolving it
    pub error: Option<String>,
    /// Report of the alias expansion it was rewritten to
    pub expansion: Option<Box<DispatchReport>>,
}

impl SubCommandOutcome {
    fn new(input: String, trigger: Option<Trigger>) -> Self {
        Self {
            input,
            trigger,
            error: None,
            expansion: None,
        }
    }
}

/// Routes input lines to exactly one handler each
pub struct Dispatcher {
    context: Arc<ExecutionContext>,
    parser: Arc<dyn CommandParser>,
    input: Option<Arc<dyn InputSource>>,
    runtime: Handle,
}

impl Dispatcher {
    pub fn builder(config: Config) -> DispatcherBuilder {
        DispatcherBuilder::new(config)
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    pub(crate) fn parser(&self) -> &Arc<dyn CommandParser> {
        &self.parser
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task);
    }

    /// Dispatch one input line
    ///
    /// `alias` names the alias whose expansion produced the line.
    pub fn dispatch(&self, raw: &str, alias: Option<&str>) -> DispatchReport {
        let chain: Vec<String> = alias.map(String::from).into_iter().collect();
        self.dispatch_with_chain(raw, &chain)
    }

    pub(crate) fn dispatch_with_chain(&self, raw: &str, chain: &[String]) -> DispatchReport {
        let line = input::normalize(raw);

        if let Some(text) = self.context.redirector().route(&line, &self.context) {
            if !text.is_empty() {
                self.context.emit(&text);
            }
            return DispatchReport::redirected();
        }

        let behavior = self.context.behavior();
        if let Some(alias) = chain.last() {
            if behavior.show_alias_content {
                let preview = self.context.aliases().format_label(alias, &line);
                self.context
                    .output()
                    .on_colored_output(self.context.theme().alias_content_color, &preview);
            }
        }

        let outcomes = input::split_commands(&line, &behavior.multiple_cmd_separator)
            .into_iter()
            .map(|command| self.resolve(command, chain))
            .collect();

        DispatchReport {
            redirected: false,
            outcomes,
        }
    }

    /// Run the resolver chain on one sub-command
    fn resolve(&self, command: String, chain: &[String]) -> SubCommandOutcome {
        for trigger in Trigger::CHAIN {
            match trigger.trigger(self, &command, chain) {
                Ok(Claim::Declined) => continue,
                Ok(Claim::Claimed) => {
                    debug!("'{}' claimed by {}", command, trigger);
                    return SubCommandOutcome::new(command, Some(trigger));
                }
                Ok(Claim::Expanded(report)) => {
                    let mut outcome = SubCommandOutcome::new(command, Some(trigger));
                    outcome.expansion = Some(report);
                    return outcome;
                }
                Err(e) => {
                    warn!("{} resolver failed on '{}': {}", trigger, command, e);
                    let text = e.to_string();
                    self.context.emit(&text);
                    let mut outcome = SubCommandOutcome::new(command, Some(trigger));
                    outcome.error = Some(text);
                    return outcome;
                }
            }
        }

        debug!("Nothing claimed '{}'", command);
        SubCommandOutcome::new(command, None)
    }

    /// Dispatch a line the host resolved to an application suggestion
    ///
    /// The application is launched directly when its label equals the
    /// line; otherwise the line is dispatched normally.
    pub fn dispatch_selection(&self, raw: &str, app: &Launchable) -> DispatchReport {
        let line = input::normalize(raw);
        if line != app.public_label {
            return self.dispatch(raw, None);
        }

        let outcome = match launch::launch(&self.context, app) {
            Ok(launched) => SubCommandOutcome::new(line, launched.then_some(Trigger::App)),
            Err(e) => {
                warn!("Launching selection '{}' failed: {}", app.public_label, e);
                let text = e.to_string();
                self.context.emit(&text);
                let mut outcome = SubCommandOutcome::new(line, Some(Trigger::App));
                outcome.error = Some(text);
                outcome
            }
        };

        DispatchReport {
            redirected: false,
            outcomes: vec![outcome],
        }
    }

    /// "Back" gesture: inject an empty line into the host's input
    pub fn on_long_back(&self) {
        match &self.input {
            Some(input) => input.inject(""),
            None => debug!("No input source to inject into"),
        }
    }

    /// A permission the active session waited for was denied
    pub fn permission_denied(&self) -> bool {
        self.context.redirector().cleanup()
    }

    /// A permission the active session waited for was granted
    pub fn permission_granted(&self) -> bool {
        self.context.redirector().grant_permission()
    }

    pub fn redirection_snapshot(&self) -> Option<RedirectionSnapshot> {
        self.context.redirector().snapshot()
    }

    pub fn is_redirecting(&self) -> bool {
        self.context.redirector().is_active()
    }

    /// Stop the shell on a background task
    ///
    /// Failures are logged, never returned. Await the handle to wait for
    /// teardown to finish.
    pub fn destroy(&self) -> JoinHandle<()> {
        let shell = self.context.shell().clone();
        let limit = Duration::from_millis(self.context.config().shell.terminate_timeout_ms);
        info!("Tearing down dispatcher");

        self.runtime.spawn(async move {
            match tokio::time::timeout(limit, shell.terminate()).await {
                Ok(Ok(())) => info!("Shell terminated"),
                Ok(Err(e)) => error!("Shell teardown failed: {}", e),
                Err(_) => error!("Shell did not terminate within {:?}", limit),
            }
        })
    }
}

/// Assembles a [`Dispatcher`] and its execution context
///
/// Only the output sink and the shell are required. Aliases, groups and
/// applications default to the ones described by the configuration, the
/// parser defaults to [`BuiltinParser`] and the runtime to the current one.
pub struct DispatcherBuilder {
    config: Config,
    aliases: Option<Arc<AliasTable>>,
    groups: Option<Arc<GroupRegistry>>,
    apps: Option<Arc<dyn AppRegistry>>,
    shell: Option<Arc<dyn ShellBackend>>,
    output: Option<Arc<dyn OutputSink>>,
    parser: Option<Arc<dyn CommandParser>>,
    input: Option<Arc<dyn InputSource>>,
    rooter: Option<Arc<dyn Rooter>>,
    hint_listener: Option<Arc<dyn HintListener>>,
    redirection_listener: Option<Arc<dyn RedirectionListener>>,
    current_directory: Option<PathBuf>,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            aliases: None,
            groups: None,
            apps: None,
            shell: None,
            output: None,
            parser: None,
            input: None,
            rooter: None,
            hint_listener: None,
            redirection_listener: None,
            current_directory: None,
            runtime: None,
        }
    }

    pub fn aliases(mut self, aliases: Arc<AliasTable>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn groups(mut self, groups: Arc<GroupRegistry>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn apps(mut self, apps: Arc<dyn AppRegistry>) -> Self {
        self.apps = Some(apps);
        self
    }

    pub fn shell(mut self, shell: Arc<dyn ShellBackend>) -> Self {
        self.shell = Some(shell);
        self
    }

    pub fn output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn parser(mut self, parser: Arc<dyn CommandParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn input_source(mut self, input: Arc<dyn InputSource>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn rooter(mut self, rooter: Arc<dyn Rooter>) -> Self {
        self.rooter = Some(rooter);
        self
    }

    pub fn hint_listener(mut self, listener: Arc<dyn HintListener>) -> Self {
        self.hint_listener = Some(listener);
        self
    }

    pub fn redirection_listener(mut self, listener: Arc<dyn RedirectionListener>) -> Self {
        self.redirection_listener = Some(listener);
        self
    }

    pub fn current_directory(mut self, path: PathBuf) -> Self {
        self.current_directory = Some(path);
        self
    }

    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let output = self
            .output
            .ok_or_else(|| Error::Other("Dispatcher needs an output sink".to_string()))?;
        let shell = self
            .shell
            .ok_or_else(|| Error::Other("Dispatcher needs a shell backend".to_string()))?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|e| Error::Other(format!("Dispatcher needs a tokio runtime: {}", e)))?,
        };

        let config = self.config;
        let aliases = match self.aliases {
            Some(aliases) => aliases,
            None => Arc::new(AliasTable::from_config(&config)?),
        };
        let groups = match self.groups {
            Some(groups) => groups,
            None => Arc::new(GroupRegistry::from_config(&config)?),
        };
        let apps = self
            .apps
            .unwrap_or_else(|| Arc::new(ConfiguredApps::new(config.apps.clone())));
        let parser = self.parser.unwrap_or_else(|| Arc::new(BuiltinParser::new()));

        let mut redirector = Redirector::new();
        if let Some(listener) = self.redirection_listener {
            redirector = redirector.with_listener(listener);
        }

        let mut context =
            ExecutionContext::new(Arc::new(config), aliases, groups, apps, shell, output)
                .with_redirector(redirector);
        if let Some(rooter) = self.rooter {
            context = context.with_rooter(rooter);
        }
        if let Some(listener) = self.hint_listener {
            context = context.with_hint_listener(listener);
        }
        if let Some(path) = self.current_directory {
            context = context.with_current_directory(path);
        }

        info!(
            "Dispatcher ready ({} aliases, {} groups)",
            context.aliases().len(),
            context.groups().len()
        );

        Ok(Dispatcher {
            context: Arc::new(context),
            parser,
            input: self.input,
            runtime,
        })
    }
}
