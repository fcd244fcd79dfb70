//! Test Fixtures
//!
//! A dispatcher wired to mock collaborators, plus output capture helpers.

use super::mock_collaborators::{CountingHooks, MockApps};
use super::mock_shell::MockShell;
use shellroute::config::Config;
use shellroute::dispatch::{Dispatcher, DispatcherBuilder};
use shellroute::output::{ChannelInput, ChannelSink, OutputEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Default configuration with alias previews turned on
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.behavior.show_alias_content = true;
    config
}

/// Receiving end of a [`ChannelSink`]
pub struct OutputCapture {
    rx: UnboundedReceiver<OutputEvent>,
}

impl OutputCapture {
    pub fn new(rx: UnboundedReceiver<OutputEvent>) -> Self {
        Self { rx }
    }

    /// Everything emitted so far
    pub fn drain(&mut self) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Texts emitted so far
    pub fn texts(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|event| event.text().to_string())
            .collect()
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> Option<OutputEvent> {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Wait for an event whose text satisfies `predicate`, collecting the
    /// texts seen on the way
    pub async fn wait_for(&mut self, predicate: impl Fn(&str) -> bool) -> Vec<String> {
        let mut seen = Vec::new();
        while let Some(event) = self.next().await {
            let found = predicate(event.text());
            seen.push(event.text().to_string());
            if found {
                break;
            }
        }
        seen
    }
}

/// Dispatcher wired to mock collaborators
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub shell: Arc<MockShell>,
    pub apps: Arc<MockApps>,
    pub hooks: Arc<CountingHooks>,
    pub output: OutputCapture,
    pub injected: UnboundedReceiver<String>,
}

impl Harness {
    /// Harness with no applications and the built-in parser
    pub fn new(config: Config) -> Self {
        Self::build(config, MockApps::new(), MockShell::new(), |builder| builder)
    }

    /// Harness with custom collaborators; `customize` may add a parser,
    /// groups or anything else the builder accepts
    pub fn build(
        config: Config,
        apps: MockApps,
        shell: MockShell,
        customize: impl FnOnce(DispatcherBuilder) -> DispatcherBuilder,
    ) -> Self {
        let (sink, rx) = ChannelSink::new();
        let (input, injected) = ChannelInput::new();
        let shell = Arc::new(shell);
        let apps = Arc::new(apps);
        let hooks = Arc::new(CountingHooks::default());

        let builder = Dispatcher::builder(config)
            .output(Arc::new(sink))
            .shell(shell.clone())
            .apps(apps.clone())
            .input_source(Arc::new(input))
            .rooter(hooks.clone())
            .hint_listener(hooks.clone())
            .redirection_listener(hooks.clone());
        let dispatcher = customize(builder)
            .build()
            .expect("harness dispatcher builds");

        Self {
            dispatcher,
            shell,
            apps,
            hooks,
            output: OutputCapture::new(rx),
            injected,
        }
    }

    pub fn dispatch(&self, input: &str) -> shellroute::DispatchReport {
        self.dispatcher.dispatch(input, None)
    }
}
