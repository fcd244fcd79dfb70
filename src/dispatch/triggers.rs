//! The resolver chain
//!
//! Each sub-command is offered to the triggers in [`Trigger::CHAIN`] order
//! until one claims it. Declining is a normal result; an error claims the
//! sub-command and is emitted by the dispatcher.

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use super::{DispatchReport, Dispatcher, MAX_ALIAS_DEPTH};
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::launch;
use crate::shell::{
    self, ResultCallback, ShellCommand, ShellLineKind, ShellResult, CD_CODE, PRIVILEGE_KEYWORD,
    PWD_CODE,
};

/// One resolver of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// First word names a registered group
    Group,
    /// Line starts with an alias name
    Alias,
    /// Line parses as a structured command
    Command,
    /// Line is the label of a shown application
    App,
    /// Anything else goes to the shell
    Shell,
}

/// Outcome of offering a sub-command to one trigger
#[derive(Debug)]
pub(crate) enum Claim {
    Claimed,
    Declined,
    /// Claimed by an alias whose expansion was dispatched
    Expanded(Box<DispatchReport>),
}

impl Claim {
    fn from_bool(claimed: bool) -> Self {
        if claimed {
            Claim::Claimed
        } else {
            Claim::Declined
        }
    }
}

impl Trigger {
    /// Resolver precedence
    pub const CHAIN: [Trigger; 5] = [
        Trigger::Group,
        Trigger::Alias,
        Trigger::Command,
        Trigger::App,
        Trigger::Shell,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trigger::Group => "group",
            Trigger::Alias => "alias",
            Trigger::Command => "command",
            Trigger::App => "app",
            Trigger::Shell => "shell",
        }
    }

    pub(crate) fn trigger(
        self,
        dispatcher: &Dispatcher,
        input: &str,
        chain: &[String],
    ) -> Result<Claim> {
        match self {
            Trigger::Group => group(dispatcher.context(), input),
            Trigger::Alias => alias(dispatcher, input, chain),
            Trigger::Command => command(dispatcher, input),
            Trigger::App => app(dispatcher.context(), input),
            Trigger::Shell => passthrough(dispatcher, input),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn group(context: &ExecutionContext, input: &str) -> Result<Claim> {
    let (name, residual) = match input.split_once(char::is_whitespace) {
        Some((name, residual)) => (name, Some(residual.trim())),
        None => (input, None),
    };

    let Some(group) = context.groups().find(name) else {
        return Ok(Claim::Declined);
    };

    match residual {
        None => {
            let members = group.members();
            if !members.is_empty() {
                context.emit(&members.join("\n"));
            }
            Ok(Claim::Claimed)
        }
        Some(residual) => group.use_group(context, residual).map(Claim::from_bool),
    }
}

fn alias(dispatcher: &Dispatcher, input: &str, chain: &[String]) -> Result<Claim> {
    let aliases = dispatcher.context().aliases();
    let Some(found) = aliases.resolve(input) else {
        return Ok(Claim::Declined);
    };

    if chain.contains(&found.name) {
        trace!("Alias '{}' already expanded in this chain", found.name);
        return Ok(Claim::Declined);
    }
    if chain.len() >= MAX_ALIAS_DEPTH {
        return Err(Error::AliasExpansionTooDeep {
            name: found.name,
            limit: MAX_ALIAS_DEPTH,
        });
    }

    let expanded = aliases.format(&found.value, &found.residual);
    debug!("Alias '{}' expands to '{}'", found.name, expanded);

    let mut nested = chain.to_vec();
    nested.push(found.name);
    let report = dispatcher.dispatch_with_chain(&expanded, &nested);
    Ok(Claim::Expanded(Box::new(report)))
}

fn command(dispatcher: &Dispatcher, input: &str) -> Result<Claim> {
    let context = dispatcher.context();
    let Some(command) = dispatcher.parser().parse(input, context, false)? else {
        return Ok(Claim::Declined);
    };

    context.set_last_command(input);
    let name = command.name().to_string();
    let context = context.clone();
    dispatcher.spawn(async move {
        let result = AssertUnwindSafe(command.execute(context.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(Error::CommandPanicked {
                    command: name.clone(),
                })
            });

        match result {
            Ok(Some(text)) if !text.is_empty() => context.emit(&text),
            Ok(_) => trace!("Command '{}' finished without output", name),
            Err(e) => {
                error!("Command '{}' failed: {}", name, e);
                context.emit(&e.to_string());
            }
        }
    });

    Ok(Claim::Claimed)
}

fn app(context: &ExecutionContext, input: &str) -> Result<Claim> {
    match context.apps().find_label(input) {
        Some(app) => launch::launch(context, &app).map(Claim::from_bool),
        None => Ok(Claim::Declined),
    }
}

fn passthrough(dispatcher: &Dispatcher, input: &str) -> Result<Claim> {
    let context = dispatcher.context().clone();
    let line = input.to_string();
    dispatcher.spawn(async move {
        if let Err(e) = submit_line(&context, &line) {
            error!("Shell submission failed: {}", e);
            context.emit(&e.to_string());
        }
    });
    Ok(Claim::Claimed)
}

/// Classify a line and hand it to the shell
fn submit_line(context: &Arc<ExecutionContext>, line: &str) -> Result<()> {
    let shell = context.shell();
    match shell::classify(line) {
        ShellLineKind::Privilege => {
            if shell.is_privilege_available() {
                if let Some(rooter) = context.rooter() {
                    rooter.on_root();
                }
            }
            shell.submit(ShellCommand::new(PRIVILEGE_KEYWORD))
        }
        ShellLineKind::ChangeDirectory => {
            let weak = Arc::downgrade(context);
            let on_cd: ResultCallback = Arc::new(move |result: ShellResult| {
                if let Some(context) = weak.upgrade() {
                    after_change_directory(&context, result);
                }
            });
            shell.submit(ShellCommand::with_result(line, CD_CODE, on_cd))
        }
        ShellLineKind::Plain => shell.submit(ShellCommand::new(line)),
    }
}

/// Show what `cd` printed and ask the shell where it ended up
fn after_change_directory(context: &Arc<ExecutionContext>, result: ShellResult) {
    for line in &result.output {
        context.emit(line);
    }

    let weak = Arc::downgrade(context);
    let on_pwd: ResultCallback = Arc::new(move |result: ShellResult| {
        if let Some(context) = weak.upgrade() {
            apply_working_directory(&context, &result);
        }
    });
    if let Err(e) = context
        .shell()
        .submit(ShellCommand::with_result("pwd", PWD_CODE, on_pwd))
    {
        error!("Failed to query the working directory: {}", e);
    }
}

fn apply_working_directory(context: &ExecutionContext, result: &ShellResult) {
    match result.output.as_slice() {
        [path] => {
            context.update_current_directory(Path::new(path.trim()));
        }
        other => debug!("Unexpected pwd output ({} lines)", other.len()),
    }
}
