//! Built-in command set

use async_trait::async_trait;
use std::sync::Arc;

use super::{Command, CommandParser};
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::redirect::{RedirectHandler, RedirectObjects, RedirectReply, RedirectionSession};

const ALIAS_USAGE: &str = "alias [ls | add NAME [TEMPLATE...] | rm NAME | clear]";
const GROUP_USAGE: &str = "group ls";

/// Command names with their help lines, in help order
const BUILTINS: &[(&str, &str)] = &[
    ("help", "list the built-in commands"),
    ("alias", "list, add or remove aliases"),
    ("group", "list the registered groups"),
    ("apps", "list the available applications"),
    ("echo", "print its arguments"),
    ("pwd", "print the current directory"),
];

/// Parser for the built-in commands
///
/// Names match case-sensitively unless parsing is lenient.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinParser;

impl BuiltinParser {
    pub fn new() -> Self {
        Self
    }
}

impl CommandParser for BuiltinParser {
    fn parse(
        &self,
        input: &str,
        _context: &ExecutionContext,
        lenient: bool,
    ) -> Result<Option<Box<dyn Command>>> {
        let mut words = input.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(None);
        };

        let found = BUILTINS.iter().map(|(name, _)| *name).find(|name| {
            if lenient {
                name.eq_ignore_ascii_case(first)
            } else {
                *name == first
            }
        });
        let Some(name) = found else {
            return Ok(None);
        };

        let args: Vec<&str> = words.collect();
        let command = match name {
            "help" => without_args(name, &args, Builtin::Help)?,
            "alias" => parse_alias(&args, lenient)?,
            "group" => match args.as_slice() {
                [sub] if matches_word(sub, "ls", lenient) => Builtin::GroupList,
                _ => return Err(invalid("group", GROUP_USAGE)),
            },
            "apps" => without_args(name, &args, Builtin::Apps)?,
            "echo" => Builtin::Echo(args.join(" ")),
            "pwd" => without_args(name, &args, Builtin::Pwd)?,
            _ => return Ok(None),
        };

        trace!("Parsed built-in '{}'", command.name());
        Ok(Some(Box::new(command)))
    }
}

fn matches_word(word: &str, expected: &str, lenient: bool) -> bool {
    if lenient {
        word.eq_ignore_ascii_case(expected)
    } else {
        word == expected
    }
}

fn invalid(command: &str, usage: &str) -> Error {
    Error::InvalidArguments {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn without_args(name: &str, args: &[&str], command: Builtin) -> Result<Builtin> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(invalid(name, name))
    }
}

fn parse_alias(args: &[&str], lenient: bool) -> Result<Builtin> {
    let Some((sub, rest)) = args.split_first() else {
        return Ok(Builtin::AliasList);
    };

    if matches_word(sub, "ls", lenient) && rest.is_empty() {
        return Ok(Builtin::AliasList);
    }
    if matches_word(sub, "clear", lenient) && rest.is_empty() {
        return Ok(Builtin::AliasClear);
    }
    if matches_word(sub, "rm", lenient) && !rest.is_empty() {
        return Ok(Builtin::AliasRemove {
            name: rest.join(" "),
        });
    }
    if matches_word(sub, "add", lenient) {
        return match rest {
            [name] => Ok(Builtin::AliasPrompt {
                name: name.to_string(),
            }),
            [name, template @ ..] if !template.is_empty() => Ok(Builtin::AliasAdd {
                name: name.to_string(),
                template: template.join(" "),
            }),
            _ => Err(invalid("alias", ALIAS_USAGE)),
        };
    }

    Err(invalid("alias", ALIAS_USAGE))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Builtin {
    Help,
    AliasList,
    AliasAdd { name: String, template: String },
    AliasPrompt { name: String },
    AliasRemove { name: String },
    AliasClear,
    GroupList,
    Apps,
    Echo(String),
    Pwd,
}

#[async_trait]
impl Command for Builtin {
    fn name(&self) -> &str {
        match self {
            Builtin::Help => "help",
            Builtin::AliasList
            | Builtin::AliasAdd { .. }
            | Builtin::AliasPrompt { .. }
            | Builtin::AliasRemove { .. }
            | Builtin::AliasClear => "alias",
            Builtin::GroupList => "group",
            Builtin::Apps => "apps",
            Builtin::Echo(_) => "echo",
            Builtin::Pwd => "pwd",
        }
    }

    async fn execute(self: Box<Self>, context: Arc<ExecutionContext>) -> Result<Option<String>> {
        let text = match *self {
            Builtin::Help => BUILTINS
                .iter()
                .map(|(name, description)| format!("{:<8}{}", name, description))
                .collect::<Vec<_>>()
                .join("\n"),
            Builtin::AliasList => {
                let entries = context.aliases().entries();
                if entries.is_empty() {
                    "No aliases".to_string()
                } else {
                    entries
                        .iter()
                        .map(|(name, template)| format!("{} --> {}", name, template))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Builtin::AliasAdd { name, template } => {
                context.aliases().set(&name, &template)?;
                format!("Alias '{}' set", name)
            }
            Builtin::AliasPrompt { name } => {
                let session =
                    RedirectionSession::new(AliasTemplatePrompt).with_before(vec![name.clone()]);
                context.redirector().prepare(session)?;
                format!("Template for alias '{}':", name)
            }
            Builtin::AliasRemove { name } => {
                context.aliases().remove(&name)?;
                format!("Alias '{}' removed", name)
            }
            Builtin::AliasClear => {
                let count = context.aliases().len();
                if count == 0 {
                    "No aliases".to_string()
                } else {
                    context
                        .redirector()
                        .prepare(RedirectionSession::new(ConfirmAliasClear))?;
                    format!("Remove all {} aliases? [y/n]", count)
                }
            }
            Builtin::GroupList => {
                let names = context.groups().names();
                if names.is_empty() {
                    "No groups".to_string()
                } else {
                    names.join("\n")
                }
            }
            Builtin::Apps => {
                let labels = context.apps().shown_labels();
                if labels.is_empty() {
                    "No applications".to_string()
                } else {
                    labels.join("\n")
                }
            }
            Builtin::Echo(text) => text,
            Builtin::Pwd => context
                .current_directory()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        };

        Ok(Some(text))
    }
}

/// Asks for the template of the alias named in `before`
struct AliasTemplatePrompt;

impl RedirectHandler for AliasTemplatePrompt {
    fn on_redirect(
        &mut self,
        objects: &mut RedirectObjects,
        context: &ExecutionContext,
    ) -> RedirectReply {
        let Some(name) = objects.before.first().cloned() else {
            return RedirectReply::Finish("No alias name given".to_string());
        };

        match objects.last_input() {
            None => RedirectReply::Continue(format!("Template for alias '{}':", name)),
            Some("") => RedirectReply::Finish("Cancelled".to_string()),
            Some(template) => match context.aliases().set(&name, template) {
                Ok(()) => RedirectReply::Finish(format!("Alias '{}' set", name)),
                Err(e) => RedirectReply::Finish(e.to_string()),
            },
        }
    }

    fn hint(&self) -> Option<String> {
        Some("alias template".to_string())
    }
}

/// Confirms `alias clear`
struct ConfirmAliasClear;

impl RedirectHandler for ConfirmAliasClear {
    fn on_redirect(
        &mut self,
        objects: &mut RedirectObjects,
        context: &ExecutionContext,
    ) -> RedirectReply {
        let answer = objects.last_input().map(str::to_ascii_lowercase);
        match answer.as_deref() {
            Some("y") | Some("yes") => match context.aliases().clear() {
                Ok(count) => RedirectReply::Finish(format!("Removed {} aliases", count)),
                Err(e) => RedirectReply::Finish(e.to_string()),
            },
            Some("n") | Some("no") | Some("") => RedirectReply::Finish("Cancelled".to_string()),
            None => RedirectReply::Continue("Remove all aliases? [y/n]".to_string()),
            Some(_) => RedirectReply::Continue("Please answer y or n".to_string()),
        }
    }

    fn hint(&self) -> Option<String> {
        Some("y/n".to_string())
    }
}
