//! Named groups of launchable members
//!
//! A group is addressed by its name as the first word of an input line.
//! The bare name lists the members; anything after the name is handed to
//! the group, which decides whether it handled it.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::Config;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::launch;

/// A named collection of members with its own sub-command handler
pub trait Group: Send + Sync {
    /// Unique group name, a single word
    fn name(&self) -> &str;

    /// Member labels in display order
    fn members(&self) -> Vec<String>;

    /// Handle the text typed after the group name
    ///
    /// Returns whether the group claimed it.
    fn use_group(&self, context: &ExecutionContext, residual: &str) -> Result<bool>;
}

/// Group whose members are application labels
#[derive(Debug, Clone)]
pub struct AppGroup {
    name: String,
    members: Vec<String>,
}

impl AppGroup {
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

impl Group for AppGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> Vec<String> {
        self.members.clone()
    }

    fn use_group(&self, context: &ExecutionContext, residual: &str) -> Result<bool> {
        let residual = residual.trim();
        if !self.members.iter().any(|member| member == residual) {
            return Ok(false);
        }

        match context.apps().find_label(residual) {
            Some(app) => launch::launch(context, &app).map_err(|e| Error::GroupFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
            None => {
                debug!(
                    "Group '{}' member '{}' is not an available application",
                    self.name, residual
                );
                Ok(false)
            }
        }
    }
}

/// Registry of groups keyed by name
#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<Vec<Arc<dyn Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one [`AppGroup`] per `[[groups]]` entry
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Self::new();
        for group in &config.groups {
            registry.register(Arc::new(AppGroup::new(
                group.name.trim(),
                group.members.clone(),
            )))?;
        }
        Ok(registry)
    }

    /// Register a group; names must be unique
    pub fn register(&self, group: Arc<dyn Group>) -> Result<()> {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        if groups.iter().any(|existing| existing.name() == group.name()) {
            return Err(Error::DuplicateGroup {
                name: group.name().to_string(),
            });
        }

        debug!("Registered group '{}'", group.name());
        groups.push(group);
        Ok(())
    }

    /// Group with exactly this name
    pub fn find(&self, name: &str) -> Option<Arc<dyn Group>> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|group| group.name() == name)
            .cloned()
    }

    /// Registered group names in registration order
    pub fn names(&self) -> Vec<String> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|group| group.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRegistry")
            .field("groups", &self.names())
            .finish()
    }
}
