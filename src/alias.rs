//! Alias table and alias expansion
//!
//! An alias maps a name to a template. The name is matched against the
//! start of an input line and the rest of the line (the residual) is
//! substituted into the template wherever the parameter marker appears.
//!
//! Names may contain spaces: lookup first tries the whole line, then keeps
//! dropping the last word until a name matches. A one-word alias therefore
//! behaves like a classic first-token alias, while a multi-word alias can
//! match a whole line.
//!
//! The table can be backed by a text file of `name=template` lines, in which
//! case every mutation is written back. Aliases seeded from the `[aliases]`
//! configuration table stay in the configuration: the file only receives
//! entries that came from it or were changed at runtime.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::{Error, Result};

/// Separator between name and template in alias files
const FILE_SEPARATOR: char = '=';

/// Placeholders understood by alias preview templates
static LABEL_PLACEHOLDERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(?i)%([av])").expect("alias label placeholder pattern is valid")
});

/// Result of matching an input line against the alias table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMatch {
    /// Matched alias name
    pub name: String,
    /// Raw template of the alias
    pub value: String,
    /// Input left after the matched name, single-space joined
    pub residual: String,
}

/// Thread-safe alias table
#[derive(Debug)]
pub struct AliasTable {
    entries: RwLock<BTreeMap<String, String>>,
    /// Parameter marker replaced by the residual input
    marker: String,
    /// Preview template (`%a` name, `%v` expanded input)
    label_format: String,
    /// Backing file, if any
    file: Option<PathBuf>,
    /// Entries taken from the configuration, never written to the file
    seeded: BTreeMap<String, String>,
}

impl AliasTable {
    /// Create an empty table with the given parameter marker
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            marker: marker.into(),
            label_format: "%a --> [%v]".to_string(),
            file: None,
            seeded: BTreeMap::new(),
        }
    }

    /// Build the table described by a configuration
    ///
    /// Aliases from the `[aliases]` table are loaded first; entries from the
    /// alias file (if configured and present) override them. Seeded entries
    /// are only written to the file once they are changed through the table.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut table = Self::new(config.behavior.alias_param_marker.clone());
        table.label_format = config.behavior.alias_content_format.clone();

        for (name, template) in &config.aliases {
            match normalize_name(name) {
                Ok(name) => {
                    table.seeded.insert(name, template.trim().to_string());
                }
                Err(e) => warn!("Skipping configured alias: {}", e),
            }
        }
        table.write().extend(table.seeded.clone());

        if let Some(path) = &config.aliases_file {
            table.file = Some(path.clone());
            if path.exists() {
                let loaded = table.load_file(path)?;
                info!("Loaded {} aliases from {}", loaded, path.display());
            }
        }

        Ok(table)
    }

    /// Attach a backing file without reading it
    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file = Some(path);
        self
    }

    /// Set the preview template
    pub fn with_label_format(mut self, format: impl Into<String>) -> Self {
        self.label_format = format.into();
        self
    }

    /// The parameter marker
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The backing file, if any
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace an alias
    pub fn set(&self, name: &str, template: &str) -> Result<()> {
        let name = normalize_name(name)?;
        self.write().insert(name, template.trim().to_string());
        self.persist()
    }

    /// Remove an alias, returning its template
    pub fn remove(&self, name: &str) -> Result<String> {
        let removed = self.write().remove(name.trim());
        match removed {
            Some(template) => {
                self.persist()?;
                Ok(template)
            }
            None => Err(Error::AliasNotFound {
                name: name.trim().to_string(),
            }),
        }
    }

    /// Remove every alias, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let count = {
            let mut entries = self.write();
            let count = entries.len();
            entries.clear();
            count
        };
        self.persist()?;
        Ok(count)
    }

    /// Template of an alias
    pub fn get(&self, name: &str) -> Option<String> {
        self.read().get(name).cloned()
    }

    /// All aliases sorted by name
    pub fn entries(&self) -> Vec<(String, String)> {
        self.read()
            .iter()
            .map(|(name, template)| (name.clone(), template.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Match an input line against the table
    ///
    /// The whole line is tried first, then the line minus its last word,
    /// and so on down to the first word. Matching is case-sensitive.
    pub fn resolve(&self, input: &str) -> Option<AliasMatch> {
        let entries = self.read();
        let input = input.trim();
        if input.is_empty() || entries.is_empty() {
            return None;
        }

        let mut candidate = input;
        loop {
            if let Some(value) = entries.get(candidate) {
                let residual = input[candidate.len()..]
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                return Some(AliasMatch {
                    name: candidate.to_string(),
                    value: value.clone(),
                    residual,
                });
            }

            let index = candidate.rfind(char::is_whitespace)?;
            candidate = candidate[..index].trim_end();
        }
    }

    /// Substitute the residual into a template
    pub fn format(&self, value: &str, residual: &str) -> String {
        expand_template(value, &self.marker, residual)
    }

    /// Preview line shown when an alias is expanded
    pub fn format_label(&self, alias_name: &str, input: &str) -> String {
        LABEL_PLACEHOLDERS
            .replace_all(&self.label_format, |caps: &Captures| {
                match caps[1].to_ascii_lowercase().as_str() {
                    "a" => alias_name.to_string(),
                    _ => input.to_string(),
                }
            })
            .into_owned()
    }

    /// Merge aliases from a `name=template` file, returning how many were read
    pub fn load_file(&self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|e| Error::AliasFileFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut entries = self.write();
        let mut loaded = 0;
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((name, template)) = line.split_once(FILE_SEPARATOR) else {
                warn!(
                    "{}:{}: alias line has no '{}', skipping",
                    path.display(),
                    number + 1,
                    FILE_SEPARATOR
                );
                continue;
            };

            match normalize_name(name) {
                Ok(name) => {
                    entries.insert(name, template.trim().to_string());
                    loaded += 1;
                }
                Err(e) => warn!("{}:{}: {}", path.display(), number + 1, e),
            }
        }

        Ok(loaded)
    }

    /// Write the table to its backing file, if it has one
    ///
    /// Entries still identical to their configuration seed are left out.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let mut content = String::new();
        for (name, template) in self.read().iter() {
            if self.seeded.get(name) == Some(template) {
                continue;
            }
            content.push_str(name);
            content.push(FILE_SEPARATOR);
            content.push_str(template);
            content.push('\n');
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::AliasFileFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        fs::write(path, content).map_err(|e| Error::AliasFileFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!("Saved aliases to {}", path.display());
        Ok(())
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new("%1")
    }
}

/// Substitute `residual` for every `marker` in `template`
///
/// Substitution is a single pass: marker text inside the residual is left
/// alone. When the template has no marker, a non-empty residual is appended
/// after a space.
pub fn expand_template(template: &str, marker: &str, residual: &str) -> String {
    let residual = residual.trim();
    if !marker.is_empty() && template.contains(marker) {
        template.replace(marker, residual)
    } else if residual.is_empty() {
        template.to_string()
    } else {
        format!("{} {}", template, residual)
    }
}

/// Collapse whitespace inside an alias name and reject unusable names
fn normalize_name(name: &str) -> Result<String> {
    let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(Error::InvalidAliasName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if normalized.contains(FILE_SEPARATOR) {
        return Err(Error::InvalidAliasName {
            name: name.to_string(),
            reason: format!("name cannot contain '{}'", FILE_SEPARATOR),
        });
    }
    Ok(normalized)
}
