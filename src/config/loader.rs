//! Configuration File Loading
//!
//! Handles loading and saving configuration files from various locations
//! with support for multiple formats and fallback mechanisms.

use super::Config;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "SHELLROUTE_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files (without extension)
    search_paths: Vec<PathBuf>,
    /// Supported configuration file formats
    supported_formats: Vec<ConfigFormat>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Format implied by a file extension; TOML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Whether to fall back to the default config if none exists
    pub create_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    ///
    /// `$SHELLROUTE_CONFIG` takes precedence over the search paths.
    pub fn load_with_options(options: LoadOptions) -> Result<Config> {
        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            if !explicit.trim().is_empty() {
                return Self::load_from_path(Path::new(&explicit), options.validate);
            }
        }

        let mut loader = Self::new();
        loader.load_from_search_paths(options)
    }

    /// Load configuration from an explicit file
    pub fn load_from_path(path: &Path, validate: bool) -> Result<Config> {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let config = Self::load_config_file(path, ConfigFormat::from_path(path))?;
        if validate {
            validate_config(&config)?;
        }
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load using this loader's search paths
    pub fn load_from_search_paths(&mut self, options: LoadOptions) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config() {
            if options.validate {
                validate_config(&config)?;
            }
            info!("Configuration loaded from {}", path.display());
            self.current_path = Some(path);
            return Ok(config);
        }

        if options.create_default {
            debug!("No configuration file found, using defaults");
            Ok(Config::default())
        } else {
            Err(Error::ConfigNotFound)
        }
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Option<(PathBuf, Config)> {
        for path in &self.search_paths {
            for format in &self.supported_formats {
                let config_path = path.with_extension(format.extension());
                if !config_path.exists() {
                    continue;
                }

                match Self::load_config_file(&config_path, *format) {
                    Ok(config) => return Some((config_path, config)),
                    Err(e) => {
                        warn!(
                            "Failed to load config from {}: {}",
                            config_path.display(),
                            e
                        );
                    }
                }
            }
        }

        None
    }

    /// Load a specific configuration file
    fn load_config_file(path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                format: format.name().to_string(),
                reason: e.to_string(),
            }),
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join("shellroute"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("shellroute").join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".shellroute"));
        }

        paths
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let separator = &config.behavior.multiple_cmd_separator;
    if !separator.is_empty() && separator.trim().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "behavior.multiple_cmd_separator".to_string(),
            reason: "Separator cannot be whitespace only".to_string(),
        });
    }

    if config.behavior.alias_param_marker.is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "behavior.alias_param_marker".to_string(),
            reason: "Alias parameter marker cannot be empty".to_string(),
        });
    }

    if config.shell.program.as_os_str().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "shell.program".to_string(),
            reason: "Shell program cannot be empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for group in &config.groups {
        if group.name.trim().is_empty() || group.name.contains(char::is_whitespace) {
            return Err(Error::ConfigValidationFailed {
                field: "groups.name".to_string(),
                reason: format!("Group name '{}' must be a single word", group.name),
            });
        }
        if !seen.insert(group.name.as_str()) {
            return Err(Error::ConfigValidationFailed {
                field: "groups.name".to_string(),
                reason: format!("Group '{}' is declared twice", group.name),
            });
        }
    }

    for app in &config.apps {
        if app.label.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "apps.label".to_string(),
                reason: "Application label cannot be empty".to_string(),
            });
        }
    }

    Ok(())
}
