//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic merges ([`ConfigLoader::merge`])
//! 3. Config file (`onelink.toml`, or `onelink.yaml` / `onelink.yml` with the
//!    `yaml-config` feature)
//! 4. Environment variables (`ONELINK_*`)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `ONELINK_` prefix with `__` as the nesting separator:
//!
//! - `ONELINK_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `ONELINK_SERVER__PORT=5701` → `server.port = 5701`
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .file("./deploy/onelink.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::OnelinkConfig;
use super::validation::validate_config;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "ONELINK_";

/// File names searched in each search path, in order.
#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["onelink.toml"];
#[cfg(feature = "yaml-config")]
const YAML_NAMES: &[&str] = &["onelink.yaml", "onelink.yml"];

/// Layered configuration loader.
pub struct ConfigLoader {
    /// Programmatic layers.
    figment: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the current directory and the user
    /// config directory, and reads `ONELINK_*` variables.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    ///
    /// Once any path is added the default search paths are no longer used.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, below file and environment.
    pub fn merge(mut self, config: OnelinkConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, normalises and validates the configuration.
    ///
    /// # Errors
    /// - [`ConfigError::FileNotFound`] if an explicit file does not exist
    /// - [`ConfigError::ParseError`] if a source cannot be parsed
    /// - a validation error, see [`validate_config`]
    pub fn load(self) -> ConfigResult<OnelinkConfig> {
        let figment = self.build_figment()?;
        let mut config: OnelinkConfig = figment.extract()?;

        for bot in &mut config.bots {
            bot.transport.path = bot.transport.normalized_path();
        }
        validate_config(&config)?;

        debug!(
            logging_level = %config.logging.level,
            bots = config.bots.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(OnelinkConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("onelink"));
        }
        paths
    }

    /// Merges the first config file found; earlier search paths win.
    #[allow(unused_mut)]
    fn load_config_files(&self, figment: Figment) -> Figment {
        let mut candidates: Vec<&str> = Vec::new();
        #[cfg(feature = "toml-config")]
        candidates.extend(TOML_NAMES);
        #[cfg(feature = "yaml-config")]
        candidates.extend(YAML_NAMES);

        for dir in self.resolve_search_paths() {
            for name in &candidates {
                let path = dir.join(name);
                if path.exists() {
                    info!(path = %path.display(), "Loading configuration file");
                    return match merge_config_file(figment.clone(), &path) {
                        Ok(merged) => merged,
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Skipping configuration file");
                            figment
                        }
                    };
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }
}

/// Merges a single config file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}
