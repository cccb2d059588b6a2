//! Layered configuration loading with figment.
//!
//! Layers, lowest priority first:
//!
//! 1. [`SpoutConfig::default`]
//! 2. the profile file next to the located file (`spout.{profile}.toml`)
//! 3. the located file (`spout.toml`, `config.toml`, or their YAML twins)
//! 4. `SPOUT_*` environment variables, `__` separating sections
//! 5. values passed to [`ConfigLoader::merge`]
//!
//! TOML files need the `toml-config` feature and YAML files (`.yaml`/`.yml`)
//! need `yaml-config`. Without either, only defaults, env and merges apply.
//!
//! ```rust,ignore
//! // SPOUT_SOURCE__PORT=8080 SPOUT_CHANNEL__CAPACITY=500
//! let config = ConfigLoader::new()
//!     .file("./config/spout.toml")
//!     .merge(serde_json::json!({ "source": { "bind": "127.0.0.1" } }))
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
use serde::Serialize;
use tracing::{debug, info};

use super::error::{ConfigLoadError, ConfigLoadResult};
use super::schema::SpoutConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "SPOUT_";
/// Selects the profile file, e.g. `SPOUT_PROFILE=production`.
const PROFILE_VAR: &str = "SPOUT_PROFILE";

const FILE_STEMS: [&str; 2] = ["spout", "config"];
const FILE_EXTENSIONS: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "toml",
    #[cfg(feature = "yaml-config")]
    "yaml",
    #[cfg(feature = "yaml-config")]
    "yml",
];

/// Builds a [`SpoutConfig`] from files, environment and in-code overrides.
pub struct ConfigLoader {
    file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    profile: Option<String>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Searches the working directory and the user config directory, reads
    /// the profile from `SPOUT_PROFILE` and applies `SPOUT_*` variables.
    pub fn new() -> Self {
        Self {
            file: None,
            search_paths: Vec::new(),
            profile: std::env::var(PROFILE_VAR).ok().filter(|p| !p.is_empty()),
            env: true,
            overrides: Figment::new(),
        }
    }

    /// Loads this file instead of searching for one.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replaces the default search directories. Earlier paths win.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Overrides every other layer with `values`.
    ///
    /// `values` may be a whole [`SpoutConfig`] or any partial tree that
    /// serializes to the same shape.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .merge(serde_json::json!({ "channel": { "capacity": 5 } }))
    ///     .load()?;
    /// ```
    pub fn merge<T: Serialize>(mut self, values: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(values));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigLoadResult<SpoutConfig> {
        let profile = self.profile.clone();
        let config: SpoutConfig = self
            .figment()?
            .extract()
            .map_err(|e| ConfigLoadError::ParseError(e.to_string()))?;
        validate_config(&config)?;

        debug!(
            profile = profile.as_deref().unwrap_or("-"),
            source = %config.source.name,
            capacity = config.channel.capacity,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(self) -> ConfigLoadResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SpoutConfig::default()));
        for path in self.config_files()? {
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_file(figment, &path)?;
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }
        Ok(figment.merge(self.overrides))
    }

    /// Files to merge, lowest priority first.
    fn config_files(&self) -> ConfigLoadResult<Vec<PathBuf>> {
        if let Some(file) = &self.file {
            if !file.is_file() {
                return Err(ConfigLoadError::FileNotFound(file.clone()));
            }
            return Ok(vec![file.clone()]);
        }

        for dir in self.search_dirs() {
            for stem in FILE_STEMS {
                for ext in FILE_EXTENSIONS {
                    let base = dir.join(format!("{stem}.{ext}"));
                    if !base.is_file() {
                        continue;
                    }
                    let mut files = Vec::with_capacity(2);
                    if let Some(profile) = &self.profile {
                        let variant = dir.join(format!("{stem}.{profile}.{ext}"));
                        if variant.is_file() {
                            files.push(variant);
                        }
                    }
                    files.push(base);
                    return Ok(files);
                }
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Vec::new())
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("spout")))
            .collect()
    }
}

#[cfg_attr(
    not(any(feature = "toml-config", feature = "yaml-config")),
    allow(unused_variables)
)]
fn merge_file(figment: Figment, path: &Path) -> ConfigLoadResult<Figment> {
    match path.extension().and_then(|ext| ext.to_str()) {
        #[cfg(feature = "toml-config")]
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigLoadError::ParseError(format!(
            "unsupported configuration file {}",
            path.display()
        ))),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigLoadResult<SpoutConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigLoadResult<SpoutConfig> {
    ConfigLoader::new().file(path).load()
}
