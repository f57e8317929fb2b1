//! Layered settings for live variables.
//!
//! Sources, later ones win:
//! - Default values
//! - `livevar.toml` in the current directory or the nearest ancestor
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `LIVEVAR_` and use double
//! underscores to separate nested levels:
//! - `LIVEVAR_FILE=assets/live_vars.json` sets `file`
//! - `LIVEVAR_LIVE=false` sets `live`
//! - `LIVEVAR_WATCH__DEBOUNCE_MS=200` sets `watch.debounce_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::watcher::DEFAULT_DEBOUNCE_MS;

/// Name of the settings file searched for by [`Settings::load`].
pub const SETTINGS_FILE: &str = "livevar.toml";

const ENV_PREFIX: &str = "LIVEVAR_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Backing document for saved variables
    #[serde(default = "default_file")]
    pub file: PathBuf,

    /// Reload automatically when the backing file changes
    #[serde(default = "default_true")]
    pub live: bool,

    /// Version written into the backing document
    #[serde(default)]
    pub version: i32,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Quiet period before a file change is reported
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for every target
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target level overrides, e.g. `livevar = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_file() -> PathBuf {
    PathBuf::from("live_vars.json")
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file: default_file(),
            live: true,
            version: 0,
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load from defaults, the nearest `livevar.toml` and the environment.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_config().unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
        Self::figment(&config_path).extract().map_err(Box::new)
    }

    /// Load from defaults, a specific file and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Search the current directory and its ancestors for `livevar.toml`.
    pub fn find_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .map(|dir| dir.join(SETTINGS_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Write these settings as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Write a default settings file at `path`.
    pub fn init_config_file(
        path: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !force && path.exists() {
            return Err(format!(
                "Configuration file {} already exists. Use --force to overwrite",
                path.display()
            )
            .into());
        }

        Settings::default().save(path)?;
        Ok(path.to_path_buf())
    }
}
