//! Widget configuration: backend location, credentials and state file.
//!
//! Values are layered: built-in defaults, then the JSON config file, then
//! `FILESELECT_*` environment variables. Command-line flags are applied last
//! by the caller through [`WidgetConfig::with_overrides`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::path_processing::{app_config_path, expand_tilde, path_from_env};

pub const CONFIG_PATH_ENV: &str = "FILESELECT_CONFIG_PATH";
pub const API_BASE_ENV: &str = "FILESELECT_API_BASE";
pub const API_TOKEN_ENV: &str = "FILESELECT_API_TOKEN";
pub const STATE_PATH_ENV: &str = "FILESELECT_STATE_PATH";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SELECTIONS_FILE_NAME: &str = "selections.json";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// On-disk shape of the config file. Every field is optional.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub api_base: Option<String>,
    pub api_token: Option<String>,
    pub state_path: Option<String>,
}

/// Fully resolved configuration.
#[derive(Clone)]
pub struct WidgetConfig {
    pub api_base: String,
    pub api_token: Option<String>,
    pub state_path: PathBuf,
}

impl fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("api_base", &self.api_base)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("state_path", &self.state_path)
            .finish()
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_token: None,
            state_path: app_config_path(SELECTIONS_FILE_NAME),
        }
    }
}

impl WidgetConfig {
    /// Load from the default (or `FILESELECT_CONFIG_PATH`) location and apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = read_config_file(path)?;
        let mut config = Self::default();
        config.merge_file(file);
        config.apply_env();
        Ok(config)
    }

    /// Apply command-line values; `None` keeps the current value.
    pub fn with_overrides(mut self, api_base: Option<String>, api_token: Option<String>, state_path: Option<PathBuf>) -> Self {
        if let Some(api_base) = non_blank(api_base) {
            self.api_base = api_base;
        }
        if let Some(api_token) = non_blank(api_token) {
            self.api_token = Some(api_token);
        }
        if let Some(state_path) = state_path {
            self.state_path = state_path;
        }
        self
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(api_base) = non_blank(file.api_base) {
            self.api_base = api_base;
        }
        if let Some(api_token) = non_blank(file.api_token) {
            self.api_token = Some(api_token);
        }
        if let Some(state_path) = non_blank(file.state_path) {
            self.state_path = expand_tilde(&state_path);
        }
    }

    fn apply_env(&mut self) {
        if let Some(api_base) = non_blank(std::env::var(API_BASE_ENV).ok()) {
            self.api_base = api_base;
        }
        if let Some(api_token) = non_blank(std::env::var(API_TOKEN_ENV).ok()) {
            self.api_token = Some(api_token);
        }
        if let Some(state_path) = path_from_env(STATE_PATH_ENV) {
            self.state_path = state_path;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    path_from_env(CONFIG_PATH_ENV).unwrap_or_else(|| app_config_path(CONFIG_FILE_NAME))
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(file) => Ok(file),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse config file; using defaults"
                );
                Ok(ConfigFile::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
