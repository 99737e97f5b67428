//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for an [`Application`](crate::Application).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory view templates are resolved against
    pub view_dir: PathBuf,

    /// Directory SQL template files are resolved against
    pub sql_dir: PathBuf,

    /// Include the error source chain in error responses
    pub debug_errors: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            view_dir: PathBuf::from("views"),
            sql_dir: PathBuf::from("sql"),
            debug_errors: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the environment (after reading a `.env` file, if any).
    ///
    /// - `UNO_VIEW_DIR`
    /// - `UNO_SQL_DIR`
    /// - `UNO_DEBUG_ERRORS` (`1`, `true`, `yes`)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup("UNO_VIEW_DIR") {
            config.view_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("UNO_SQL_DIR") {
            config.sql_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("UNO_DEBUG_ERRORS") {
            config.debug_errors = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_view_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.view_dir = dir.into();
        self
    }

    pub fn with_sql_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sql_dir = dir.into();
        self
    }

    pub fn with_debug_errors(mut self, enable: bool) -> Self {
        self.debug_errors = enable;
        self
    }
}
