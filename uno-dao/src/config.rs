//! Configuration for the Dao.

use crate::{DaoError, DaoResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the database lives and where SQL files are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaoConfig {
    /// Database location: a file path, `sqlite://path`, or `:memory:`.
    pub database_url: String,

    /// Root directory for SQL template files.
    #[serde(default = "default_sql_dir")]
    pub sql_dir: PathBuf,

    /// How long to wait on a locked database.
    #[serde(default = "default_busy_timeout")]
    #[serde(with = "seconds")]
    pub busy_timeout: Duration,
}

fn default_sql_dir() -> PathBuf {
    PathBuf::from("sql")
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

/// In-memory database marker.
pub const MEMORY: &str = ":memory:";

impl DaoConfig {
    /// Create a new configuration with the given database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            sql_dir: default_sql_dir(),
            busy_timeout: default_busy_timeout(),
        }
    }

    /// Configuration for a private in-memory database.
    pub fn memory() -> Self {
        Self::new(MEMORY)
    }

    /// Create configuration from environment variables.
    ///
    /// Uses the following environment variables:
    /// - `DATABASE_URL`: Required database URL
    /// - `UNO_SQL_DIR`: SQL template root (default: `sql`)
    /// - `DATABASE_BUSY_TIMEOUT`: Busy timeout in seconds (default: 5)
    pub fn from_env() -> DaoResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> DaoResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| DaoError::Config("DATABASE_URL not set".into()))?;
        let mut config = Self::new(database_url);

        if let Some(dir) = lookup("UNO_SQL_DIR") {
            config.sql_dir = PathBuf::from(dir);
        }

        if let Some(timeout) = lookup("DATABASE_BUSY_TIMEOUT") {
            config.busy_timeout = Duration::from_secs(
                timeout
                    .parse()
                    .map_err(|_| DaoError::Config("Invalid DATABASE_BUSY_TIMEOUT".into()))?,
            );
        }

        Ok(config)
    }

    /// Set the SQL template root.
    pub fn sql_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sql_dir = dir.into();
        self
    }

    /// Set the busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// The SQLite location: `None` for an in-memory database, otherwise
    /// the file path with any `sqlite:` scheme removed.
    pub fn sqlite_path(&self) -> DaoResult<Option<PathBuf>> {
        let url = self.database_url.trim();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if path.is_empty() {
            return Err(DaoError::Config("empty database URL".into()));
        }
        if path.contains("://") {
            return Err(DaoError::Config(format!("unsupported database URL: {url}")));
        }
        if path == MEMORY {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(path)))
    }
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self::memory()
    }
}

/// Durations as whole seconds.
mod seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sqlite_path() {
        assert_eq!(DaoConfig::memory().sqlite_path().unwrap(), None);
        assert_eq!(DaoConfig::new("sqlite://:memory:").sqlite_path().unwrap(), None);
        assert_eq!(
            DaoConfig::new("sqlite://data/app.db").sqlite_path().unwrap(),
            Some(PathBuf::from("data/app.db"))
        );
        assert_eq!(
            DaoConfig::new("app.db").sqlite_path().unwrap(),
            Some(PathBuf::from("app.db"))
        );
        assert!(DaoConfig::new("postgres://localhost/db").sqlite_path().is_err());
        assert!(DaoConfig::new("").sqlite_path().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite://app.db"),
            ("DATABASE_BUSY_TIMEOUT", "9"),
        ]
        .into();
        let config = DaoConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.busy_timeout, Duration::from_secs(9));
        assert_eq!(config.sql_dir, PathBuf::from("sql"));

        assert!(matches!(DaoConfig::from_lookup(|_| None), Err(DaoError::Config(_))));
        let bad: HashMap<&str, &str> =
            [("DATABASE_URL", "x.db"), ("DATABASE_BUSY_TIMEOUT", "soon")].into();
        assert!(DaoConfig::from_lookup(|k| bad.get(k).map(|v| v.to_string())).is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let config: DaoConfig = serde_json::from_str(r#"{"database_url": ":memory:"}"#).unwrap();
        assert_eq!(config, DaoConfig::memory());
        let text = serde_json::to_string(&config.busy_timeout(Duration::from_secs(2))).unwrap();
        assert!(text.contains(r#""busy_timeout":2"#));
    }
}
