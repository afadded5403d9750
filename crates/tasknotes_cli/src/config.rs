//! Runtime configuration for the `tasknotes` binary.
//!
//! # Responsibility
//! - Load an optional YAML file into [`AppConfig`].
//! - Apply `TASKNOTES_*` environment overrides on top.
//!
//! # Invariants
//! - Every field has a default, so an empty or missing file is valid.
//! - `log_dir` handed to logging is always absolute.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_PATH: &str = "TASKNOTES_DATABASE_PATH";
pub const ENV_BIND_ADDR: &str = "TASKNOTES_BIND_ADDR";
pub const ENV_LOG_LEVEL: &str = "TASKNOTES_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKNOTES_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("var/tasknotes.sqlite3"),
            bind_addr: "127.0.0.1:8000".to_string(),
            log_level: tasknotes_core::default_log_level().to_string(),
            log_dir: PathBuf::from("var/log"),
        }
    }
}

impl AppConfig {
    /// Reads `path` when given, then applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies overrides looked up through `lookup`; blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = value_of(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = value_of(ENV_BIND_ADDR) {
            self.bind_addr = value;
        }
        if let Some(value) = value_of(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = value_of(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(value);
        }
        self
    }

    /// `log_dir` resolved against `base` when relative.
    pub fn absolute_log_dir(&self, base: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            base.join(&self.log_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AppConfig::from_yaml("bind_addr: 0.0.0.0:9000\n").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.database_path, AppConfig::default().database_path);
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_yaml("database: x.sqlite3\n").is_err());
    }

    #[test]
    fn reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_path: /srv/tasknotes/app.sqlite3").unwrap();
        writeln!(file, "log_level: warn").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/srv/tasknotes/app.sqlite3")
        );
        assert_eq!(config.log_level, "warn");

        let missing = AppConfig::from_file(Path::new("/nonexistent/tasknotes.yaml"));
        assert!(missing.is_err());
    }

    #[test]
    fn environment_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_BIND_ADDR, "127.0.0.1:9999"),
            (ENV_LOG_LEVEL, "trace"),
            (ENV_LOG_DIR, "  "),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_yaml("bind_addr: 0.0.0.0:80\nlog_dir: /var/log/tasknotes\n")
            .unwrap()
            .with_overrides(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/tasknotes"));
    }

    #[test]
    fn relative_log_dir_is_resolved() {
        let config = AppConfig::default();
        let resolved = config.absolute_log_dir(Path::new("/srv/app"));
        assert_eq!(resolved, PathBuf::from("/srv/app/var/log"));
    }
}
