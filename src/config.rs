use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

// =============================================================================
// Storage-related constants
// =============================================================================

/// Suffix of the temp file written next to the target before the rename
pub const DEFAULT_TEMP_SUFFIX: &str = ".tmp";

/// Default log level when neither config nor RUST_LOG set one
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub store: StoreConfig,
    pub log: LogConfig,
}

/// How index documents are written
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Pretty-print instead of compact output
    pub pretty: bool,
    /// Flush the temp file and directory to disk before and after the rename
    pub fsync: bool,
    pub temp_suffix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            fsync: true,
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Filter directive, overridden by RUST_LOG
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Log to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
            file: None,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing fields use their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else the default config file if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Returns the configuration directory for repo-index.
/// Uses the platform config dir (`$XDG_CONFIG_HOME` or ~/.config on Linux,
/// ~/Library/Application Support on macOS, %APPDATA% on Windows),
/// or ./repo-index if none is available.
pub fn config_dir() -> PathBuf {
    config_dir_with(dirs::config_dir())
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn config_dir_with(platform_config_dir: Option<PathBuf>) -> PathBuf {
    platform_config_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repo-index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<Config>(json!({
            "store": {
                "pretty": true
            }
        }))
        .unwrap();

        assert!(result.store.pretty);
        assert!(result.store.fsync);
        assert_eq!(result.store.temp_suffix, ".tmp");
        assert_eq!(result.log, LogConfig::default());
    }

    #[test]
    fn config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<Config>(json!({
            "store": {
                "pretty": true,
                "fsync": false,
                "tempSuffix": ".partial"
            },
            "log": {
                "level": "debug",
                "json": true,
                "file": "/var/log/repo-index.log"
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            Config {
                store: StoreConfig {
                    pretty: true,
                    fsync: false,
                    temp_suffix: ".partial".to_string(),
                },
                log: LogConfig {
                    level: "debug".to_string(),
                    json: true,
                    file: Some(PathBuf::from("/var/log/repo-index.log")),
                },
            }
        );
    }

    #[test]
    fn from_file_reads_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"log": {"level": "warn"}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.log.level, "warn");
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn from_file_reports_missing_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = Config::from_file(&temp_dir.path().join("missing.json"));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn from_file_reports_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"store": {"pretty": "yes"}}"#).unwrap();

        let result = Config::from_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn config_dir_with_uses_platform_config_dir() {
        let path = config_dir_with(Some(PathBuf::from("/home/user/.config")));

        assert_eq!(path, PathBuf::from("/home/user/.config/repo-index"));
    }

    #[test]
    fn config_dir_with_falls_back_to_current_dir_when_unavailable() {
        let path = config_dir_with(None);
        assert_eq!(path, PathBuf::from("./repo-index"));
    }

    #[test]
    fn config_path_is_config_json_in_config_dir() {
        assert_eq!(config_path(), config_dir().join("config.json"));
        assert_eq!(
            config_path().parent().and_then(|dir| dir.file_name()),
            Some(std::ffi::OsStr::new("repo-index"))
        );
    }
}
