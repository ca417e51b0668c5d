//! CLI configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/ewsdb/config.toml, `EWSDB_CONFIG` or `--config`)
//! 3. Environment variables (EWSDB_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "EWSDB";

/// Keys accepted by `config set`
pub const KEYS: &[&str] = &["data_dir", "database_file", "busy_timeout_ms"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name inside `data_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// How long a statement waits on a locked database
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Load from the `--config` path if given, the default location otherwise
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_from_path(&Self::config_file_path()),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_DATABASE_FILE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.database_file = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_BUSY_TIMEOUT_MS", ENV_PREFIX)) {
            self.busy_timeout_ms = val
                .parse()
                .with_context(|| format!("Invalid {}_BUSY_TIMEOUT_MS: '{}'", ENV_PREFIX, val))?;
        }

        Ok(())
    }

    /// Set one key from its string form, as given to `config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => {
                self.data_dir = value.into();
            }
            "database_file" => {
                if value.is_empty() {
                    bail!("database_file cannot be empty");
                }
                self.database_file = value.to_string();
            }
            "busy_timeout_ms" => {
                self.busy_timeout_ms = value
                    .parse()
                    .context("Invalid value for busy_timeout_ms. Use a number of milliseconds.")?;
            }
            _ => {
                bail!(
                    "Unknown configuration key: '{}'\nValid keys: {}",
                    key,
                    KEYS.join(", ")
                );
            }
        }
        Ok(())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with the EWSDB_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ewsdb")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ewsdb")
}

fn default_database_file() -> String {
    "ewsdb.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serializes tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    pub(crate) struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        pub(crate) fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    pub(crate) const ENV_VARS: &[&str] = &[
        "EWSDB_CONFIG",
        "EWSDB_DATA_DIR",
        "EWSDB_DATABASE_FILE",
        "EWSDB_BUSY_TIMEOUT_MS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("ewsdb"));
        assert_eq!(config.database_file, "ewsdb.db");
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_database_path() {
        let config = Config {
            data_dir: PathBuf::from("/data/ewsdb"),
            database_file: "library.db".to_string(),
            ..Config::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/data/ewsdb/library.db"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("EWSDB_DATA_DIR", "/tmp/ewsdb-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/ewsdb-test"));
    }

    #[test]
    fn test_env_override_database_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("EWSDB_DATABASE_FILE", "other.db");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.database_file, "other.db");

        // Empty string keeps the current value
        env::set_var("EWSDB_DATABASE_FILE", "");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.database_file, "other.db");
    }

    #[test]
    fn test_env_override_busy_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("EWSDB_BUSY_TIMEOUT_MS", "250");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.busy_timeout_ms, 250);

        env::set_var("EWSDB_BUSY_TIMEOUT_MS", "soon");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("data_dir", "/srv/ewsdb").unwrap();
        config.set_value("database_file", "prod.db").unwrap();
        config.set_value("busy_timeout_ms", "100").unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/srv/ewsdb/prod.db"));
        assert_eq!(config.busy_timeout_ms, 100);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();

        assert!(config.set_value("busy_timeout_ms", "-1").is_err());
        assert!(config.set_value("database_file", "").is_err());

        let err = config.set_value("sync_url", "x").unwrap_err();
        assert!(err.to_string().contains("Valid keys"));
        assert!(config.set_value("foreign_keys", "true").is_err());
    }

    #[test]
    fn test_serialization() {
        let config = Config {
            data_dir: PathBuf::from("/data/ewsdb"),
            database_file: "books.db".to_string(),
            busy_timeout_ms: 1500,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("database_file"));
        assert!(toml_str.contains("busy_timeout_ms"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            busy_timeout_ms = 42
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.busy_timeout_ms, 42);
        // Unset keys fall back to defaults
        assert_eq!(config.database_file, "ewsdb.db");
    }

    #[test]
    fn test_load_ignores_retired_keys() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str("foreign_keys = true\nbusy_timeout_ms = 9").unwrap();
        assert_eq!(config.busy_timeout_ms, 9);
        assert!(!toml::to_string(&config).unwrap().contains("foreign_keys"));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_value("data_dir", "/var/lib/ewsdb").unwrap();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.data_dir, PathBuf::from("/var/lib/ewsdb"));
    }

    #[test]
    fn test_config_file_path_env_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("EWSDB_CONFIG", "/etc/ewsdb.toml");
        assert_eq!(Config::config_file_path(), PathBuf::from("/etc/ewsdb.toml"));
    }
}
