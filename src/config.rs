//! Configuration for the server and the CLI client.
//!
//! The server reads environment variables once at startup:
//! - `ROASTCHECK_DATABASE_URL`: SQLite URL or file path (required)
//! - `ROASTCHECK_AUTH_TOKEN`: required when the database URL names a
//!   token-authenticated remote backend (`libsql://`, `https://`, `wss://`)
//! - `ROASTCHECK_PORT`: port to listen on (default: 8080)
//!
//! The client loads a YAML file and then applies environment overrides:
//! - `ROASTCHECK_SERVER_URL`
//! - `ROASTCHECK_REVALIDATE_SECS`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::DEFAULT_REVALIDATE_INTERVAL;

const REMOTE_SCHEMES: &[&str] = &["libsql://", "https://", "wss://"];

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Connection string for the store
    pub database_url: String,
    /// Token for remote backends
    pub auth_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("ROASTCHECK_DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("ROASTCHECK_DATABASE_URL"))?;

        let auth_token = lookup("ROASTCHECK_AUTH_TOKEN").filter(|v| !v.trim().is_empty());
        if is_remote_url(&database_url) && auth_token.is_none() {
            return Err(ConfigError::Missing("ROASTCHECK_AUTH_TOKEN"));
        }

        let port: u16 = match lookup("ROASTCHECK_PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ROASTCHECK_PORT", p))?,
            None => 8080,
        };

        Ok(Self {
            port,
            database_url,
            auth_token,
        })
    }

    /// True when the database URL names a token-authenticated remote backend.
    pub fn is_remote(&self) -> bool {
        is_remote_url(&self.database_url)
    }
}

fn is_remote_url(url: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|s| url.starts_with(s))
}

/// Client configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    /// Base URL of the roastcheck server
    pub server_url: ConfigValue<String>,
    /// Seconds between background revalidations
    pub revalidate_secs: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    server_url: Option<String>,
    revalidate_secs: Option<u64>,
}

impl ClientConfig {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    pub fn load_with(
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut server_url =
            ConfigValue::new("http://localhost:8080".to_string(), ConfigSource::Default);
        let mut revalidate_secs =
            ConfigValue::new(DEFAULT_REVALIDATE_INTERVAL.as_secs(), ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path);

            if let Some(url) = file_config.server_url {
                server_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(secs) = file_config.revalidate_secs {
                revalidate_secs = ConfigValue::new(secs, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Some(url) = lookup("ROASTCHECK_SERVER_URL") {
            server_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(secs) = lookup("ROASTCHECK_REVALIDATE_SECS") {
            let parsed: u64 = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ROASTCHECK_REVALIDATE_SECS", secs))?;
            revalidate_secs = ConfigValue::new(parsed, ConfigSource::Environment);
        }

        Ok(Self {
            server_url,
            revalidate_secs,
            config_file,
        })
    }

    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs.value.max(1))
    }

    /// Default config file path (platform config dir + roastcheck/config.yaml)
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roastcheck")
            .join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A required value is absent. Fatal at startup.
    Missing(&'static str),
    InvalidValue(&'static str, String),
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required configuration: {}", key),
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_server_requires_database_url() {
        let err = ServerConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ROASTCHECK_DATABASE_URL")));
        assert!(err.to_string().contains("ROASTCHECK_DATABASE_URL"));
    }

    #[test]
    fn test_server_defaults() {
        let config =
            ServerConfig::from_lookup(env(&[("ROASTCHECK_DATABASE_URL", "roast.db")])).unwrap();
        assert_eq!(config.database_url, "roast.db");
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert!(!config.is_remote());
    }

    #[test]
    fn test_remote_backend_requires_token() {
        let err = ServerConfig::from_lookup(env(&[(
            "ROASTCHECK_DATABASE_URL",
            "libsql://roast.example.com",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ROASTCHECK_AUTH_TOKEN")));

        let config = ServerConfig::from_lookup(env(&[
            ("ROASTCHECK_DATABASE_URL", "libsql://roast.example.com"),
            ("ROASTCHECK_AUTH_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert!(config.is_remote());
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(env(&[
            ("ROASTCHECK_DATABASE_URL", "roast.db"),
            ("ROASTCHECK_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("ROASTCHECK_PORT", _)));
    }

    #[test]
    fn test_client_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = ClientConfig::load_with(Some(config_path), env(&[])).unwrap();
        assert_eq!(config.server_url.value, "http://localhost:8080");
        assert_eq!(config.server_url.source, ConfigSource::Default);
        assert_eq!(config.revalidate_interval(), Duration::from_secs(30));
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_client_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "server_url: http://stage.local:9000").unwrap();
        writeln!(file, "revalidate_secs: 5").unwrap();

        let config = ClientConfig::load_with(Some(config_path.clone()), env(&[])).unwrap();
        assert_eq!(config.server_url.value, "http://stage.local:9000");
        assert_eq!(config.server_url.source, ConfigSource::File);
        assert_eq!(config.revalidate_secs.value, 5);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_client_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "server_url: http://fromfile").unwrap();

        let config = ClientConfig::load_with(
            Some(config_path),
            env(&[("ROASTCHECK_SERVER_URL", "http://fromenv")]),
        )
        .unwrap();
        assert_eq!(config.server_url.value, "http://fromenv");
        assert_eq!(config.server_url.source, ConfigSource::Environment);
        assert_eq!(config.revalidate_secs.source, ConfigSource::Default);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let err = ClientConfig::load_with(Some(config_path), env(&[])).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
