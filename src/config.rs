//! Configuration management for Quotaguard.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `QUOTAGUARD__<SECTION>__<KEY>` environment variables. Command-line flags
//! are applied on top by the binary.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{QuotaguardError, Result};
use crate::ratelimit::PolicyTable;

const ENV_PREFIX: &str = "QUOTAGUARD";

/// Main configuration for the Quotaguard service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotaguardConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Header carrying the authenticated user id, set by the upstream
    /// session layer
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            user_header: default_user_header(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Path to a YAML policy file; built-in defaults apply when unset
    #[serde(default)]
    pub policies_path: Option<String>,

    /// Seconds between sweeps of expired counters
    #[serde(default = "default_janitor_interval")]
    pub janitor_interval_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            policies_path: None,
            janitor_interval_secs: default_janitor_interval(),
        }
    }
}

fn default_janitor_interval() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl QuotaguardConfig {
    /// Load defaults, an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        let config: QuotaguardConfig = builder.add_source(env).build()?.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file only.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: QuotaguardConfig = serde_yaml::from_str(&contents)
            .map_err(|e| QuotaguardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.janitor_interval_secs == 0 {
            return Err(QuotaguardError::Config(
                "rate_limiting.janitor_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.user_header.trim().is_empty() {
            return Err(QuotaguardError::Config(
                "server.user_header must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the policy table, reading the policy file if one is configured.
    pub fn policy_table(&self) -> Result<PolicyTable> {
        match &self.rate_limiting.policies_path {
            Some(path) => PolicyTable::from_file(path),
            None => Ok(PolicyTable::default()),
        }
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limiting.janitor_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::Category;
    use std::path::PathBuf;

    fn write_temp(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quotaguard-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = QuotaguardConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.server.user_header, "x-user-id");
        assert_eq!(config.janitor_interval(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
        assert!(config.policy_table().is_ok());
    }

    #[test]
    fn test_load_layers_file_over_defaults() {
        let path = write_temp(
            r#"
server:
  listen_addr: "0.0.0.0:9000"
rate_limiting:
  janitor_interval_secs: 15
"#,
        );

        let config = QuotaguardConfig::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.server.user_header, "x-user-id");
        assert_eq!(config.janitor_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_temp("rate_limiting:\n  janitor_interval_secs: 15\n");

        let vars: ::config::Map<String, String> = [
            ("QUOTAGUARD__SERVER__LISTEN_ADDR", "0.0.0.0:7000"),
            ("QUOTAGUARD__RATE_LIMITING__JANITOR_INTERVAL_SECS", "5"),
            ("OTHER__SERVER__USER_HEADER", "x-ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = QuotaguardConfig::environment().source(Some(vars));

        let config = QuotaguardConfig::load_with_env(Some(path.as_path()), env).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.listen_addr, "0.0.0.0:7000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.janitor_interval(), Duration::from_secs(5));
        assert_eq!(config.server.user_header, "x-user-id");
    }

    #[test]
    fn test_from_file_rejects_zero_interval() {
        let path = write_temp("rate_limiting:\n  janitor_interval_secs: 0\n");
        let result = QuotaguardConfig::from_file(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(QuotaguardError::Config(_))));
    }

    #[test]
    fn test_policy_table_from_configured_path() {
        let path = write_temp("policies:\n  business:\n    window_secs: 30\n    max_requests: 2\n");

        let mut config = QuotaguardConfig::default();
        config.rate_limiting.policies_path = Some(path.to_string_lossy().into_owned());
        let table = config.policy_table().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.get(Category::Business).max_requests, 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("quotaguard-does-not-exist.yaml");
        assert!(QuotaguardConfig::load(Some(missing.as_path())).is_err());
    }
}
