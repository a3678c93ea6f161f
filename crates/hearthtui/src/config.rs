//! Configuration file parsing and credential resolution.
//!
//! Configuration is an optional TOML file. Every table and field has a
//! default, so an empty (or absent) file is a valid configuration. The hub
//! credentials are resolved separately, see [`Config::resolve_credentials`].

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use strum::Display;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::hub::DEFAULT_TIMEOUT;
use crate::sync::DEFAULT_REFRESH_INTERVAL;
use crate::sync::DEFAULT_SETTLE_DELAY;

/// Environment variable holding the hub base URL
pub const SERVER_ENV: &str = "HASS_SERVER";

/// Environment variable holding the long-lived access token
pub const TOKEN_ENV: &str = "HASS_TOKEN";

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hub: HubConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

#[derive(
    Debug,
    Default,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Connection to the hub
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// Base URL, e.g. "http://homeassistant.local:8123"
    pub server: Option<String>,

    /// Long-lived access token
    pub token: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            server: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshConfig {
    /// Seconds between automatic refreshes
    pub interval_secs: u64,

    /// Milliseconds to wait after a toggle before refreshing
    pub settle_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            settle_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,

    /// Per-target levels, e.g. `"hearthtui::sync" = "debug"`
    pub overrides: HashMap<String, LogLevel>,

    /// Log file; the terminal belongs to the UI so logs never go to stdout
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Build the subscriber filter, with `level` replacing the configured base level
    pub fn filter(&self, level: Option<LogLevel>) -> Result<EnvFilter, ConfigError> {
        let mut directives = vec![level.unwrap_or(self.level).to_string()];

        let mut overrides: Vec<_> = self.overrides.iter().collect();
        overrides.sort();
        directives.extend(
            overrides
                .into_iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );

        let directives = directives.join(",");
        EnvFilter::try_new(&directives).map_err(|e| ConfigError::LogFilter(directives, e))
    }

    /// Configured log file, or `hearthtui.log` in the temp directory
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("hearthtui.log"))
    }
}

/// Resolved hub credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub server: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server", &self.server)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.hub.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "hub.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve server and token.
    ///
    /// Explicit values win, then the `HASS_SERVER` / `HASS_TOKEN` environment
    /// variables, then the `[hub]` table. Empty strings count as unset.
    pub fn resolve_credentials(
        &self,
        server: Option<String>,
        token: Option<String>,
    ) -> Result<Credentials, ConfigError> {
        self.resolve_credentials_with(server, token, |key| std::env::var(key).ok())
    }

    /// [`Self::resolve_credentials`] with an injectable environment lookup
    pub fn resolve_credentials_with(
        &self,
        server: Option<String>,
        token: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, ConfigError> {
        let pick = |explicit: Option<String>, key: &str, file: &Option<String>| {
            explicit
                .filter(|v| !v.is_empty())
                .or_else(|| env(key).filter(|v| !v.is_empty()))
                .or_else(|| file.clone().filter(|v| !v.is_empty()))
        };

        match (
            pick(server, SERVER_ENV, &self.hub.server),
            pick(token, TOKEN_ENV, &self.hub.token),
        ) {
            (Some(server), Some(token)) => Ok(Credentials { server, token }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.refresh.settle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.hub.timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Set HASS_SERVER and HASS_TOKEN environment variables (or pass --server and --token)")]
    MissingCredentials,

    #[error("Invalid log filter '{0}': {1}")]
    LogFilter(String, #[source] tracing_subscriber::filter::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.refresh.settle_ms, 500);
        assert_eq!(config.hub.timeout_secs, 10);
        assert!(config.hub.server.is_none());
    }

    #[test]
    fn test_defaults_match_runtime_constants() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.settle_delay(), DEFAULT_SETTLE_DELAY);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [hub]
            server = "http://homeassistant.local:8123"
            token = "secret"
            timeout_secs = 5

            [refresh]
            interval_secs = 15
            settle_ms = 250

            [logging]
            level = "debug"
            file = "/tmp/hearthtui-test.log"

            [logging.overrides]
            "hearthtui::hub" = "trace"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.hub.server.as_deref(),
            Some("http://homeassistant.local:8123")
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.overrides.get("hearthtui::hub"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(
            config.logging.file_path(),
            PathBuf::from("/tmp/hearthtui-test.log")
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = toml::from_str("[hub]\nsrever = \"typo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config: Config = toml::from_str("[refresh]\ninterval_secs = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_explicit_credentials_win() {
        let config: Config =
            toml::from_str("[hub]\nserver = \"http://file:8123\"\ntoken = \"file\"\n").unwrap();
        let env = |key: &str| match key {
            SERVER_ENV => Some("http://env:8123".to_string()),
            TOKEN_ENV => Some("env-token".to_string()),
            _ => None,
        };

        let creds = config
            .resolve_credentials_with(
                Some("http://localhost:8123".to_string()),
                Some("test-token".to_string()),
                env,
            )
            .unwrap();
        assert_eq!(creds.server, "http://localhost:8123");
        assert_eq!(creds.token, "test-token");
    }

    #[test]
    fn test_env_credentials_beat_file() {
        let config: Config =
            toml::from_str("[hub]\nserver = \"http://file:8123\"\ntoken = \"file\"\n").unwrap();
        let env = |key: &str| match key {
            SERVER_ENV => Some("http://envserver:8123".to_string()),
            TOKEN_ENV => Some("env-token".to_string()),
            _ => None,
        };

        let creds = config.resolve_credentials_with(None, None, env).unwrap();
        assert_eq!(creds.server, "http://envserver:8123");
        assert_eq!(creds.token, "env-token");
    }

    #[test]
    fn test_file_credentials_as_fallback() {
        let config: Config =
            toml::from_str("[hub]\nserver = \"http://file:8123\"\ntoken = \"file\"\n").unwrap();
        let creds = config
            .resolve_credentials_with(Some(String::new()), None, no_env)
            .unwrap();
        assert_eq!(creds.server, "http://file:8123");
        assert_eq!(creds.token, "file");
    }

    #[test]
    fn test_missing_credentials() {
        let config = Config::default();
        let err = config
            .resolve_credentials_with(Some("http://h:8123".to_string()), None, no_env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
        assert!(err.to_string().contains("HASS_TOKEN"));
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials {
            server: "http://h:8123".to_string(),
            token: "hunter2".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("http://h:8123"));
    }

    #[test]
    fn test_log_filter_directives() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            level = "warn"

            [logging.overrides]
            "hearthtui::sync" = "debug"
            "#,
        )
        .unwrap();

        let filter = config.logging.filter(None).unwrap().to_string();
        assert!(filter.contains("hearthtui::sync=debug"));
        assert!(filter.contains("warn"));

        let filter = config.logging.filter(Some(LogLevel::Trace)).unwrap();
        assert!(filter.to_string().contains("trace"));
    }
}
