//! Logging configuration and initialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log format '{0}' (expected 'pretty' or 'json')")]
    UnknownFormat(String),

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    /// Use `level` even when `RUST_LOG` is set. Set by the CLI's
    /// `--log-level`; never read from config files.
    #[serde(skip)]
    pub override_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            override_env: false,
        }
    }
}

impl LoggingConfig {
    /// The filter directive to install, given the value of `RUST_LOG`.
    pub fn directive(&self, env: Option<&str>) -> String {
        match env.map(str::trim).filter(|e| !e.is_empty()) {
            Some(env) if !self.override_env => env.to_string(),
            _ => self.level.clone(),
        }
    }

    /// Install the global tracing subscriber. Logs go to stderr so stdout
    /// stays free for tables and exports.
    ///
    /// Fails if a subscriber is already installed.
    pub fn init(&self) -> Result<(), LoggingError> {
        let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let filter = EnvFilter::new(self.directive(env.as_deref()));
        let builder = subscriber_fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.try_init(),
        }
        .map_err(|e| LoggingError::Install(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::UnknownFormat(_))
        ));
    }

    #[test]
    fn rust_log_wins_unless_level_is_pinned() {
        let mut cfg = LoggingConfig {
            level: "debug".into(),
            ..LoggingConfig::default()
        };
        assert_eq!(cfg.directive(None), "debug");
        assert_eq!(cfg.directive(Some("  ")), "debug");
        assert_eq!(cfg.directive(Some("warn")), "warn");

        cfg.override_env = true;
        assert_eq!(cfg.directive(Some("warn")), "debug");
    }

    #[test]
    fn second_init_fails_instead_of_panicking() {
        let cfg = LoggingConfig::default();
        let _ = cfg.init();
        assert!(matches!(cfg.init(), Err(LoggingError::Install(_))));
    }
}
