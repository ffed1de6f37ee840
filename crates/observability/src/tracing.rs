//! Subscriber installation.
//!
//! `RUST_LOG` always wins over the configured default filter. The output
//! format comes from `DEMANDIQ_LOG_FORMAT` (`json` or `pretty`) when
//! [`ObservabilityConfig::from_env`] is used.

use core::str::FromStr;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::SystemTime;

pub const FORMAT_ENV: &str = "DEMANDIQ_LOG_FORMAT";

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with timestamps.
    #[default]
    Json,
    /// Human-readable multi-field lines for local runs.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format `{other}` (expected json or pretty)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub with_target: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: "info".to_string(),
            with_target: false,
        }
    }
}

impl ObservabilityConfig {
    /// Defaults, with the format overridden by `DEMANDIQ_LOG_FORMAT` if it parses.
    pub fn from_env() -> Self {
        let format = std::env::var(FORMAT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        Self::default().with_format(format)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Initialize tracing from the environment.
pub fn init() {
    init_with(&ObservabilityConfig::from_env());
}

/// Install a global subscriber built from `config`.
///
/// Returns `false` if a subscriber was already installed (the call is then a no-op).
pub fn init_with(config: &ObservabilityConfig) -> bool {
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(config.filter())
            .json()
            .with_timer(SystemTime)
            .with_target(config.with_target)
            .try_init()
            .is_ok(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(config.filter())
            .with_target(config.with_target)
            .try_init()
            .is_ok(),
    };
    if installed {
        ::tracing::debug!(format = ?config.format, "tracing initialized");
    }
    installed
}

/// Subscriber for test binaries: readable output captured per test.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ObservabilityConfig::default()
            .with_format(LogFormat::Pretty)
            .with_default_filter("demandiq=debug")
            .with_target(true);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.default_filter, "demandiq=debug");
        assert!(config.with_target);
    }

    #[test]
    fn second_install_is_a_no_op() {
        init_for_tests();
        assert!(!init_with(&ObservabilityConfig::default()));
        init();
    }
}
