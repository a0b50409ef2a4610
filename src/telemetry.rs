use crate::config::{is_known_level, LoggingConfig};
use crate::error::{PlanError, Result};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(PlanError::system(format!("Unknown log format '{}'", other))),
        }
    }
}

/// Build the env filter; RUST_LOG takes precedence over the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plansignal={}", config.level.to_lowercase())))
}

/// Install the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if !is_known_level(&config.level) {
        return Err(PlanError::system(format!(
            "Unknown log level '{}'",
            config.level
        )));
    }
    let format: LogFormat = config.format.parse()?;
    let verbose = matches!(config.level.to_lowercase().as_str(), "debug" | "trace");

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(verbose)
            .with_file(verbose)
            .with_line_number(verbose)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(config))
        .try_init()
        .map_err(|e| PlanError::system(format!("Failed to initialize logging: {}", e)))
}
