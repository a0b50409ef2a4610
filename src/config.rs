use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PlanSignalConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BoundaryConfig {
    /// Name attached to every log line emitted by the boundary
    #[serde(default = "default_boundary_name")]
    pub name: String,

    /// Log "services starting" at debug instead of info
    #[serde(default = "default_quiet_services_starting")]
    pub quiet_services_starting: bool,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

const ENV_PREFIX: &str = "PLANSIGNAL";
const ENV_SEPARATOR: &str = "__";

/// Whether `level` names a tracing level (case-insensitive)
pub fn is_known_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_lowercase().as_str())
}

impl PlanSignalConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from_file("plansignal.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        // PLANSIGNAL__LOGGING__LEVEL=debug etc.
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR),
        )
    }

    /// Load from `path`, reading overrides from `PLANSIGNAL__*` in `vars`
    /// instead of the process environment
    pub fn load_with_vars<P: AsRef<Path>>(
        path: P,
        vars: HashMap<String, String>,
    ) -> std::result::Result<Self, ConfigError> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .source(Some(vars.into_iter().collect())),
        )
    }

    fn load_with_env<P: AsRef<Path>>(
        path: P,
        env: Environment,
    ) -> std::result::Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("boundary.name", default_boundary_name())?
            .set_default(
                "boundary.quiet_services_starting",
                default_quiet_services_starting(),
            )?
            // Configuration file is optional
            .add_source(File::with_name(&path_str).required(false))
            .add_source(env)
            .build()?;

        let config: PlanSignalConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !is_known_level(&self.logging.level) {
            return Err(ConfigError::Message(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        if !LOG_FORMATS.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::Message(format!(
                "Unknown log format '{}'",
                self.logging.format
            )));
        }

        if self.boundary.name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Boundary name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            name: default_boundary_name(),
            quiet_services_starting: default_quiet_services_starting(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_boundary_name() -> String {
    "plan".to_string()
}
fn default_quiet_services_starting() -> bool {
    true
}
