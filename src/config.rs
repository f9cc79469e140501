use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{IssueType, Priority, Severity};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub issue_defaults: IssueDefaults,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IssueDefaults {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub issue_type: IssueType,
}

impl Config {
    /// Reads the config file; a missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(raw)?;
        config.user = config
            .user
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty());
        if let Some(raw) = config.log_level.as_deref() {
            if raw.trim().parse::<log::LevelFilter>().is_err() {
                return Err(ConfigError::InvalidLogLevel(raw.to_string()));
            }
        }
        Ok(config)
    }

    pub fn log_filter(&self) -> Option<log::LevelFilter> {
        self.log_level
            .as_deref()
            .and_then(|raw| raw.trim().parse::<log::LevelFilter>().ok())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    InvalidLogLevel(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "unable to read config: {}", err),
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::InvalidLogLevel(raw) => write!(
                f,
                "invalid config log_level '{}'; expected off, error, warn, info, debug, or trace",
                raw
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Toml(err) => Some(err),
            ConfigError::InvalidLogLevel(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}
