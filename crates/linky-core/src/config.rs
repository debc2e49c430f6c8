//! Start-up configuration: log verbosity, worker pool sizing and the
//! consumer list. Read once, never reloaded.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;
/// File name looked up in the default locations.
pub const CONFIG_FILE_NAME: &str = "linky.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid log level '{level}' (expected error, warn, info, debug or trace)")]
    InvalidLogLevel { level: String },
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("queue_capacity must be at least 1")]
    NoQueueCapacity,
}

/// Process configuration.
///
/// # Examples
/// ```
/// use linky_core::Config;
///
/// let config = Config::from_toml_str(
///     r#"
///     log_level = "debug"
///     [[consumers]]
///     kind = "jsonl"
///     labels = ["PAPP"]
///     "#,
/// )?;
/// assert_eq!(config.workers, linky_core::DEFAULT_WORKERS);
/// assert_eq!(config.consumers[0].kind, "jsonl");
/// # Ok::<(), linky_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Verbosity: `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    /// Decode and dispatch worker threads.
    pub workers: usize,
    /// Frames allowed to wait for a worker before new ones are rejected.
    pub queue_capacity: usize,
    /// Consumers in dispatch order.
    pub consumers: Vec<ConsumerSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            consumers: vec![ConsumerSpec::new("log")],
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level()?;
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        Ok(())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel {
                level: self.log_level.clone(),
            })
    }

    /// Locations searched when no path is given, most specific first:
    /// `$XDG_CONFIG_HOME/linky.toml` (else `~/.config/linky.toml`),
    /// `/etc/linky/linky.toml`, `/usr/local/etc/linky/linky.toml`.
    pub fn default_locations() -> Vec<PathBuf> {
        locations_for(env::var_os("XDG_CONFIG_HOME"), env::var_os("HOME"))
    }

    /// First regular file among `locations`.
    pub fn find_in(locations: &[PathBuf]) -> Option<PathBuf> {
        locations.iter().find(|path| path.is_file()).cloned()
    }
}

fn locations_for(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Vec<PathBuf> {
    let user_dir = xdg_config_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            home.filter(|dir| !dir.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        });
    user_dir
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .into_iter()
        .chain([
            Path::new("/etc/linky").join(CONFIG_FILE_NAME),
            Path::new("/usr/local/etc/linky").join(CONFIG_FILE_NAME),
        ])
        .collect()
}

/// One configured consumer: a kind tag plus kind-specific options.
///
/// Options stay untyped until the kind's factory reads them, so a bad option
/// only affects that consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerSpec {
    pub kind: String,
    /// Identifier used in logs; defaults to the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub options: toml::Table,
}

impl ConsumerSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            options: toml::Table::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn identifier(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.kind)
    }

    /// Deserialize the kind-specific options.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, toml::de::Error> {
        toml::Value::Table(self.options.clone()).try_into()
    }
}
