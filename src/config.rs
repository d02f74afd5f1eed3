//! Scheduler configuration.
//!
//! [`SchedulerConfig`] holds the concrete values that drive a scheduling
//! session. It uses a fluent, move-based builder style: each method consumes
//! `self` and returns the updated configuration.
//!
//! ```ignore
//! use lockstep::{Scheduler, SchedulerConfig};
//!
//! let config = SchedulerConfig::new(2, 1)
//!     .thread_name_prefix("sim")
//!     .record_dispatches(true);
//! Scheduler::new().init_with(config)?;
//! ```
//!
//! # Defaults
//!
//! | Field | Default | Env override |
//! |-------|---------|--------------|
//! | `quantum` | 1 | `LOCKSTEP_QUANTUM` |
//! | `device_count` | 0 | `LOCKSTEP_DEVICE_COUNT` |
//! | `thread_name_prefix` | `"lockstep-thread"` | `LOCKSTEP_THREAD_NAME_PREFIX` |
//! | `thread_stack_size` | platform default | `LOCKSTEP_THREAD_STACK_SIZE` |
//! | `record_dispatches` | `false` | `LOCKSTEP_RECORD_DISPATCHES` |

use crate::error::Error;
use crate::types::MAX_DEVICES;
use std::collections::BTreeMap;

const ENV_PREFIX: &str = "LOCKSTEP_";
const DEFAULT_THREAD_NAME_PREFIX: &str = "lockstep-thread";

/// Configuration for a scheduling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Ticks a logical thread runs before it is eligible for round-robin
    /// rotation.
    pub quantum: u32,
    /// Number of distinct devices threads may block on.
    pub device_count: u32,
    /// Name prefix for backing OS threads (`{prefix}-{id}`).
    pub thread_name_prefix: String,
    /// Stack size for backing OS threads; `None` keeps the platform default.
    pub thread_stack_size: Option<usize>,
    /// Whether to keep a per-dispatch log for the session report.
    pub record_dispatches: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum: 1,
            device_count: 0,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            thread_stack_size: None,
            record_dispatches: false,
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with the given quantum and device count.
    #[must_use]
    pub fn new(quantum: u32, device_count: u32) -> Self {
        Self {
            quantum,
            device_count,
            ..Self::default()
        }
    }

    /// Sets the time quantum.
    #[must_use]
    pub const fn quantum(mut self, quantum: u32) -> Self {
        self.quantum = quantum;
        self
    }

    /// Sets the device count.
    #[must_use]
    pub const fn device_count(mut self, device_count: u32) -> Self {
        self.device_count = device_count;
        self
    }

    /// Sets the OS thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the OS thread stack size.
    #[must_use]
    pub const fn thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Enables or disables the dispatch log.
    #[must_use]
    pub const fn record_dispatches(mut self, enabled: bool) -> Self {
        self.record_dispatches = enabled;
        self
    }

    /// Checks the configuration against the scheduler bounds.
    pub fn validate(&self) -> Result<(), Error> {
        if self.quantum == 0 {
            return Err(Error::ZeroQuantum);
        }
        if self.device_count > MAX_DEVICES {
            return Err(Error::TooManyDevices {
                requested: self.device_count,
                max: MAX_DEVICES,
            });
        }
        Ok(())
    }

    /// Builds a configuration from defaults plus `LOCKSTEP_*` environment
    /// overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let overrides: BTreeMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        Self::default().with_overrides(&overrides)
    }

    /// Applies `LOCKSTEP_*` key/value overrides on top of this configuration.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        for (key, value) in overrides {
            apply_override(&mut self, key, value)?;
        }
        Ok(self)
    }
}

/// Errors raised while loading configuration overrides.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A `LOCKSTEP_*` key is not recognised.
    #[error("invalid override: {0}")]
    InvalidOverride(String),
}

fn apply_override(
    config: &mut SchedulerConfig,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    match key {
        "LOCKSTEP_QUANTUM" => config.quantum = parse_u32(value, key)?,
        "LOCKSTEP_DEVICE_COUNT" => config.device_count = parse_u32(value, key)?,
        "LOCKSTEP_THREAD_NAME_PREFIX" => config.thread_name_prefix = value.to_string(),
        "LOCKSTEP_THREAD_STACK_SIZE" => {
            config.thread_stack_size = Some(parse_usize(value, key)?);
        }
        "LOCKSTEP_RECORD_DISPATCHES" => config.record_dispatches = parse_bool(value, key)?,
        _ => return Err(ConfigError::InvalidOverride(key.to_string())),
    }
    Ok(())
}

fn parse_u32(value: &str, key: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::Parse(format!("invalid u32 for {key}: {value}")))
}

fn parse_usize(value: &str, key: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::Parse(format!("invalid usize for {key}: {value}")))
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse(format!("invalid bool for {key}: {value}"))),
    }
}
