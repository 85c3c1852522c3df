//! Configuration types for the PLZ sync system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public OpenPLZ API endpoint
pub const DEFAULT_OPENPLZ_URL: &str = "https://openplzapi.org";

/// Upper bound for the debounce delay
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Main sync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Lookup service configuration
    #[serde(default)]
    pub lookup: LookupServiceConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.lookup.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Lookup service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupServiceConfig {
    /// OpenPLZ REST API
    OpenPlz {
        /// Base URL of the API (without the `/de/...` path)
        base_url: String,
        /// Transport timeout per request, in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom lookup service
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl LookupServiceConfig {
    /// Validate the lookup service configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            LookupServiceConfig::OpenPlz {
                base_url,
                timeout_secs,
            } => {
                if base_url.is_empty() {
                    return Err(crate::Error::config("OpenPLZ base URL cannot be empty"));
                }
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "OpenPLZ base URL must use HTTP or HTTPS scheme. Got: {}",
                        base_url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("OpenPLZ timeout must be > 0"));
                }
                Ok(())
            }
            LookupServiceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom lookup service factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom lookup service config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the lookup service type name
    pub fn type_name(&self) -> &str {
        match self {
            LookupServiceConfig::OpenPlz { .. } => "openplz",
            LookupServiceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for LookupServiceConfig {
    fn default() -> Self {
        LookupServiceConfig::OpenPlz {
            base_url: DEFAULT_OPENPLZ_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Quiet period after the last change before a field value counts as settled
    /// (in milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Capacity of the inbound UI command channel
    #[serde(default = "default_command_channel_capacity")]
    pub command_channel_capacity: usize,

    /// Capacity of the outbound engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Debounce delay as a [`Duration`]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Set the debounce delay
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(crate::Error::config(format!(
                "Debounce delay must be at most {} ms. Got: {}",
                MAX_DEBOUNCE_MS, self.debounce_ms
            )));
        }
        if self.command_channel_capacity == 0 {
            return Err(crate::Error::config("Command channel capacity must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            command_channel_capacity: default_command_channel_capacity(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_command_channel_capacity() -> usize {
    64
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}
