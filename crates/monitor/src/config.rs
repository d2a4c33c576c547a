//! Monitor configuration
//!
//! Compiled defaults (every section is `#[serde(default)]`), overlaid by
//! an optional `chiller-monitor.toml` in the working directory, overlaid by
//! `CHILLER__SECTION__KEY` environment variables.

use modbus_rtu::SerialSettings;
use notifier::WebhookConfig;
use poller::PollerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use udp_listener::ListenerConfig;

/// Config file looked up in the working directory (any supported extension)
pub const CONFIG_FILE_STEM: &str = "chiller-monitor";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CHILLER";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serial bus section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port device path
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// Simulate stations instead of opening the port
    pub mock: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let bus = SerialSettings::default();
        Self {
            port: bus.port,
            baud_rate: bus.baud_rate,
            timeout_ms: bus.timeout_ms,
            mock: false,
        }
    }
}

impl SerialConfig {
    pub fn settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Polling front-end section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub enabled: bool,
    pub stations: Vec<u8>,
    pub interval_secs: u64,
    pub unreachable_after: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        let poller = PollerConfig::default();
        Self {
            enabled: true,
            stations: poller.stations,
            interval_secs: poller.interval_secs,
            unreachable_after: poller.unreachable_after,
        }
    }
}

impl PollConfig {
    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            stations: self.stations.clone(),
            interval_secs: self.interval_secs,
            unreachable_after: self.unreachable_after,
        }
    }
}

/// Push front-end section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub enabled: bool,
    pub bind_addr: String,
    pub buffer_size: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        let listener = ListenerConfig::default();
        Self {
            enabled: true,
            bind_addr: listener.bind_addr,
            buffer_size: listener.buffer_size,
        }
    }
}

impl PushConfig {
    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            bind_addr: self.bind_addr.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub serial: SerialConfig,
    pub poll: PollConfig,
    pub push: PushConfig,
    pub webhook: WebhookConfig,
    /// JSON dictionary of error code descriptions
    pub error_codes_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            poll: PollConfig::default(),
            push: PushConfig::default(),
            webhook: WebhookConfig::default(),
            error_codes_path: "error_codes.json".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load from the working directory and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(Self::environment(ENV_PREFIX));
        Self::finish(builder)
    }

    /// Load from an explicit file, with environment overrides under `env_prefix`
    pub fn load_from(path: &Path, env_prefix: &str) -> Result<Self, ConfigError> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(Self::environment(env_prefix));
        Self::finish(builder)
    }

    fn environment(prefix: &str) -> ::config::Environment {
        ::config::Environment::with_prefix(prefix)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("poll.stations")
            .try_parsing(true)
    }

    fn finish(builder: ::config::ConfigBuilder<::config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let config: MonitorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the monitor cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook.url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "webhook.url must be set (CHILLER__WEBHOOK__URL)".to_string(),
            ));
        }
        if !self.poll.enabled && !self.push.enabled {
            return Err(ConfigError::Invalid(
                "at least one of poll.enabled and push.enabled must be true".to_string(),
            ));
        }
        if self.poll.enabled {
            if self.poll.stations.is_empty() {
                return Err(ConfigError::Invalid("poll.stations is empty".to_string()));
            }
            if self.poll.interval_secs == 0 {
                return Err(ConfigError::Invalid("poll.interval_secs must be positive".to_string()));
            }
        }
        if self.webhook.timeout_secs == 0 {
            return Err(ConfigError::Invalid("webhook.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}
