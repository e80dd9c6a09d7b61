//! Configuration types for the Tradewire SDK

use std::time::Duration;

use crate::error::{EngineError, Result};

/// Default engine endpoint
const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9900/engine";

/// Default per-request timeout (30 seconds)
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default connection handshake timeout (10 seconds)
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Default maximum automatic reconnect attempts
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay between reconnect attempts (2 seconds)
const DEFAULT_RECONNECT_DELAY_MS: u64 = 2_000;

/// SDK configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine endpoint URL (ws:// or wss://)
    pub endpoint: String,

    /// Deadline for one request/reply exchange
    pub request_timeout: Duration,

    /// Deadline for the connection handshake
    pub connect_timeout: Duration,

    /// Reconnect automatically after timeouts and network failures
    pub auto_reconnect: bool,

    /// Give up after this many consecutive failed reconnect attempts
    pub max_reconnect_attempts: u32,

    /// Delay between reconnect attempts
    pub reconnect_delay: Duration,

    /// Log full wire payloads at debug level
    pub verbose: bool,
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(EngineError::invalid_request("endpoint is required"));
        }
        if self.request_timeout.is_zero() {
            return Err(EngineError::invalid_request(
                "request_timeout must be non-zero",
            ));
        }
        Ok(())
    }

    /// Endpoint with the WebSocket scheme enforced.
    pub fn ws_endpoint(&self) -> String {
        normalize_endpoint(&self.endpoint)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            auto_reconnect: true,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            verbose: false,
        }
    }
}

/// Normalize an endpoint into a ws:// or wss:// URL.
fn normalize_endpoint(url: &str) -> String {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{url}")
    }
}

/// Configuration builder for ergonomic config creation
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    endpoint: Option<String>,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    auto_reconnect: Option<bool>,
    max_reconnect_attempts: Option<u32>,
    reconnect_delay: Option<Duration>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    /// Set the engine endpoint URL
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the connection handshake timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable/disable automatic reconnection
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = Some(enabled);
        self
    }

    /// Set the reconnect attempt ceiling
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Set the delay between reconnect attempts
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = Some(delay);
        self
    }

    /// Enable/disable wire payload logging
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = Some(enabled);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();
        let config = Config {
            endpoint: self.endpoint.unwrap_or(defaults.endpoint),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            auto_reconnect: self.auto_reconnect.unwrap_or(defaults.auto_reconnect),
            max_reconnect_attempts: self
                .max_reconnect_attempts
                .unwrap_or(defaults.max_reconnect_attempts),
            reconnect_delay: self.reconnect_delay.unwrap_or(defaults.reconnect_delay),
            verbose: self.verbose.unwrap_or(defaults.verbose),
        };

        config.validate()?;
        Ok(config)
    }
}
