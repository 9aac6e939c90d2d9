// ABOUTME: Client configuration: endpoint, deadlines, keep-alive, and buffer limits.
// ABOUTME: Loads from TOML with per-field defaults; durations are given in milliseconds.

use std::path::Path;
use std::time::Duration;

use batchway_grpc::{ChannelConfig, DEFAULT_ADDRESS, DEFAULT_CHANNEL_BUFFER};
use serde::{Deserialize, Deserializer};

use crate::error::ClientError;

/// How long dialing may take before the connection attempt fails.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on every put, get, and list call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(
        rename = "dial_timeout_ms",
        default = "default_dial_timeout",
        deserialize_with = "millis"
    )]
    pub dial_timeout: Duration,
    #[serde(
        rename = "call_timeout_ms",
        default = "default_call_timeout",
        deserialize_with = "millis"
    )]
    pub call_timeout: Duration,
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
    #[serde(default)]
    pub buffers: BufferConfig,
}

/// Buffer limits applied uniformly to every stream on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Largest single message the decode path accepts.
    pub max_decoding_message_size: usize,
    /// Largest single message the encode path emits. A batch is always sent
    /// as one record message, so this caps the size of an uploadable batch.
    pub max_encoding_message_size: usize,
    /// Frames queued between the encoder and the transport.
    pub channel_buffer: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_decoding_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_encoding_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_dial_timeout() -> Duration {
    DEFAULT_DIAL_TIMEOUT
}

fn default_call_timeout() -> Duration {
    DEFAULT_CALL_TIMEOUT
}

fn default_keep_alive() -> bool {
    true
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            keep_alive: default_keep_alive(),
            buffers: BufferConfig::default(),
        }
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_buffers(mut self, buffers: BufferConfig) -> Self {
        self.buffers = buffers;
        self
    }

    pub fn without_keep_alive(mut self) -> Self {
        self.keep_alive = false;
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ClientError> {
        let config: ClientConfig = toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Failed to read config from {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.address.trim().is_empty() {
            return Err(ClientError::Config("address is required".into()));
        }
        if self.dial_timeout.is_zero() {
            return Err(ClientError::Config("dial_timeout_ms must be positive".into()));
        }
        if self.call_timeout.is_zero() {
            return Err(ClientError::Config("call_timeout_ms must be positive".into()));
        }
        let buffers = &self.buffers;
        if buffers.max_decoding_message_size == 0
            || buffers.max_encoding_message_size == 0
            || buffers.channel_buffer == 0
        {
            return Err(ClientError::Config("buffer sizes must be positive".into()));
        }
        Ok(())
    }

    pub(crate) fn channel_config(&self) -> ChannelConfig {
        let config = ChannelConfig::new(&self.address).with_connect_timeout(self.dial_timeout);
        if self.keep_alive {
            config
        } else {
            config.without_keep_alive()
        }
    }
}
