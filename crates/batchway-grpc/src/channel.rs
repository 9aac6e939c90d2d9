// ABOUTME: Plaintext gRPC channel creation with keep-alive and a bounded dial.
// ABOUTME: Normalizes bare host:port addresses and waits for the channel to be ready.

use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

use crate::error::GrpcClientError;

/// Endpoint used when no address is configured.
pub const DEFAULT_ADDRESS: &str = "localhost:8080";

/// Configuration for gRPC channel keep-alive behavior.
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Interval between keep-alive pings when the connection is idle.
    pub interval: Duration,
    /// Timeout waiting for keep-alive response before considering connection dead.
    pub timeout: Duration,
    /// Whether to send keep-alive pings even when no streams are active.
    pub while_idle: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(20),
            while_idle: true,
        }
    }
}

/// Configuration for creating a gRPC channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Server address to connect to (e.g., "http://localhost:8080").
    pub address: String,
    /// Keep-alive configuration. If None, keep-alive is disabled.
    pub keep_alive: Option<KeepAliveConfig>,
    /// Upper bound on the whole dial, TCP connect through HTTP/2 handshake.
    pub connect_timeout: Option<Duration>,
}

impl ChannelConfig {
    /// Create a channel config with default settings.
    /// A bare `host:port` gets an `http://` scheme.
    pub fn new(address: impl Into<String>) -> Self {
        let addr = address.into().trim().to_string();
        Self {
            address: Self::normalize_scheme(&addr),
            keep_alive: Some(KeepAliveConfig::default()),
            connect_timeout: Some(Duration::from_secs(5)),
        }
    }

    fn normalize_scheme(addr: &str) -> String {
        if addr.is_empty() || addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        }
    }

    /// Disable keep-alive.
    pub fn without_keep_alive(mut self) -> Self {
        self.keep_alive = None;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

/// Create a gRPC channel with the specified configuration.
///
/// The channel is dialed eagerly: this returns only once the connection is
/// established, or fails with [`GrpcClientError::ConnectTimeout`] when
/// `connect_timeout` elapses first. Only plaintext `http://` endpoints are
/// accepted.
pub async fn create_channel(config: &ChannelConfig) -> Result<Channel, GrpcClientError> {
    if config.address.to_lowercase().starts_with("https://") {
        return Err(GrpcClientError::InvalidAddress(format!(
            "{} requests TLS, which is not supported",
            config.address
        )));
    }

    let mut endpoint = Endpoint::from_shared(config.address.clone())
        .map_err(|e| GrpcClientError::InvalidAddress(e.to_string()))?;

    // Apply keep-alive settings if configured
    if let Some(ka) = &config.keep_alive {
        endpoint = endpoint
            .http2_keep_alive_interval(ka.interval)
            .keep_alive_timeout(ka.timeout)
            .keep_alive_while_idle(ka.while_idle);
    }

    let channel = match config.connect_timeout {
        Some(timeout) => {
            endpoint = endpoint.connect_timeout(timeout);
            tokio::time::timeout(timeout, endpoint.connect())
                .await
                .map_err(|_| GrpcClientError::ConnectTimeout(timeout))?
        }
        None => endpoint.connect().await,
    }
    .map_err(|e| GrpcClientError::ConnectionFailed(e.to_string()))?;

    tracing::debug!(
        address = %config.address,
        keep_alive = config.keep_alive.is_some(),
        "gRPC channel connected"
    );

    Ok(channel)
}
