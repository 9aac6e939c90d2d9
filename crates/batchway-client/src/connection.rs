// ABOUTME: Connection owning the shared channel to the batch-exchange service
// ABOUTME: Dials once, hands out per-call client handles, and bounds every call by its deadline

use std::future::Future;

use batchway_grpc::{create_channel, GrpcClientError};
use batchway_proto::client::FlightServiceClient;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tonic::transport::Channel;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::error::{ClientError, Operation};

/// A live channel to one batch-exchange endpoint.
///
/// The connection is shared by reference across concurrent calls; each
/// put/get/list opens its own stream, so calls never contend on stream
/// state. Wrap it in an `Arc` to share it between tasks.
///
/// Close it exactly once with [`Connection::close`]. Calls started after
/// close fail with [`ClientError::Closed`]; calls already in flight finish on
/// the handle they hold, and the channel is released when the last of them
/// completes.
pub struct Connection {
    address: String,
    config: ClientConfig,
    client: RwLock<Option<FlightServiceClient<Channel>>>,
}

impl Connection {
    /// Dial the configured endpoint, waiting at most `dial_timeout`.
    ///
    /// # Errors
    /// Returns `ClientError::Config` for an invalid configuration,
    /// `ClientError::InvalidAddress` for an unusable endpoint, and
    /// `ClientError::Connect` when the service cannot be reached in time.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let channel_config = config.channel_config();

        let channel = create_channel(&channel_config)
            .await
            .map_err(|e| match e {
                GrpcClientError::InvalidAddress(reason) => ClientError::InvalidAddress(reason),
                other => ClientError::Connect {
                    address: channel_config.address.clone(),
                    reason: other.to_string(),
                },
            })?;

        let client = FlightServiceClient::new(channel)
            .max_decoding_message_size(config.buffers.max_decoding_message_size)
            .max_encoding_message_size(config.buffers.max_encoding_message_size);

        info!(address = %channel_config.address, "connected to batch service");

        Ok(Self {
            address: channel_config.address,
            config,
            client: RwLock::new(Some(client)),
        })
    }

    /// Normalized endpoint this connection dialed.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Release the channel.
    ///
    /// Closing twice is a caller error and returns `ClientError::Closed`.
    pub async fn close(&self) -> Result<(), ClientError> {
        match self.client.write().await.take() {
            Some(_) => {
                info!(address = %self.address, "connection closed");
                Ok(())
            }
            None => Err(ClientError::Closed),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.client.read().await.is_none()
    }

    /// A client handle for one call; cloning shares the underlying channel.
    pub(crate) async fn service(&self) -> Result<FlightServiceClient<Channel>, ClientError> {
        self.client.read().await.clone().ok_or(ClientError::Closed)
    }

    /// Drive `call` until it finishes, the deadline passes, or the caller cancels.
    ///
    /// Expiry and cancellation drop `call`, which resets only its own stream.
    pub(crate) async fn run_call<T, F>(
        &self,
        op: Operation,
        ctx: &CallContext,
        call: F,
    ) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let started = Instant::now();
        let deadline = ctx.bounded_deadline(started, self.config.call_timeout);

        let result = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => Err(ClientError::Cancelled { op }),
            outcome = tokio::time::timeout_at(deadline, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout {
                    op,
                    after: deadline.saturating_duration_since(started),
                }),
            },
        };

        match &result {
            Ok(_) => debug!(
                op = %op,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "call completed"
            ),
            Err(e) => debug!(op = %op, error = %e, "call failed"),
        }

        result
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
