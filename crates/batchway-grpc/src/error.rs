// ABOUTME: Error types for the batchway-grpc crate.
// ABOUTME: Structured errors for channel dialing and stream operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the gRPC transport layer.
#[derive(Error, Debug)]
pub enum GrpcClientError {
    /// Invalid server address format.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// Failed to connect to the server.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The channel was not ready before the dial timeout.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The other half of a stream was dropped.
    #[error("stream closed unexpectedly")]
    StreamClosed,

    /// The peer or transport ended a stream with a status.
    #[error("stream error: {0}")]
    StreamError(tonic::Status),
}

impl From<tonic::Status> for GrpcClientError {
    fn from(status: tonic::Status) -> Self {
        GrpcClientError::StreamError(status)
    }
}

impl From<tonic::transport::Error> for GrpcClientError {
    fn from(err: tonic::transport::Error) -> Self {
        GrpcClientError::ConnectionFailed(err.to_string())
    }
}
