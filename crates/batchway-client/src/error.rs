// ABOUTME: Error types for batchway-client
// ABOUTME: Tags every failure with the operation and, for framing errors, the phase

use std::fmt;
use std::time::Duration;

use batchway_proto::BatchId;
use thiserror::Error;

/// The client call an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Put,
    Get,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Put => "put",
            Operation::Get => "get",
            Operation::List => "list",
        })
    }
}

/// Point in a stream's lifecycle where framing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Sending the put descriptor frame.
    Descriptor,
    /// Encoding the batch into flight data frames.
    Encode,
    /// Writing schema or data frames.
    Write,
    /// Half-closing the upload stream.
    WriterClose,
    /// Receiving the put acknowledgement.
    Ack,
    /// Reading or decoding response frames.
    Decode,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Descriptor => "send descriptor",
            Phase::Encode => "encode batch",
            Phase::Write => "write batch",
            Phase::WriterClose => "close writer",
            Phase::Ack => "receive acknowledgement",
            Phase::Decode => "decode response",
        })
    }
}

/// Errors that can occur in batchway-client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("connection is closed")]
    Closed,

    #[error("{op}: failed to open stream: {status}")]
    StreamOpen { op: Operation, status: tonic::Status },

    #[error("{op}: failed to {phase}: {reason}")]
    Protocol {
        op: Operation,
        phase: Phase,
        reason: String,
    },

    #[error("{op}: deadline of {after:?} exceeded")]
    Timeout { op: Operation, after: Duration },

    #[error("{op}: cancelled")]
    Cancelled { op: Operation },

    #[error("batch {id} not found")]
    NotFound { id: BatchId },

    #[error("no batch received for {id}")]
    EmptyResult { id: BatchId },

    #[error("listing truncated after {} identifiers: {source}", .collected.len())]
    Truncated {
        collected: Vec<BatchId>,
        source: Box<ClientError>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn protocol(op: Operation, phase: Phase, reason: impl fmt::Display) -> Self {
        ClientError::Protocol {
            op,
            phase,
            reason: reason.to_string(),
        }
    }

    /// Whether the call ran out of time, directly or while listing.
    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            ClientError::Truncated { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Whether the caller's cancellation token ended the call.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ClientError::Cancelled { .. } => true,
            ClientError::Truncated { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Identifiers a listing collected before it failed.
    pub fn partial_results(&self) -> Option<&[BatchId]> {
        match self {
            ClientError::Truncated { collected, .. } => Some(collected),
            _ => None,
        }
    }
}
