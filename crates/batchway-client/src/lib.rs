// ABOUTME: Client for a columnar batch-exchange service spoken over Arrow Flight.
// ABOUTME: One shared Connection; each put/get/list opens and drains its own stream.

//! Upload Arrow record batches, fetch them back by identifier, and list the
//! identifiers a service holds.
//!
//! ```ignore
//! use batchway_client::{CallContext, ClientConfig, Connection};
//!
//! let conn = Connection::connect(ClientConfig::new("localhost:8080")).await?;
//! let ctx = CallContext::background();
//!
//! let id = conn.put(&ctx, &batch).await?;
//! let fetched = conn.get(&ctx, &id).await?;
//! let all = conn.list(&ctx).await?;
//!
//! conn.close().await?;
//! ```

mod config;
mod connection;
mod context;
mod error;
mod get;
mod list;
mod put;

pub use config::{BufferConfig, ClientConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_DIAL_TIMEOUT};
pub use connection::Connection;
pub use context::CallContext;
pub use error::{ClientError, Operation, Phase};

pub use arrow_array::RecordBatch;
pub use batchway_proto::BatchId;
pub use tokio_util::sync::CancellationToken;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
