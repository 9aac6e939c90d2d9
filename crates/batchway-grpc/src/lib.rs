// ABOUTME: Shared gRPC plumbing for the batchway client.
// ABOUTME: Provides channel dialing, outbound/inbound stream wrappers, and transport errors.

pub mod channel;
pub mod error;
pub mod stream;

// Channel creation
pub use channel::{create_channel, ChannelConfig, KeepAliveConfig, DEFAULT_ADDRESS};

// Error types
pub use error::GrpcClientError;

// Stream management
pub use stream::{OutboundStream, StreamReceiver, StreamSender, DEFAULT_CHANNEL_BUFFER};

// Re-export proto types for convenience
pub use batchway_proto;
