// ABOUTME: Stream wrappers for client-streaming and server-streaming gRPC calls.
// ABOUTME: Provides typed sender/receiver halves and the outbound request stream pair.

use std::pin::Pin;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Streaming;

use crate::error::GrpcClientError;

/// Default buffer size for outbound message channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 100;

/// Write half of an outbound request stream.
///
/// Dropping the sender, or calling [`StreamSender::close`], ends the request
/// stream; that half-close is what tells the peer the upload is complete.
#[derive(Debug)]
pub struct StreamSender<T> {
    inner: mpsc::Sender<T>,
}

impl<T> StreamSender<T> {
    /// Create a stream sender from an mpsc sender.
    pub fn new(sender: mpsc::Sender<T>) -> Self {
        Self { inner: sender }
    }

    /// Send a message on the stream.
    pub async fn send(&self, msg: T) -> Result<(), GrpcClientError> {
        self.inner
            .send(msg)
            .await
            .map_err(|_| GrpcClientError::StreamClosed)
    }

    /// Close the write side of the stream.
    ///
    /// Fails when the transport already dropped the request stream, since the
    /// peer then cannot observe a clean end of input.
    pub fn close(self) -> Result<(), GrpcClientError> {
        if self.inner.is_closed() {
            return Err(GrpcClientError::StreamClosed);
        }
        drop(self.inner);
        Ok(())
    }
}

/// Receiver half of a server response stream.
///
/// Wraps a tonic Streaming with convenience methods.
pub struct StreamReceiver<T> {
    inner: Streaming<T>,
}

impl<T> StreamReceiver<T> {
    /// Create a stream receiver from a tonic Streaming.
    pub fn new(streaming: Streaming<T>) -> Self {
        Self { inner: streaming }
    }

    /// Receive the next message; `Ok(None)` is a clean end of stream.
    pub async fn recv(&mut self) -> Result<Option<T>, GrpcClientError> {
        self.inner
            .message()
            .await
            .map_err(GrpcClientError::StreamError)
    }
}

impl<T> Stream for StreamReceiver<T> {
    type Item = Result<T, GrpcClientError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|opt| opt.map(|res| res.map_err(GrpcClientError::StreamError)))
    }
}

/// A pair of sender and outbound stream for a client-streaming call.
///
/// The outbound stream should be passed to the gRPC client method,
/// while the sender is used to send messages.
pub struct OutboundStream<T> {
    /// Sender for pushing messages to the stream.
    pub sender: StreamSender<T>,
    /// The stream to pass to the gRPC method.
    pub stream: ReceiverStream<T>,
}

impl<T> OutboundStream<T> {
    /// Create an outbound stream pair with the specified buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer_size);
        Self {
            sender: StreamSender::new(tx),
            stream: ReceiverStream::new(rx),
        }
    }
}
