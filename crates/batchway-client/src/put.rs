// ABOUTME: Upload path: descriptor frame, schema and data frames, half-close, one ack
// ABOUTME: The request body is written concurrently with opening the DoPut stream

use arrow_array::RecordBatch;
use arrow_flight::utils::batches_to_flight_data;
use batchway_grpc::{OutboundStream, StreamReceiver, StreamSender};
use batchway_proto::client::FlightServiceClient;
use batchway_proto::{put_descriptor_frame, BatchId, FlightData};
use tonic::transport::Channel;
use tracing::{debug, warn};

use crate::config::BufferConfig;
use crate::connection::Connection;
use crate::context::CallContext;
use crate::error::{ClientError, Operation, Phase};

impl Connection {
    /// Upload `batch` and return the identifier the service assigned to it.
    ///
    /// The batch is shared with the encoder, never modified; the caller keeps
    /// its own handle. Completion is signalled only by closing the write side
    /// of the stream, after which exactly one acknowledgement is awaited.
    ///
    /// # Errors
    /// `Closed`, `StreamOpen`, `Protocol` tagged with the failing phase,
    /// `Timeout`, or `Cancelled`. Nothing is retried.
    pub async fn put(&self, ctx: &CallContext, batch: &RecordBatch) -> Result<BatchId, ClientError> {
        let client = self.service().await?;
        let id = self
            .run_call(
                Operation::Put,
                ctx,
                upload(client, &self.config().buffers, batch.clone()),
            )
            .await?;

        debug!(
            batch_id = %id,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "batch uploaded"
        );
        Ok(id)
    }
}

async fn upload(
    mut client: FlightServiceClient<Channel>,
    buffers: &BufferConfig,
    batch: RecordBatch,
) -> Result<BatchId, ClientError> {
    let OutboundStream { sender, stream } = OutboundStream::new(buffers.channel_buffer);

    // The service may not answer until it has read the whole upload, so the
    // frames have to flow while the call is still opening.
    let (opened, written) = tokio::join!(
        client.do_put(stream),
        write_frames(sender, batch),
    );

    let response = opened.map_err(|status| {
        warn!(code = ?status.code(), message = %status.message(), "upload rejected");
        ClientError::StreamOpen {
            op: Operation::Put,
            status,
        }
    })?;
    written?;

    let mut acks = StreamReceiver::new(response.into_inner());
    match acks.recv().await {
        Ok(Some(ack)) => {
            let id = BatchId::from_put_result(&ack);
            if id.is_empty() {
                return Err(ClientError::protocol(
                    Operation::Put,
                    Phase::Ack,
                    "acknowledgement carried no identifier",
                ));
            }
            Ok(id)
        }
        Ok(None) => Err(ClientError::protocol(
            Operation::Put,
            Phase::Ack,
            "stream ended without an acknowledgement",
        )),
        Err(e) => Err(ClientError::protocol(Operation::Put, Phase::Ack, e)),
    }
}

async fn write_frames(
    sender: StreamSender<FlightData>,
    batch: RecordBatch,
) -> Result<(), ClientError> {
    sender
        .send(put_descriptor_frame())
        .await
        .map_err(|e| ClientError::protocol(Operation::Put, Phase::Descriptor, e))?;

    // One record message per upload, even for zero rows: the service stores
    // each record message it reads as its own batch.
    let schema = batch.schema();
    let frames = batches_to_flight_data(&schema, vec![batch])
        .map_err(|e| ClientError::protocol(Operation::Put, Phase::Encode, e))?;

    for frame in frames {
        sender
            .send(frame)
            .await
            .map_err(|e| ClientError::protocol(Operation::Put, Phase::Write, e))?;
    }

    sender
        .close()
        .map_err(|e| ClientError::protocol(Operation::Put, Phase::WriterClose, e))
}
