// ABOUTME: Download path: ticket in, first decoded batch out
// ABOUTME: Splits not-found, empty stream, and decode failures into distinct errors

use arrow_array::RecordBatch;
use arrow_flight::decode::FlightRecordBatchStream;
use arrow_flight::error::FlightError;
use batchway_grpc::{GrpcClientError, StreamReceiver};
use batchway_proto::client::FlightServiceClient;
use batchway_proto::BatchId;
use futures::{StreamExt, TryStreamExt};
use tonic::transport::Channel;
use tonic::Code;
use tracing::debug;

use crate::connection::Connection;
use crate::context::CallContext;
use crate::error::{ClientError, Operation, Phase};

impl Connection {
    /// Fetch the batch stored under `id`.
    ///
    /// Only the first batch on the stream is decoded; anything after it is
    /// left unread. The returned batch owns its buffers and stays valid after
    /// the decoder is gone.
    ///
    /// # Errors
    /// - `NotFound` when the service reports no such batch
    /// - `EmptyResult` when the stream ends cleanly without a batch
    /// - `Protocol` with `Phase::Decode` for transport or decode failures mid-stream
    /// - `StreamOpen`, `Closed`, `Timeout`, or `Cancelled`
    pub async fn get(&self, ctx: &CallContext, id: &BatchId) -> Result<RecordBatch, ClientError> {
        let client = self.service().await?;
        let batch = self
            .run_call(Operation::Get, ctx, download(client, id))
            .await?;

        debug!(batch_id = %id, rows = batch.num_rows(), "batch downloaded");
        Ok(batch)
    }
}

async fn download(
    mut client: FlightServiceClient<Channel>,
    id: &BatchId,
) -> Result<RecordBatch, ClientError> {
    let response = client
        .do_get(id.to_ticket())
        .await
        .map_err(|status| match status.code() {
            Code::NotFound => ClientError::NotFound { id: id.clone() },
            _ => ClientError::StreamOpen {
                op: Operation::Get,
                status,
            },
        })?;

    let frames = StreamReceiver::new(response.into_inner()).map_err(into_flight_error);
    let mut decoder = FlightRecordBatchStream::new_from_flight_data(frames);
    let first = decoder.next().await;

    // A yielded batch holds its own references to every column buffer, so
    // tearing the decoder down here releases only the decoder's share.
    drop(decoder);

    match first {
        Some(Ok(batch)) => Ok(batch),
        Some(Err(FlightError::Tonic(status))) if status.code() == Code::NotFound => {
            Err(ClientError::NotFound { id: id.clone() })
        }
        Some(Err(e)) => Err(ClientError::protocol(Operation::Get, Phase::Decode, e)),
        None => Err(ClientError::EmptyResult { id: id.clone() }),
    }
}

fn into_flight_error(err: GrpcClientError) -> FlightError {
    match err {
        GrpcClientError::StreamError(status) => FlightError::from(status),
        other => FlightError::ExternalError(Box::new(other)),
    }
}
