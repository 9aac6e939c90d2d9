// ABOUTME: Enumeration path: empty criteria in, one identifier per listing record out
// ABOUTME: A listing cut short by an error reports what it collected alongside the cause

use batchway_grpc::StreamReceiver;
use batchway_proto::client::FlightServiceClient;
use batchway_proto::{BatchId, Criteria};
use tonic::transport::Channel;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::context::CallContext;
use crate::error::{ClientError, Operation, Phase};

impl Connection {
    /// List the identifiers of every batch the service holds.
    ///
    /// # Errors
    /// If the listing fails after some identifiers arrived, the error is
    /// `ClientError::Truncated`, carrying those identifiers and the cause
    /// (including a timeout or cancellation). Failures before the first
    /// identifier are returned as-is.
    pub async fn list(&self, ctx: &CallContext) -> Result<Vec<BatchId>, ClientError> {
        let client = self.service().await?;
        let mut collected = Vec::new();
        let result = self
            .run_call(Operation::List, ctx, enumerate(client, &mut collected))
            .await;

        match result {
            Ok(()) => {
                debug!(count = collected.len(), "batches listed");
                Ok(collected)
            }
            Err(e) if collected.is_empty() => Err(e),
            Err(e) => {
                warn!(count = collected.len(), error = %e, "listing truncated");
                Err(ClientError::Truncated {
                    collected,
                    source: Box::new(e),
                })
            }
        }
    }
}

async fn enumerate(
    mut client: FlightServiceClient<Channel>,
    collected: &mut Vec<BatchId>,
) -> Result<(), ClientError> {
    let response = client
        .list_flights(Criteria::default())
        .await
        .map_err(|status| ClientError::StreamOpen {
            op: Operation::List,
            status,
        })?;

    let mut records = StreamReceiver::new(response.into_inner());
    while let Some(info) = records
        .recv()
        .await
        .map_err(|e| ClientError::protocol(Operation::List, Phase::Decode, e))?
    {
        let id = BatchId::from_flight_info(&info).ok_or_else(|| {
            ClientError::protocol(
                Operation::List,
                Phase::Decode,
                "listing record has no descriptor",
            )
        })?;
        collected.push(id);
    }

    Ok(())
}
