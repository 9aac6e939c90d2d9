// ABOUTME: In-memory Flight batch service for integration tests.
// ABOUTME: Runs on an ephemeral port with switchable faults (stall, empty get, failing list, ...).

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arrow_array::types::Int32Type;
use arrow_array::{
    Array, ArrayRef, DictionaryArray, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow_flight::decode::FlightRecordBatchStream;
use arrow_flight::error::FlightError;
use arrow_flight::utils::batches_to_flight_data;
use arrow_flight::{
    Action, ActionType, Empty, HandshakeRequest, HandshakeResponse, PollInfo, SchemaResult,
};
use arrow_schema::{DataType, Field, Schema};
use batchway_client::{ClientConfig, Connection};
use batchway_proto::server::{FlightService, FlightServiceServer};
use batchway_proto::{
    is_put_descriptor, BatchId, Bytes, Criteria, FlightData, FlightDescriptor, FlightInfo,
    PutResult, Ticket,
};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tokio::sync::RwLock;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use uuid::Uuid;

/// Matches the client's default message limits.
const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Sentinel for "listing never fails".
const NO_LIST_FAILURE: usize = usize::MAX;

/// Fault switches, flipped by tests while the service is running.
pub struct Faults {
    /// Every call hangs without answering.
    pub stall: AtomicBool,
    /// Gets answer with a stream that carries no frames.
    pub empty_gets: AtomicBool,
    /// Gets answer with the schema frame only.
    pub schema_only_gets: AtomicBool,
    /// Gets answer with a frame that is not valid IPC.
    pub corrupt_gets: AtomicBool,
    /// Puts are refused once the descriptor has been read.
    pub reject_puts: AtomicBool,
    /// Puts store the batch but never acknowledge.
    pub skip_ack: AtomicBool,
    /// Listing ends with an error after this many records.
    pub fail_list_after: AtomicUsize,
    /// Listing ends with a record that has no descriptor.
    pub anonymous_list_record: AtomicBool,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            stall: AtomicBool::new(false),
            empty_gets: AtomicBool::new(false),
            schema_only_gets: AtomicBool::new(false),
            corrupt_gets: AtomicBool::new(false),
            reject_puts: AtomicBool::new(false),
            skip_ack: AtomicBool::new(false),
            fail_list_after: AtomicUsize::new(NO_LIST_FAILURE),
            anonymous_list_record: AtomicBool::new(false),
        }
    }
}

impl Faults {
    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    fn on(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }
}

/// Batch store shared between the running service and the test.
#[derive(Clone, Default)]
pub struct MemoryFlightService {
    batches: Arc<RwLock<Vec<(BatchId, Vec<RecordBatch>)>>>,
    pub faults: Arc<Faults>,
}

impl MemoryFlightService {
    pub async fn stored_ids(&self) -> Vec<BatchId> {
        self.batches
            .read()
            .await
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every record message the upload for `id` carried, in arrival order.
    pub async fn lookup(&self, id: &BatchId) -> Option<Vec<RecordBatch>> {
        self.batches
            .read()
            .await
            .iter()
            .find(|(stored, _)| stored == id)
            .map(|(_, batches)| batches.clone())
    }

    async fn stall_if_asked<T>(&self) -> Option<T> {
        if Faults::on(&self.faults.stall) {
            return std::future::pending().await;
        }
        None
    }
}

type BoxedStream<T> = BoxStream<'static, Result<T, Status>>;

#[tonic::async_trait]
impl FlightService for MemoryFlightService {
    type HandshakeStream = BoxedStream<HandshakeResponse>;
    type ListFlightsStream = BoxedStream<FlightInfo>;
    type DoGetStream = BoxedStream<FlightData>;
    type DoPutStream = BoxedStream<PutResult>;
    type DoExchangeStream = BoxedStream<FlightData>;
    type DoActionStream = BoxedStream<arrow_flight::Result>;
    type ListActionsStream = BoxedStream<ActionType>;

    async fn handshake(
        &self,
        _request: Request<Streaming<HandshakeRequest>>,
    ) -> Result<Response<Self::HandshakeStream>, Status> {
        Err(Status::unimplemented("handshake"))
    }

    async fn list_flights(
        &self,
        _request: Request<Criteria>,
    ) -> Result<Response<Self::ListFlightsStream>, Status> {
        if let Some(response) = self.stall_if_asked().await {
            return response;
        }

        let fail_after = self.faults.fail_list_after.load(Ordering::SeqCst);
        let mut records: Vec<Result<FlightInfo, Status>> = self
            .stored_ids()
            .await
            .into_iter()
            .take(fail_after)
            .map(|id| Ok(FlightInfo::new().with_descriptor(FlightDescriptor::new_cmd(id.into_bytes()))))
            .collect();

        if Faults::on(&self.faults.anonymous_list_record) {
            records.push(Ok(FlightInfo::new()));
        }
        if fail_after != NO_LIST_FAILURE {
            records.push(Err(Status::internal("listing interrupted")));
        }

        Ok(Response::new(stream::iter(records).boxed()))
    }

    async fn get_flight_info(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        Err(Status::unimplemented("get_flight_info"))
    }

    async fn poll_flight_info(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<PollInfo>, Status> {
        Err(Status::unimplemented("poll_flight_info"))
    }

    async fn get_schema(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<SchemaResult>, Status> {
        Err(Status::unimplemented("get_schema"))
    }

    async fn do_get(
        &self,
        request: Request<Ticket>,
    ) -> Result<Response<Self::DoGetStream>, Status> {
        if let Some(response) = self.stall_if_asked().await {
            return response;
        }

        if Faults::on(&self.faults.empty_gets) {
            return Ok(Response::new(stream::empty().boxed()));
        }
        if Faults::on(&self.faults.corrupt_gets) {
            let garbage = FlightData {
                data_header: Bytes::from_static(b"definitely not ipc"),
                ..Default::default()
            };
            return Ok(Response::new(stream::iter([Ok(garbage)]).boxed()));
        }

        let id = BatchId::new(request.into_inner().ticket);
        let batches = self
            .lookup(&id)
            .await
            .ok_or_else(|| Status::not_found(format!("no batch {}", id)))?;

        let schema = batches
            .first()
            .map(|batch| batch.schema())
            .ok_or_else(|| Status::internal("stored upload had no batches"))?;
        let payload = if Faults::on(&self.faults.schema_only_gets) {
            Vec::new()
        } else {
            batches
        };

        // Stored batches go back out exactly as they came in, one record
        // message each, so a get never sees a re-chunked batch.
        let frames = batches_to_flight_data(&schema, payload)
            .map_err(|e| Status::internal(e.to_string()))?;
        Ok(Response::new(stream::iter(frames.into_iter().map(Ok)).boxed()))
    }

    async fn do_put(
        &self,
        request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoPutStream>, Status> {
        if let Some(response) = self.stall_if_asked().await {
            return response;
        }

        let mut frames = request.into_inner();
        let first = frames
            .message()
            .await?
            .ok_or_else(|| Status::invalid_argument("empty upload"))?;
        match &first.flight_descriptor {
            Some(descriptor) if is_put_descriptor(descriptor) => {}
            _ => return Err(Status::invalid_argument("first frame must be the put descriptor")),
        }
        if !first.data_header.is_empty() || !first.data_body.is_empty() {
            return Err(Status::invalid_argument("descriptor frame carries batch data"));
        }
        if Faults::on(&self.faults.reject_puts) {
            return Err(Status::invalid_argument("uploads are disabled"));
        }

        // Reads until the client half-closes the stream
        let batches: Vec<RecordBatch> =
            FlightRecordBatchStream::new_from_flight_data(frames.map_err(FlightError::from))
                .try_collect()
                .await
                .map_err(|e| Status::invalid_argument(e.to_string()))?;
        if batches.is_empty() {
            return Err(Status::invalid_argument("upload carried no batches"));
        }

        let id = BatchId::from(Uuid::new_v4().to_string());
        self.batches.write().await.push((id.clone(), batches));

        if Faults::on(&self.faults.skip_ack) {
            return Ok(Response::new(stream::empty().boxed()));
        }
        let ack = PutResult {
            app_metadata: id.into_bytes(),
        };
        Ok(Response::new(stream::iter([Ok(ack)]).boxed()))
    }

    async fn do_exchange(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoExchangeStream>, Status> {
        Err(Status::unimplemented("do_exchange"))
    }

    async fn do_action(
        &self,
        _request: Request<Action>,
    ) -> Result<Response<Self::DoActionStream>, Status> {
        Err(Status::unimplemented("do_action"))
    }

    async fn list_actions(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::ListActionsStream>, Status> {
        Err(Status::unimplemented("list_actions"))
    }
}

/// A running service plus the address it listens on.
pub struct TestServer {
    pub service: MemoryFlightService,
    pub addr: SocketAddr,
}

impl TestServer {
    pub async fn start() -> Self {
        let service = MemoryFlightService::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Server::builder()
            .add_service(
                FlightServiceServer::new(service.clone())
                    .max_decoding_message_size(MAX_MESSAGE_SIZE)
                    .max_encoding_message_size(MAX_MESSAGE_SIZE),
            )
            .serve_with_incoming(TcpListenerStream::new(listener));
        tokio::spawn(async move {
            let _ = server.await;
        });

        Self { service, addr }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.addr.to_string()).with_dial_timeout(Duration::from_secs(2))
    }

    pub async fn connect(&self) -> Connection {
        Connection::connect(self.config()).await.unwrap()
    }

    pub async fn connect_with(&self, config: ClientConfig) -> Connection {
        Connection::connect(config).await.unwrap()
    }
}

/// A three-column batch whose contents depend on `seed`.
pub fn sample_batch(seed: i64, rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("score", DataType::Float64, true),
    ]));

    let ids: Vec<i64> = (0..rows as i64).map(|i| seed * 1_000 + i).collect();
    let names: Vec<String> = ids.iter().map(|id| format!("row-{id}")).collect();
    let scores: Vec<Option<f64>> = ids
        .iter()
        .map(|id| (id % 3 != 0).then(|| *id as f64 / 2.0))
        .collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids)),
        Arc::new(StringArray::from(names)),
        Arc::new(Float64Array::from(scores)),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

/// A batch with a dictionary-encoded column that repeats a few values.
pub fn dictionary_batch(rows: usize) -> RecordBatch {
    let cities = ["Oslo", "Lima", "Pune"];
    let keys: DictionaryArray<Int32Type> = (0..rows).map(|i| cities[i % cities.len()]).collect();
    let schema = Arc::new(Schema::new(vec![
        Field::new("row", DataType::Int64, false),
        Field::new("city", keys.data_type().clone(), false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(0..rows as i64)),
        Arc::new(keys),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}
