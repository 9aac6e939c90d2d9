// ABOUTME: Re-exports the Arrow Flight protocol types used by the batch-exchange service.
// ABOUTME: Adds the batch identifier newtype and helpers for put/get/list framing.

mod frames;
mod id;

pub use arrow_flight::flight_descriptor::DescriptorType;
pub use arrow_flight::{Criteria, FlightData, FlightDescriptor, FlightInfo, PutResult, Ticket};

pub use frames::{is_put_descriptor, put_descriptor, put_descriptor_frame, PUT_COMMAND};
pub use id::BatchId;

// Re-export the prost byte buffer so downstream crates agree on one type
pub use prost::bytes::Bytes;

// Re-export client types under a client module
pub mod client {
    pub use arrow_flight::flight_service_client::FlightServiceClient;
}

// Re-export server types under a server module
pub mod server {
    pub use arrow_flight::flight_service_server::{FlightService, FlightServiceServer};
}
