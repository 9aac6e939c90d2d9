// ABOUTME: Frame helpers for the put stream preamble.
// ABOUTME: The put descriptor is a CMD descriptor whose command bytes are "put".

use arrow_flight::flight_descriptor::DescriptorType;
use arrow_flight::{FlightData, FlightDescriptor};

/// Command bytes that tag a DoPut stream as a batch upload.
pub const PUT_COMMAND: &[u8] = b"put";

/// Descriptor that marks a stream as a batch upload.
pub fn put_descriptor() -> FlightDescriptor {
    FlightDescriptor::new_cmd(PUT_COMMAND)
}

/// The first frame of every upload: the put descriptor and nothing else.
pub fn put_descriptor_frame() -> FlightData {
    FlightData {
        flight_descriptor: Some(put_descriptor()),
        ..Default::default()
    }
}

/// Whether `descriptor` is a CMD descriptor carrying the put command.
pub fn is_put_descriptor(descriptor: &FlightDescriptor) -> bool {
    descriptor.r#type == DescriptorType::Cmd as i32 && descriptor.cmd.as_ref() == PUT_COMMAND
}
