// ABOUTME: Opaque batch identifier assigned by the service on upload.
// ABOUTME: Converts to tickets and extracts from put acknowledgements and listing records.

use std::fmt;

use arrow_flight::{FlightInfo, PutResult, Ticket};
use prost::bytes::Bytes;

/// Server-assigned name of a stored batch.
///
/// The bytes are never interpreted by the client. `Display` renders them as
/// lossy UTF-8 for logs and messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(Bytes);

impl BatchId {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wrap the identifier verbatim as a retrieval ticket.
    pub fn to_ticket(&self) -> Ticket {
        Ticket {
            ticket: self.0.clone(),
        }
    }

    /// Identifier carried in a put acknowledgement's metadata.
    pub fn from_put_result(result: &PutResult) -> Self {
        Self(result.app_metadata.clone())
    }

    /// Identifier stamped in a listing record's descriptor command, if present.
    pub fn from_flight_info(info: &FlightInfo) -> Option<Self> {
        info.flight_descriptor
            .as_ref()
            .map(|descriptor| Self(descriptor.cmd.clone()))
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&'static str> for BatchId {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for BatchId {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<Vec<u8>> for BatchId {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<Bytes> for BatchId {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}
