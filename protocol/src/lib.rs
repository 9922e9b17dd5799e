use thiserror::Error;

pub mod framer;
pub mod record;
pub mod tags;

pub use framer::Framer;
pub use record::{Record, RecordWriter};

/// Version string sent in the `find` handshake. Peers and the relay
/// server refuse to match clients below their own minimum.
pub const PROTOCOL_VERSION: &str = "1.11";

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Expected {expected}, got end of record")]
    EndOfRecord { expected: &'static str },

    #[error("Expected {expected}, got {found:?}")]
    FieldType {
        expected: &'static str,
        found: String,
    },

    #[error("Unconsumed input: {0}")]
    UnconsumedFields(String),

    #[error("Unknown message tag: {0}")]
    UnknownTag(String),

    #[error("Unknown rule clause: {0}")]
    UnknownClause(String),

    #[error("Record line is not valid UTF-8")]
    InvalidUtf8,
}
