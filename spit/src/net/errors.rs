//! Network error types for serialization and protocol operations.

use std::io;
use thiserror::Error;

/// Errors that can occur during network message serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Failed to encode a message
    #[error("Failed to encode message: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Failed to decode a message
    #[error("Failed to decode message: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Message size exceeded maximum allowed
    #[error("Message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

impl From<SerializationError> for io::Error {
    fn from(value: SerializationError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, value)
    }
}

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Whether an I/O error means the peer went away, as opposed to a fault
/// in what it sent.
#[must_use]
pub fn is_disconnect(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}

/// Whether a failed `accept` only lost that one pending connection, so the
/// listener can keep going.
#[must_use]
pub fn is_transient_accept(error: &io::Error) -> bool {
    is_disconnect(error)
        || matches!(
            error.kind(),
            io::ErrorKind::TimedOut
                | io::ErrorKind::HostUnreachable
                | io::ErrorKind::NetworkUnreachable
                | io::ErrorKind::NetworkDown
                | io::ErrorKind::PermissionDenied
        )
}
