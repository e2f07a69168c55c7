//! Error types for stream decoding

use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

/// Failure raised while reading or writing the binary stream.
///
/// Writes only ever fail with `Io`; the remaining variants cover the
/// decode-side taxonomy: truncated input, malformed lengths, bad tag
/// bytes, unregistered type ids and dangling node references.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("invalid length field: {0}")]
    InvalidLength(i64),

    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("invalid tag value: {0}")]
    InvalidTag(i32),

    #[error("unknown type id: {0}")]
    UnknownType(i32),

    #[error("unresolved reference to node id {0}")]
    UnresolvedId(u64),
}

impl StreamError {
    /// Collapse `io::ErrorKind::UnexpectedEof` into the dedicated variant so
    /// truncation is distinguishable from genuine device failures.
    pub(crate) fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            StreamError::UnexpectedEof
        } else {
            StreamError::Io(err)
        }
    }
}
