mod stream;

pub use stream::{DEFAULT_CHUNK_SIZE, ReaderSource};

use thiserror::Error;

/// Connection lifecycle and data delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Connected,
    Data(Vec<u8>),
    Disconnected,
}

/// A transport delivering the meter's raw byte stream.
///
/// `Ok(None)` means the transport is gone for good.
pub trait ByteSource {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
