use thiserror::Error;

use crate::frame::Measurements;

/// Side effect invoked once per dispatched frame (storage, display, ...).
///
/// Consumers are shared between worker threads and may be called
/// concurrently for different frames; any synchronization their side effects
/// need is theirs to provide.
pub trait Consumer: Send + Sync {
    /// Identifier used in logs and error reports.
    fn name(&self) -> &str;

    /// Handle one frame. `measurements` is this consumer's own copy.
    fn compute(&self, measurements: Measurements, timestamp: &str) -> Result<(), ConsumerError>;
}

/// Failure returned by a consumer.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {label}: {value:?}")]
    InvalidValue { label: String, value: String },
    #[error("consumer unavailable: {0}")]
    Unavailable(String),
}
