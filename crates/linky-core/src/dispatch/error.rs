use thiserror::Error;

use super::consumer::ConsumerError;

/// A consumer call that did not complete during dispatch.
#[derive(Debug, Error)]
pub enum ConsumerInvocationError {
    /// The consumer returned an error.
    #[error("consumer '{consumer}' failed: {source}")]
    Failed {
        consumer: String,
        source: ConsumerError,
    },
    /// The consumer panicked; this is a bug in the consumer, not a data issue.
    #[error("consumer '{consumer}' panicked: {message}")]
    Panicked { consumer: String, message: String },
}

impl ConsumerInvocationError {
    pub fn consumer(&self) -> &str {
        match self {
            Self::Failed { consumer, .. } | Self::Panicked { consumer, .. } => consumer,
        }
    }
}

/// A consumer factory could not build its consumer.
#[derive(Debug, Error)]
pub enum ConsumerBuildError {
    #[error("invalid options: {0}")]
    Options(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A configured consumer could not be turned into a live handle.
#[derive(Debug, Error)]
pub enum ConsumerResolutionError {
    #[error("unknown consumer kind '{kind}' (known: {known})")]
    UnknownKind { kind: String, known: String },
    #[error("cannot build consumer '{name}' of kind '{kind}': {source}")]
    Build {
        name: String,
        kind: String,
        source: ConsumerBuildError,
    },
}
