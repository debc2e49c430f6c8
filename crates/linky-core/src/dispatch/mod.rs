//! Fan-out of decoded frames to consumers.
//!
//! The dispatcher owns an immutable consumer list and hands each consumer its
//! own copy of the measurements. A failing or panicking consumer is reported
//! and skipped; it never affects its siblings or the reader.

mod consumer;
mod dispatcher;
mod error;
mod registry;

pub use consumer::{Consumer, ConsumerError};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{ConsumerBuildError, ConsumerInvocationError, ConsumerResolutionError};
pub use registry::{ConsumerFactory, ConsumerRegistry};
