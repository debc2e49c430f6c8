use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::consumer::Consumer;
use super::error::ConsumerInvocationError;
use crate::frame::Measurements;

/// Outcome of one fan-out.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failures: Vec<ConsumerInvocationError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Immutable, ordered consumer list with per-consumer error isolation.
///
/// # Examples
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use linky_core::{Consumer, ConsumerError, Dispatcher, Measurements};
///
/// struct Count(Mutex<usize>);
///
/// impl Consumer for Count {
///     fn name(&self) -> &str {
///         "count"
///     }
///     fn compute(&self, _: Measurements, _: &str) -> Result<(), ConsumerError> {
///         *self.0.lock().unwrap() += 1;
///         Ok(())
///     }
/// }
///
/// let count = Arc::new(Count(Mutex::new(0)));
/// let dispatcher = Dispatcher::new(vec![count.clone() as Arc<dyn Consumer>]);
/// let measurements: Measurements = [("PAPP", "00510")].into_iter().collect();
/// let report = dispatcher.dispatch(&measurements, "2024-01-01T00:00:00Z");
/// assert_eq!(report.delivered, 1);
/// assert_eq!(*count.0.lock().unwrap(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Dispatcher {
    consumers: Vec<Arc<dyn Consumer>>,
}

impl Dispatcher {
    pub fn new(consumers: Vec<Arc<dyn Consumer>>) -> Self {
        Self { consumers }
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn consumer_names(&self) -> impl Iterator<Item = &str> {
        self.consumers.iter().map(|consumer| consumer.name())
    }

    /// Invoke every consumer in registration order with its own copy.
    pub fn dispatch(&self, measurements: &Measurements, timestamp: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        for consumer in &self.consumers {
            let snapshot = measurements.clone();
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| consumer.compute(snapshot, timestamp)));
            match outcome {
                Ok(Ok(())) => {
                    debug!(consumer = consumer.name(), timestamp, "frame delivered");
                    report.delivered += 1;
                }
                Ok(Err(source)) => {
                    warn!(
                        consumer = consumer.name(),
                        timestamp,
                        error = %source,
                        "consumer failed, continuing with the next one"
                    );
                    report.failures.push(ConsumerInvocationError::Failed {
                        consumer: consumer.name().to_string(),
                        source,
                    });
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(
                        consumer = consumer.name(),
                        timestamp,
                        panic = %message,
                        "consumer panicked, continuing with the next one"
                    );
                    report.failures.push(ConsumerInvocationError::Panicked {
                        consumer: consumer.name().to_string(),
                        message,
                    });
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.consumer_names()).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
