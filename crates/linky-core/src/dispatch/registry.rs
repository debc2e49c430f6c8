use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info};

use super::consumer::Consumer;
use super::dispatcher::Dispatcher;
use super::error::{ConsumerBuildError, ConsumerResolutionError};
use crate::config::ConsumerSpec;
use crate::consumers::{JsonLinesConsumer, LogConsumer};

/// Builds a consumer from its configuration entry.
pub type ConsumerFactory =
    Box<dyn Fn(&ConsumerSpec) -> Result<Arc<dyn Consumer>, ConsumerBuildError> + Send + Sync>;

/// Maps consumer kind tags to factories.
#[derive(Default)]
pub struct ConsumerRegistry {
    factories: BTreeMap<String, ConsumerFactory>,
}

impl ConsumerRegistry {
    /// Registry without any kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `log` and `jsonl` kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(LogConsumer::KIND, |spec| {
            Ok(Arc::new(LogConsumer::from_spec(spec)?) as Arc<dyn Consumer>)
        });
        registry.register(JsonLinesConsumer::KIND, |spec| {
            Ok(Arc::new(JsonLinesConsumer::from_spec(spec)?) as Arc<dyn Consumer>)
        });
        registry
    }

    /// Register or replace the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ConsumerSpec) -> Result<Arc<dyn Consumer>, ConsumerBuildError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn resolve(&self, spec: &ConsumerSpec) -> Result<Arc<dyn Consumer>, ConsumerResolutionError> {
        let factory = self.factories.get(&spec.kind).ok_or_else(|| {
            ConsumerResolutionError::UnknownKind {
                kind: spec.kind.clone(),
                known: self.kinds().collect::<Vec<_>>().join(", "),
            }
        })?;
        factory(spec).map_err(|source| ConsumerResolutionError::Build {
            name: spec.identifier().to_string(),
            kind: spec.kind.clone(),
            source,
        })
    }

    /// Resolve every entry in order; entries that fail are logged and left out.
    pub fn resolve_all(&self, specs: &[ConsumerSpec]) -> Dispatcher {
        let mut consumers = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.resolve(spec) {
                Ok(consumer) => {
                    info!(consumer = consumer.name(), kind = %spec.kind, "consumer registered");
                    consumers.push(consumer);
                }
                Err(err) => {
                    error!(consumer = spec.identifier(), error = %err, "consumer omitted");
                }
            }
        }
        Dispatcher::new(consumers)
    }
}
