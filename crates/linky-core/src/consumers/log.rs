use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ConsumerSpec;
use crate::dispatch::{Consumer, ConsumerBuildError, ConsumerError};
use crate::frame::Measurements;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogOptions {
    /// Labels to log; empty logs every label.
    pub labels: Vec<String>,
}

/// Logs kept measurements at `info` and the rest at `debug`.
#[derive(Debug)]
pub struct LogConsumer {
    name: String,
    options: LogOptions,
}

impl LogConsumer {
    pub const KIND: &'static str = "log";

    pub fn new(name: impl Into<String>, options: LogOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    pub fn from_spec(spec: &ConsumerSpec) -> Result<Self, ConsumerBuildError> {
        Ok(Self::new(spec.identifier(), spec.options()?))
    }

    fn keeps(&self, label: &str) -> bool {
        self.options.labels.is_empty() || self.options.labels.iter().any(|kept| kept == label)
    }
}

impl Consumer for LogConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, measurements: Measurements, timestamp: &str) -> Result<(), ConsumerError> {
        for (label, value) in measurements.iter() {
            if self.keeps(label) {
                info!(consumer = %self.name, timestamp, label, value, "measurement");
            } else {
                debug!(consumer = %self.name, timestamp, label, value, "measurement");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LogConsumer, LogOptions};
    use crate::config::ConsumerSpec;
    use crate::dispatch::Consumer;
    use crate::frame::Measurements;

    #[test]
    fn keeps_listed_labels_only() {
        let consumer = LogConsumer::new(
            "log",
            LogOptions {
                labels: vec!["PAPP".to_string(), "ADCO".to_string()],
            },
        );
        assert!(consumer.keeps("PAPP"));
        assert!(!consumer.keeps("IINST"));
    }

    #[test]
    fn empty_label_list_keeps_everything() {
        let spec = ConsumerSpec::new("log").with_name("display");
        let consumer = LogConsumer::from_spec(&spec).unwrap();
        assert_eq!(consumer.name(), "display");
        assert!(consumer.keeps("IINST"));
        let measurements: Measurements = [("IINST", "002")].into_iter().collect();
        assert!(consumer.compute(measurements, "ts").is_ok());
    }

    #[test]
    fn unknown_option_is_rejected() {
        let spec = ConsumerSpec::new("log").with_option("colour", true);
        assert!(LogConsumer::from_spec(&spec).is_err());
    }
}
