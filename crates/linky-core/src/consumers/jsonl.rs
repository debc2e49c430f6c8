use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::ConsumerSpec;
use crate::dispatch::{Consumer, ConsumerBuildError, ConsumerError};
use crate::frame::Measurements;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsonLinesOptions {
    /// Output file, opened in append mode. Standard output when unset.
    pub path: Option<PathBuf>,
    /// Labels to write; empty writes every label.
    pub labels: Vec<String>,
    /// Write values as JSON integers. A non-integer value fails the frame.
    pub numeric: bool,
}

/// Appends one JSON object per frame to a writer.
///
/// Output shape: `{"timestamp":"...","measurements":{"LABEL":"VALUE",...}}`
/// with labels in frame order.
pub struct JsonLinesConsumer {
    name: String,
    options: JsonLinesOptions,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesConsumer {
    pub const KIND: &'static str = "jsonl";

    pub fn new(
        name: impl Into<String>,
        options: JsonLinesOptions,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            writer: Mutex::new(writer),
        }
    }

    pub fn from_spec(spec: &ConsumerSpec) -> Result<Self, ConsumerBuildError> {
        let options: JsonLinesOptions = spec.options()?;
        let writer: Box<dyn Write + Send> = match &options.path {
            Some(path) => Box::new(io::BufWriter::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(spec.identifier(), options, writer))
    }

    fn encode(&self, measurements: &Measurements, timestamp: &str) -> Result<Vec<u8>, ConsumerError> {
        let mut fields = Vec::new();
        for (label, value) in measurements.filtered(&self.options.labels).iter() {
            let field = if self.options.numeric {
                let number: u64 = value.parse().map_err(|_| ConsumerError::InvalidValue {
                    label: label.to_string(),
                    value: value.to_string(),
                })?;
                serde_json::Value::from(number)
            } else {
                serde_json::Value::from(value)
            };
            fields.push((label.to_string(), field));
        }
        let line = JsonLine {
            timestamp,
            measurements: OrderedFields(fields),
        };
        let mut encoded = serde_json::to_vec(&line)?;
        encoded.push(b'\n');
        Ok(encoded)
    }
}

impl Consumer for JsonLinesConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, measurements: Measurements, timestamp: &str) -> Result<(), ConsumerError> {
        let encoded = self.encode(&measurements, timestamp)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ConsumerError::Unavailable(format!("{} writer poisoned", self.name)))?;
        writer.write_all(&encoded)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: &'a str,
    measurements: OrderedFields,
}

struct OrderedFields(Vec<(String, serde_json::Value)>);

impl Serialize for OrderedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}
