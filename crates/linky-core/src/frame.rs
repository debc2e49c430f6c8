//! Decoded frame model shared by the decoder, the dispatcher and consumers.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::protocols::tic::TicError;

/// Ordered label -> value mapping for one frame.
///
/// Labels keep their first-seen position; inserting an existing label
/// overwrites its value in place. Serializes as a JSON object in arrival
/// order.
///
/// # Examples
/// ```
/// use linky_core::Measurements;
///
/// let mut measurements = Measurements::new();
/// measurements.insert("HCHC", "000835358");
/// measurements.insert("HCHP", "001262798");
/// assert_eq!(measurements.get("HCHP"), Some("001262798"));
/// assert_eq!(measurements.labels().collect::<Vec<_>>(), vec!["HCHC", "HCHP"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measurements {
    entries: Vec<(String, String)>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one when the label repeats.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((label, value));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(label, value)| (label.as_str(), value.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Copy keeping only `labels`; an empty keep-list keeps everything.
    pub fn filtered(&self, labels: &[String]) -> Self {
        if labels.is_empty() {
            return self.clone();
        }
        self.iter()
            .filter(|(label, _)| labels.iter().any(|kept| kept == label))
            .collect()
    }
}

impl<L: Into<String>, V: Into<String>> FromIterator<(L, V)> for Measurements {
    fn from_iter<I: IntoIterator<Item = (L, V)>>(iter: I) -> Self {
        let mut measurements = Self::new();
        for (label, value) in iter {
            measurements.insert(label, value);
        }
        measurements
    }
}

impl Serialize for Measurements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Measurements {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MeasurementsVisitor)
    }
}

struct MeasurementsVisitor;

impl<'de> Visitor<'de> for MeasurementsVisitor {
    type Value = Measurements;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of label to value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut measurements = Measurements::new();
        while let Some((label, value)) = access.next_entry::<String, String>()? {
            measurements.insert(label, value);
        }
        Ok(measurements)
    }
}

/// Overall outcome of decoding one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    /// Every line decoded and validated.
    Complete,
    /// A line failed after at least one good line; earlier lines are kept.
    Partial,
    /// The first line failed; nothing was kept.
    Rejected,
    /// The frame held no lines.
    Empty,
}

/// Result of decoding one raw frame, stamped at frame-boundary detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Position of the frame since the connection started (0 is likely truncated).
    pub sequence: u64,
    /// RFC 3339 capture timestamp.
    pub captured_at: String,
    pub measurements: Measurements,
    pub status: FrameStatus,
    /// The line failure that stopped decoding, if any.
    pub error: Option<TicError>,
}

impl DecodedFrame {
    /// Whether the frame carries anything worth handing to consumers.
    pub fn is_dispatchable(&self) -> bool {
        !self.measurements.is_empty()
    }
}
