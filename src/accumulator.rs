//! Measurement sink abstraction.
//!
//! Collectors never talk to an output layer directly. They hand every
//! measurement to an [`Accumulator`] supplied by the host, which decides
//! whether to record, export or print it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag set attached to a measurement, ordered by key.
pub type Tags = BTreeMap<String, String>;

/// Value of a single measurement.
///
/// Counters that parse as base-10 signed integers are reported as
/// [`MetricValue::Integer`]; anything else keeps its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    String(String),
}

impl MetricValue {
    /// Classifies a raw token, falling back to the unchanged string.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(v) => MetricValue::Integer(v),
            Err(_) => MetricValue::String(raw.to_string()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{v}"),
            MetricValue::String(s) => f.write_str(s),
        }
    }
}

/// One named, tagged data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: MetricValue,
    pub tags: Tags,
}

/// Sink for measurements produced by a collector.
pub trait Accumulator {
    fn add(&mut self, name: &str, value: MetricValue, tags: &Tags);
}

/// Accumulator that keeps every measurement in emission order.
#[derive(Debug, Default, Clone)]
pub struct MemoryAccumulator {
    measurements: Vec<Measurement>,
}

impl MemoryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn into_measurements(self) -> Vec<Measurement> {
        self.measurements
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

impl Accumulator for MemoryAccumulator {
    fn add(&mut self, name: &str, value: MetricValue, tags: &Tags) {
        self.measurements.push(Measurement {
            name: name.to_string(),
            value,
            tags: tags.clone(),
        });
    }
}
