//! Measurement records and the accumulator seam
//!
//! Decoded domain records are flattened into tagged measurements: a name, a
//! tag set, and a field set. The host pipeline consumes them through the
//! [`Accumulator`] trait; [`MeasurementBuffer`] is the in-memory accumulator
//! used by the HTTP handler and the tests.

use std::collections::BTreeMap;

use crate::error::EmitError;

/// A single typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer counter, as received upstream
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Free-text value (e.g. server status)
    String(String),
    /// Boolean flag
    Boolean(bool),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

/// One tagged measurement
///
/// Tags and fields are kept in sorted maps so downstream formatting is
/// deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Measurement name, e.g. "openstack_hypervisor"
    pub name: String,
    /// Tag set
    pub tags: BTreeMap<String, String>,
    /// Field set
    pub fields: BTreeMap<String, FieldValue>,
}

impl Measurement {
    /// Create a new measurement with no tags or fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field only when the value is present
    ///
    /// Absent upstream values stay absent in the emitted measurement; they are
    /// never zero-filled.
    pub fn with_optional_field(
        mut self,
        key: impl Into<String>,
        value: Option<impl Into<FieldValue>>,
    ) -> Self {
        if let Some(value) = value {
            self.fields.insert(key.into(), value.into());
        }
        self
    }
}

/// Destination for emitted measurements
///
/// `add` mirrors the host pipeline's `add(name, tags, fields)` contract. A
/// rejection is non-fatal: the caller reports it and continues with the
/// remaining measurements.
pub trait Accumulator: Send {
    /// Hand one measurement to the host pipeline
    fn add(&mut self, measurement: Measurement) -> Result<(), EmitError>;
}

/// In-memory accumulator
#[derive(Debug, Default, Clone)]
pub struct MeasurementBuffer {
    measurements: Vec<Measurement>,
}

impl MeasurementBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected measurements, in emission order
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Consume the buffer
    pub fn into_measurements(self) -> Vec<Measurement> {
        self.measurements
    }

    /// Number of collected measurements
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

impl Accumulator for MeasurementBuffer {
    fn add(&mut self, measurement: Measurement) -> Result<(), EmitError> {
        self.measurements.push(measurement);
        Ok(())
    }
}
