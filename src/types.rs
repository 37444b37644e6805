//! Core types for the Telemetry Bridge pipeline
//!
//! This module defines the data structures that flow through normalization:
//! raw collected inputs on one side, telemetry records on the other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version stamped on every telemetry record
pub const RECORD_VERSION: &str = "1.0.0";

/// Nested object assembled from sub-relations, keyed by datastream id
pub type TelemetryObject = BTreeMap<String, TelemetryValue>;

/// Typed value produced by conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Object(TelemetryObject),
    Array(Vec<TelemetryObject>),
}

impl TelemetryValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TelemetryValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TelemetryValue::Decimal(d) => Some(*d),
            TelemetryValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TelemetryValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One named value inside a complex payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCollectInfo {
    pub field: String,
    pub value: String,
}

impl SubCollectInfo {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Nested payload attached to a collected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexValue {
    /// One nested object
    Single(Vec<SubCollectInfo>),
    /// An array of nested objects
    Array(Vec<Vec<SubCollectInfo>>),
}

/// One raw value collected from a device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectInfo {
    #[serde(default)]
    pub model_name: String,
    pub field_name: String,
    #[serde(default)]
    pub value: String,
    /// Epoch milliseconds, 0 when unset
    #[serde(default)]
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex: Option<ComplexValue>,
}

impl CollectInfo {
    pub fn new(
        model_name: impl Into<String>,
        field_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            field_name: field_name.into(),
            value: value.into(),
            ts: 0,
            complex: None,
        }
    }

    pub fn with_ts(mut self, ts: i64) -> Self {
        self.ts = ts;
        self
    }

    /// Attach a single nested object
    pub fn with_complex_value(mut self, values: Vec<SubCollectInfo>) -> Self {
        self.complex = Some(ComplexValue::Single(values));
        self
    }

    /// Attach an array of nested objects
    pub fn with_complex_value_arr(mut self, values: Vec<Vec<SubCollectInfo>>) -> Self {
        self.complex = Some(ComplexValue::Array(values));
        self
    }

    pub fn timestamp(&self) -> Option<i64> {
        (self.ts != 0).then_some(self.ts)
    }
}

/// Model-scoped inputs for one device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectBatch {
    pub device: String,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub items: Vec<CollectInfo>,
}

impl CollectBatch {
    pub fn new(device: impl Into<String>, path: Vec<String>, items: Vec<CollectInfo>) -> Self {
        Self {
            device: device.into(),
            path,
            items,
        }
    }
}

/// One timestamped value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<i64>,
    pub value: TelemetryValue,
}

/// Named time series within a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datastream {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datapoints: Vec<Datapoint>,
}

/// Outbound telemetry for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datastreams: Vec<Datastream>,
}
