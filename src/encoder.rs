//! Record encoding
//!
//! This module turns telemetry records into wire payloads. The default
//! encoding sends every record as its own JSON document.

use crate::error::BridgeError;
use crate::types::TelemetryRecord;

/// Serializes produced records into outbound message bodies
pub trait RecordEncoder: Send + Sync {
    fn encode(&self, records: &[TelemetryRecord]) -> Result<Vec<String>, BridgeError>;
}

/// One independent JSON message per record
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pretty: bool,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output, mostly useful for inspection
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn encode_record(&self, record: &TelemetryRecord) -> Result<String, BridgeError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        json.map_err(|e| BridgeError::EncodingError(format!("error marshalling data: {e}")))
    }
}

impl RecordEncoder for JsonEncoder {
    fn encode(&self, records: &[TelemetryRecord]) -> Result<Vec<String>, BridgeError> {
        records.iter().map(|r| self.encode_record(r)).collect()
    }
}
