//! Value conversion
//!
//! Turns a raw collected string into a typed telemetry value according to a
//! [`DataType`] tag and a decimal factor. Conversion is total: malformed input
//! yields `None` ("no value") and the caller omits the field.

use chrono::{Local, TimeZone};

use crate::schema::DataType;
use crate::types::TelemetryValue;

/// Layout used for the `timestamp` tag: ISO-8601, milliseconds, zone offset
pub const ISO_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Convert `raw` according to `data_type`, scaling by `factor` where the tag
/// is numeric.
pub fn convert(raw: &str, data_type: &DataType, factor: &str) -> Option<TelemetryValue> {
    match data_type {
        DataType::Boolean => parse_bool(raw).map(TelemetryValue::Bool),
        DataType::Integer => raw.parse::<i64>().ok().map(TelemetryValue::Integer),
        DataType::Number => {
            let number = raw.parse::<f64>().ok()?;
            scale(number, factor).map(TelemetryValue::Decimal)
        }
        DataType::HexInt => parse_hex(raw).map(TelemetryValue::Integer),
        DataType::HexIntString => parse_hex(raw).map(|i| TelemetryValue::Text(i.to_string())),
        DataType::HexLittleEndianInt => {
            let swapped = reverse_hex_bytes(raw)?;
            parse_hex(&swapped).map(TelemetryValue::Integer)
        }
        DataType::HexLittleEndianIntString => {
            let swapped = reverse_hex_bytes(raw)?;
            parse_hex(&swapped).map(|i| TelemetryValue::Text(i.to_string()))
        }
        DataType::TwosComplementFloat => {
            let value = twos_complement_8(raw)?;
            scale(value as f64, factor).map(TelemetryValue::Decimal)
        }
        DataType::TwosComplementInt => twos_complement_8(raw).map(TelemetryValue::Integer),
        DataType::TwosComplementIntString => {
            twos_complement_8(raw).map(|i| TelemetryValue::Text(i.to_string()))
        }
        DataType::Timestamp => {
            let secs = raw.parse::<i64>().ok()?;
            epoch_secs_to_iso(secs).map(TelemetryValue::Text)
        }
        DataType::String | DataType::Other(_) => Some(TelemetryValue::Text(raw.to_string())),
    }
}

/// Boolean literals accepted by the `boolean` tag
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_hex(raw: &str) -> Option<i64> {
    i64::from_str_radix(raw, 16).ok()
}

/// Multiply by the factor and round to two decimals.
///
/// A factor that does not parse, or parses to zero, suppresses the value.
fn scale(value: f64, factor: &str) -> Option<f64> {
    let factor = factor.trim().parse::<f64>().ok()?;
    if factor == 0.0 {
        return None;
    }
    let scaled = round_to_fixed(value * factor, 2);
    scaled.is_finite().then_some(scaled)
}

pub fn round_to_fixed(value: f64, decimals: i32) -> f64 {
    let power = 10f64.powi(decimals);
    (value * power).round() / power
}

/// Reverse the byte order of a hex string: "3FB60100" -> "0001B63F"
pub fn reverse_hex_bytes(raw: &str) -> Option<String> {
    let mut bytes = hex::decode(raw).ok()?;
    bytes.reverse();
    Some(hex::encode_upper(bytes))
}

/// Decode one hex byte as an 8-bit two's-complement integer: "AC" -> -84
pub fn twos_complement_8(raw: &str) -> Option<i64> {
    let byte = u8::from_str_radix(raw, 16).ok()?;
    Some(i64::from(byte as i8))
}

/// Format epoch seconds in the local time zone
pub fn epoch_secs_to_iso(secs: i64) -> Option<String> {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .map(|t| t.format(ISO_MILLIS_FORMAT).to_string())
}
