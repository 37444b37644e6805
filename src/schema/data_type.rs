//! Closed catalog of conversion tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversion applied to a raw collected string.
///
/// Tags are read from relation definitions as plain strings. Anything not in
/// the catalog is kept as [`DataType::Other`] and passes values through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Boolean,
    Integer,
    Number,
    HexInt,
    HexIntString,
    HexLittleEndianInt,
    HexLittleEndianIntString,
    TwosComplementFloat,
    TwosComplementInt,
    TwosComplementIntString,
    Timestamp,
    #[default]
    String,
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Number => "number",
            DataType::HexInt => "hexstring-int",
            DataType::HexIntString => "hexstring-intstring",
            DataType::HexLittleEndianInt => "hexstring-littleendian-int",
            DataType::HexLittleEndianIntString => "hexstring-littleendian-intstring",
            DataType::TwosComplementFloat => "a2-8-string-float",
            DataType::TwosComplementInt => "a2-8-string-int",
            DataType::TwosComplementIntString => "a2-8-string-intstring",
            DataType::Timestamp => "timestamp",
            DataType::String => "string",
            DataType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for DataType {
    fn from(tag: &str) -> Self {
        match tag {
            "boolean" => DataType::Boolean,
            "integer" => DataType::Integer,
            "number" => DataType::Number,
            "hexstring-int" => DataType::HexInt,
            "hexstring-intstring" => DataType::HexIntString,
            "hexstring-littleendian-int" => DataType::HexLittleEndianInt,
            "hexstring-littleendian-intstring" => DataType::HexLittleEndianIntString,
            "a2-8-string-float" => DataType::TwosComplementFloat,
            "a2-8-string-int" => DataType::TwosComplementInt,
            "a2-8-string-intstring" => DataType::TwosComplementIntString,
            "timestamp" => DataType::Timestamp,
            "string" | "" => DataType::String,
            other => DataType::Other(other.to_string()),
        }
    }
}

impl From<String> for DataType {
    fn from(tag: String) -> Self {
        DataType::from(tag.as_str())
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
