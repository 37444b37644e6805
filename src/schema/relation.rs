//! Relation definitions
//!
//! A relation maps one collected device field onto one telemetry datastream,
//! with the conversion to apply and optional enum and nested-field rules.

use serde::{Deserialize, Serialize};

use super::DataType;
use crate::converter;
use crate::types::TelemetryValue;

/// Factor applied when a relation does not declare one
pub const DEFAULT_FACTOR: &str = "1";

/// Mapping rule for one device field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Field name as reported by the device
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,
    /// Target datastream id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_data_stream: String,
    /// Alternative name used in alias matching mode
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default)]
    pub data_type: DataType,
    /// Rules for fields nested inside a complex value
    #[serde(
        default,
        alias = "ogNamesArr",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sub_relations: Vec<SubRelation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumMapping>,
    /// Decimal scale factor, kept as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<String>,
}

/// Mapping rule for one field inside a complex value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRelation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_data_stream: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<String>,
}

/// Verbatim substitution of a collected value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumMapping {
    #[serde(default)]
    pub collect_value: String,
    #[serde(default)]
    pub og_value: String,
}

/// A named, ordered set of relations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub relations: Vec<Relation>,
}

impl Model {
    pub fn new(name: impl Into<String>, relations: Vec<Relation>) -> Self {
        Self {
            name: name.into(),
            relations,
        }
    }

    /// First relation declared for `field`
    pub fn relation(&self, field: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.field == field)
    }

    /// First relation declared with `alias`
    pub fn relation_by_alias(&self, alias: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.alias == alias)
    }
}

impl Relation {
    pub fn new(
        field: impl Into<String>,
        og_data_stream: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            field: field.into(),
            og_data_stream: og_data_stream.into(),
            data_type,
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_factor(mut self, factor: impl Into<String>) -> Self {
        self.factor = Some(factor.into());
        self
    }

    pub fn with_enum(
        mut self,
        collect_value: impl Into<String>,
        og_value: impl Into<String>,
    ) -> Self {
        self.enums.push(EnumMapping {
            collect_value: collect_value.into(),
            og_value: og_value.into(),
        });
        self
    }

    pub fn with_sub_relation(mut self, sub: SubRelation) -> Self {
        self.sub_relations.push(sub);
        self
    }

    /// Declared factor, or [`DEFAULT_FACTOR`] when missing or blank
    pub fn factor(&self) -> &str {
        effective_factor(self.factor.as_deref())
    }

    /// Convert a collected scalar value through this relation.
    ///
    /// Enum-bearing relations match the raw input verbatim; a match is converted
    /// with this relation's data type, a miss is returned unchanged as text.
    pub fn convert(&self, raw: &str) -> Option<TelemetryValue> {
        if self.enums.is_empty() {
            return converter::convert(raw, &self.data_type, self.factor());
        }
        match self.enums.iter().find(|e| e.collect_value == raw) {
            Some(mapping) => converter::convert(&mapping.og_value, &self.data_type, self.factor()),
            None => Some(TelemetryValue::Text(raw.to_string())),
        }
    }

    /// Sub-relation declared for a nested field
    pub fn sub_relation(&self, field: &str) -> Option<&SubRelation> {
        self.sub_relations.iter().find(|s| s.field == field)
    }
}

impl SubRelation {
    pub fn new(
        field: impl Into<String>,
        og_data_stream: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            field: field.into(),
            og_data_stream: og_data_stream.into(),
            data_type,
            factor: None,
        }
    }

    pub fn with_factor(mut self, factor: impl Into<String>) -> Self {
        self.factor = Some(factor.into());
        self
    }

    pub fn factor(&self) -> &str {
        effective_factor(self.factor.as_deref())
    }

    pub fn convert(&self, raw: &str) -> Option<TelemetryValue> {
        converter::convert(raw, &self.data_type, self.factor())
    }
}

fn effective_factor(factor: Option<&str>) -> &str {
    match factor {
        Some(f) if !f.trim().is_empty() => f,
        _ => DEFAULT_FACTOR,
    }
}
