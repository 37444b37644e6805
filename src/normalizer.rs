//! Record normalization
//!
//! This module assembles raw collected values into telemetry records:
//! - Relations resolved through the catalog, by field name or alias
//! - Scalar values converted through the relation's data type
//! - Complex values assembled from sub-relations
//! - Datastreams grouped by telemetry id, or emitted one per input

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogSnapshot, RelationCatalog};
use crate::diagnostics::{DropObserver, DropReason, DroppedField};
use crate::schema::Relation;
use crate::types::{
    CollectBatch, CollectInfo, ComplexValue, Datapoint, Datastream, SubCollectInfo,
    TelemetryObject, TelemetryRecord, TelemetryValue, RECORD_VERSION,
};

/// How surviving inputs are laid out as datastreams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// One datastream per distinct telemetry id, in order of first appearance
    #[default]
    Grouped,
    /// One datastream per surviving input
    Simple,
}

/// Which relation attribute a collected field name is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBy {
    #[default]
    Field,
    Alias,
}

/// Builds telemetry records from collected values
#[derive(Clone)]
pub struct Normalizer {
    catalog: Arc<RelationCatalog>,
    grouping: Grouping,
    match_by: MatchBy,
    observer: Option<Arc<dyn DropObserver>>,
}

impl Normalizer {
    pub fn new(catalog: Arc<RelationCatalog>) -> Self {
        Self {
            catalog,
            grouping: Grouping::default(),
            match_by: MatchBy::default(),
            observer: None,
        }
    }

    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_match_by(mut self, match_by: MatchBy) -> Self {
        self.match_by = match_by;
        self
    }

    pub fn with_drop_observer(mut self, observer: Arc<dyn DropObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn catalog(&self) -> &Arc<RelationCatalog> {
        &self.catalog
    }

    /// Normalize one device batch
    pub fn normalize(&self, batch: &CollectBatch) -> Option<TelemetryRecord> {
        self.normalize_items(&batch.items, &batch.device, &batch.path)
    }

    /// Normalize collected values for one device.
    ///
    /// Returns `None` when nothing survives resolution and conversion.
    pub fn normalize_items(
        &self,
        items: &[CollectInfo],
        device: &str,
        path: &[String],
    ) -> Option<TelemetryRecord> {
        let snapshot = self.catalog.snapshot();
        let survivors = items.iter().filter_map(|info| self.datastream(&snapshot, info));

        let datastreams = match self.grouping {
            Grouping::Simple => survivors.collect(),
            Grouping::Grouped => group_by_id(survivors),
        };

        if datastreams.is_empty() {
            debug!(device, inputs = items.len(), "no datastream survived normalization");
            return None;
        }

        Some(TelemetryRecord {
            version: RECORD_VERSION.to_string(),
            device: device.to_string(),
            path: path.to_vec(),
            datastreams,
        })
    }

    /// Single-datapoint datastream for one input, if it resolves and converts
    pub fn datastream(&self, snapshot: &CatalogSnapshot, info: &CollectInfo) -> Option<Datastream> {
        let relation = match self.match_by {
            MatchBy::Field => snapshot.relation(&info.field_name, &info.model_name),
            MatchBy::Alias => snapshot.relation_by_alias(&info.field_name, &info.model_name),
        };
        let Some(relation) = relation else {
            self.report(&info.model_name, &info.field_name, DropReason::Unresolved);
            return None;
        };

        let value = match &info.complex {
            Some(complex) => self.complex_value(info, relation, complex),
            None => {
                let value = relation.convert(&info.value);
                if value.is_none() {
                    self.report(&info.model_name, &info.field_name, DropReason::ConversionFailed);
                }
                value
            }
        }?;

        Some(Datastream {
            id: relation.og_data_stream.clone(),
            datapoints: vec![Datapoint {
                at: info.timestamp(),
                value,
            }],
        })
    }

    fn complex_value(
        &self,
        info: &CollectInfo,
        relation: &Relation,
        complex: &ComplexValue,
    ) -> Option<TelemetryValue> {
        let value = match complex {
            ComplexValue::Single(values) => self
                .build_object(info, relation, values)
                .map(TelemetryValue::Object),
            ComplexValue::Array(entries) => {
                let objects: Vec<TelemetryObject> = entries
                    .iter()
                    .filter_map(|values| self.build_object(info, relation, values))
                    .collect();
                (!objects.is_empty()).then_some(TelemetryValue::Array(objects))
            }
        };
        if value.is_none() {
            self.report(&info.model_name, &info.field_name, DropReason::EmptyComplexValue);
        }
        value
    }

    fn build_object(
        &self,
        info: &CollectInfo,
        relation: &Relation,
        values: &[SubCollectInfo],
    ) -> Option<TelemetryObject> {
        let mut object = TelemetryObject::new();
        for sub in values {
            let qualified = || format!("{}.{}", info.field_name, sub.field);
            let Some(sub_relation) = relation.sub_relation(&sub.field) else {
                self.report(&info.model_name, &qualified(), DropReason::UnmatchedSubField);
                continue;
            };
            match sub_relation.convert(&sub.value) {
                Some(value) => {
                    object.insert(sub_relation.og_data_stream.clone(), value);
                }
                None => self.report(&info.model_name, &qualified(), DropReason::ConversionFailed),
            }
        }
        (!object.is_empty()).then_some(object)
    }

    fn report(&self, model: &str, field: &str, reason: DropReason) {
        debug!(model, field, ?reason, "field dropped");
        if let Some(observer) = &self.observer {
            observer.on_drop(&DroppedField {
                model: model.to_string(),
                field: field.to_string(),
                reason,
            });
        }
    }
}

fn group_by_id(datastreams: impl Iterator<Item = Datastream>) -> Vec<Datastream> {
    let mut grouped: Vec<Datastream> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for datastream in datastreams {
        match positions.get(&datastream.id) {
            Some(&pos) => grouped[pos].datapoints.extend(datastream.datapoints),
            None => {
                positions.insert(datastream.id.clone(), grouped.len());
                grouped.push(datastream);
            }
        }
    }
    grouped
}
