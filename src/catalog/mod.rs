//! Relation catalog
//!
//! Read model over the loaded relation models. Readers take a cheap
//! [`CatalogSnapshot`] handle; reloads build a new snapshot and swap it in
//! whole, so a reader never sees a half-rebuilt catalog.

mod registry;
mod repository;

pub use registry::ModelRegistry;
pub use repository::{DirectoryModelRepository, InMemoryModelRepository, ModelRepository};

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::BridgeError;
use crate::schema::{Model, Relation};

/// Immutable view of every loaded model
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    models: Vec<Model>,
}

impl CatalogSnapshot {
    pub fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn relations(&self, model_name: &str) -> Option<&[Relation]> {
        self.model(model_name).map(|m| m.relations.as_slice())
    }

    /// Relation for `field` in `model_name`.
    ///
    /// When no model carries that name and exactly one model is loaded, the
    /// lookup falls back to the sole model.
    pub fn relation(&self, field: &str, model_name: &str) -> Option<&Relation> {
        self.scope(model_name)?.relation(field)
    }

    /// Relation whose alias is `alias`, with the same model fallback as
    /// [`CatalogSnapshot::relation`].
    pub fn relation_by_alias(&self, alias: &str, model_name: &str) -> Option<&Relation> {
        self.scope(model_name)?.relation_by_alias(alias)
    }

    fn scope(&self, model_name: &str) -> Option<&Model> {
        match self.model(model_name) {
            Some(model) => Some(model),
            None if self.models.len() == 1 => self.models.first(),
            None => None,
        }
    }
}

/// Process-wide holder of the current snapshot
#[derive(Debug, Default)]
pub struct RelationCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl RelationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_models(models: Vec<Model>) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::new(models))),
        }
    }

    /// Current snapshot; stays valid across later reloads
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace every model at once
    pub fn replace(&self, models: Vec<Model>) {
        let next = Arc::new(CatalogSnapshot::new(models));
        *self.current.write() = next;
    }

    /// Rebuild the catalog from a repository and swap it in.
    ///
    /// On error the previous snapshot stays in place.
    pub fn reload(&self, repository: &dyn ModelRepository) -> Result<usize, BridgeError> {
        let models = repository.list()?;
        for model in &models {
            info!(model = %model.name, relations = model.relations.len(), "catalog loaded");
        }
        let count = models.len();
        self.replace(models);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn meter() -> Model {
        Model::new(
            "meter",
            vec![
                Relation::new("kwh", "energy.total", DataType::Number).with_alias("E"),
                Relation::new("v", "voltage", DataType::Number),
            ],
        )
    }

    fn router() -> Model {
        Model::new(
            "router",
            vec![Relation::new("fw", "device.software", DataType::String)],
        )
    }

    #[test]
    fn test_lookup_by_field_and_alias() {
        let snapshot = CatalogSnapshot::new(vec![meter(), router()]);

        assert_eq!(
            snapshot.relation("kwh", "meter").unwrap().og_data_stream,
            "energy.total"
        );
        assert_eq!(
            snapshot.relation_by_alias("E", "meter").unwrap().field,
            "kwh"
        );
        assert!(snapshot.relation("kwh", "router").is_none());
        assert!(snapshot.relation_by_alias("kwh", "meter").is_none());
    }

    #[test]
    fn test_unknown_model_falls_back_only_to_sole_model() {
        let single = CatalogSnapshot::new(vec![meter()]);
        assert!(single.relation("v", "whatever").is_some());
        assert!(single.relation("v", "").is_some());

        let many = CatalogSnapshot::new(vec![meter(), router()]);
        assert!(many.relation("v", "whatever").is_none());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let catalog = RelationCatalog::from_models(vec![meter()]);
        let before = catalog.snapshot();

        catalog.replace(vec![router()]);
        let after = catalog.snapshot();

        assert!(before.model("meter").is_some());
        assert!(before.model("router").is_none());
        assert!(after.model("router").is_some());
        assert!(after.model("meter").is_none());
    }

    #[test]
    fn test_reload_from_repository() {
        let repository = InMemoryModelRepository::with_models(vec![meter(), router()]);
        let catalog = RelationCatalog::new();
        assert!(catalog.snapshot().is_empty());

        let loaded = catalog.reload(&repository).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(catalog.snapshot().len(), 2);
        assert_eq!(catalog.snapshot().relations("router").unwrap().len(), 1);
    }
}
