//! Model management on top of a repository
//!
//! Every mutation is written to the repository first and then triggers a full
//! catalog reload, so the catalog always mirrors stored models.

use std::sync::Arc;

use tracing::info;

use super::{ModelRepository, RelationCatalog};
use crate::error::BridgeError;
use crate::schema::{Model, Relation};

/// Couples a [`ModelRepository`] with the [`RelationCatalog`] it feeds
pub struct ModelRegistry<R: ModelRepository> {
    repository: R,
    catalog: Arc<RelationCatalog>,
}

impl<R: ModelRepository> ModelRegistry<R> {
    pub fn new(repository: R, catalog: Arc<RelationCatalog>) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Build a registry with a fresh catalog loaded from `repository`
    pub fn load(repository: R) -> Result<Self, BridgeError> {
        let registry = Self::new(repository, Arc::new(RelationCatalog::new()));
        registry.reload()?;
        Ok(registry)
    }

    pub fn catalog(&self) -> Arc<RelationCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn reload(&self) -> Result<usize, BridgeError> {
        self.catalog.reload(&self.repository)
    }

    pub fn get(&self, name: &str) -> Result<Option<Vec<Relation>>, BridgeError> {
        self.repository.get(name)
    }

    pub fn list(&self) -> Result<Vec<Model>, BridgeError> {
        self.repository.list()
    }

    /// Create or replace a model, then reload the catalog
    pub fn upsert(&self, name: &str, relations: Vec<Relation>) -> Result<(), BridgeError> {
        self.repository.upsert(name, relations)?;
        self.reload()?;
        Ok(())
    }

    /// Merge relations into an existing model by field name.
    ///
    /// Relations whose field already exists replace the stored one in place;
    /// the rest are appended. A missing model is created.
    pub fn update(&self, name: &str, modified: Vec<Relation>) -> Result<(), BridgeError> {
        let Some(mut present) = self.repository.get(name)? else {
            info!(model = name, "model does not exist, creating");
            return self.upsert(name, modified);
        };

        for relation in modified {
            match present.iter_mut().find(|r| r.field == relation.field) {
                Some(slot) => *slot = relation,
                None => present.push(relation),
            }
        }
        self.upsert(name, present)
    }

    /// Remove a model, then reload the catalog
    pub fn delete(&self, name: &str) -> Result<(), BridgeError> {
        self.repository.delete(name)?;
        self.reload()?;
        Ok(())
    }
}
