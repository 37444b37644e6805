//! Model repositories
//!
//! Storage backends for relation models. The catalog only reads through
//! [`ModelRepository::list`]; the other operations serve model management.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::schema::{Model, Relation};

/// Storage contract for relation models
pub trait ModelRepository: Send + Sync {
    /// Relations of one model, `None` if it does not exist
    fn get(&self, name: &str) -> Result<Option<Vec<Relation>>, BridgeError>;

    /// Every stored model
    fn list(&self) -> Result<Vec<Model>, BridgeError>;

    /// Create or replace a model
    fn upsert(&self, name: &str, relations: Vec<Relation>) -> Result<(), BridgeError>;

    /// Remove a model
    fn delete(&self, name: &str) -> Result<(), BridgeError>;
}

/// Repository kept entirely in memory, in insertion order
#[derive(Debug, Default)]
pub struct InMemoryModelRepository {
    models: RwLock<Vec<Model>>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: Vec<Model>) -> Self {
        Self {
            models: RwLock::new(models),
        }
    }
}

impl ModelRepository for InMemoryModelRepository {
    fn get(&self, name: &str) -> Result<Option<Vec<Relation>>, BridgeError> {
        Ok(self
            .models
            .read()
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.relations.clone()))
    }

    fn list(&self) -> Result<Vec<Model>, BridgeError> {
        Ok(self.models.read().clone())
    }

    fn upsert(&self, name: &str, relations: Vec<Relation>) -> Result<(), BridgeError> {
        validate_model_name(name)?;
        let mut models = self.models.write();
        match models.iter_mut().find(|m| m.name == name) {
            Some(model) => model.relations = relations,
            None => models.push(Model::new(name, relations)),
        }
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), BridgeError> {
        let mut models = self.models.write();
        let before = models.len();
        models.retain(|m| m.name != name);
        if models.len() == before {
            return Err(BridgeError::ModelNotFound(name.to_string()));
        }
        Ok(())
    }
}

/// Repository backed by a directory of `<model>.json` files.
///
/// Each file holds the JSON array of relations of one model; the model name is
/// the file stem. Files without the `.json` extension are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryModelRepository {
    dir: PathBuf,
}

impl DirectoryModelRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn read_relations(path: &Path) -> Result<Vec<Relation>, BridgeError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            warn!(file = %path.display(), error = %e, "error unmarshaling model file");
            BridgeError::JsonError(e)
        })
    }
}

impl ModelRepository for DirectoryModelRepository {
    fn get(&self, name: &str) -> Result<Option<Vec<Relation>>, BridgeError> {
        validate_model_name(name)?;
        let path = self.model_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_relations(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<Model>, BridgeError> {
        if !self.dir.exists() {
            debug!(dir = %self.dir.display(), "models directory does not exist");
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut models = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let relations = Self::read_relations(&path)?;
            models.push(Model::new(name, relations));
        }
        Ok(models)
    }

    fn upsert(&self, name: &str, relations: Vec<Relation>) -> Result<(), BridgeError> {
        validate_model_name(name)?;
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(&relations)?;
        fs::write(self.model_path(name), content)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), BridgeError> {
        validate_model_name(name)?;
        let path = self.model_path(name);
        if !path.is_file() {
            return Err(BridgeError::ModelNotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

fn validate_model_name(name: &str) -> Result<(), BridgeError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(BridgeError::InvalidModelName(name.to_string()));
    }
    Ok(())
}
