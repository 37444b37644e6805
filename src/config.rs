//! Bridge configuration
//!
//! Read from TOML. Every section and field is optional:
//!
//! ```toml
//! models_dir = "models"
//!
//! [delivery]
//! url = "https://ingest.example.com/collect"
//! method = "POST"
//! max_retries = 2
//! retry_delay_ms = 500
//!
//! [normalizer]
//! grouping = "simple"
//! match_by = "alias"
//! error_policy = "fail_fast"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::RelationCatalog;
use crate::delivery::ClientOptions;
use crate::error::BridgeError;
use crate::normalizer::{Grouping, MatchBy, Normalizer};
use crate::pipeline::{CollectPipeline, ErrorPolicy};

pub const DEFAULT_MODELS_DIR: &str = "models";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory holding one `<model>.json` relation file per model
    pub models_dir: PathBuf,
    pub delivery: ClientOptions,
    pub normalizer: NormalizerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub grouping: Grouping,
    pub match_by: MatchBy,
    pub error_policy: ErrorPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            delivery: ClientOptions::default(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, BridgeError> {
        toml::from_str(content).map_err(|e| BridgeError::ConfigError(e.to_string()))
    }

    /// Load a config file; relative `models_dir` paths resolve against the
    /// file's directory
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::ConfigError(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml_str(&content)?;
        if config.models_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.models_dir = parent.join(&config.models_dir);
            }
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, BridgeError> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::ConfigError(e.to_string()))
    }

    pub fn normalizer(&self, catalog: Arc<RelationCatalog>) -> Normalizer {
        Normalizer::new(catalog)
            .with_grouping(self.normalizer.grouping)
            .with_match_by(self.normalizer.match_by)
    }

    /// Pipeline without a generator; callers attach their own
    pub fn pipeline(&self, catalog: Arc<RelationCatalog>) -> CollectPipeline {
        CollectPipeline::new(self.normalizer(catalog), self.delivery.clone())
            .with_policy(self.normalizer.error_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::RestMethod;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.normalizer.grouping, Grouping::Grouped);
        assert_eq!(config.normalizer.error_policy, ErrorPolicy::Resilient);
    }

    #[test]
    fn test_full_config() {
        let config = BridgeConfig::from_toml_str(
            r#"
            models_dir = "/etc/bridge/models"

            [delivery]
            url = "https://ingest.example.com/collect"
            method = "PUT"
            api_key = "key"
            api_pass = "pass"
            max_retries = 2
            retry_delay_ms = 500
            timeout_ms = 1000

            [delivery.headers]
            X-Tenant = "acme"

            [normalizer]
            grouping = "simple"
            match_by = "alias"
            error_policy = "fail_fast"
            "#,
        )
        .unwrap();

        assert_eq!(config.models_dir, PathBuf::from("/etc/bridge/models"));
        assert_eq!(config.delivery.method, RestMethod::Put);
        assert_eq!(config.delivery.max_retries, 2);
        assert_eq!(config.delivery.retry_delay(), Duration::from_millis(500));
        assert_eq!(config.delivery.timeout(), Duration::from_secs(1));
        assert_eq!(config.delivery.headers.get("X-Tenant").unwrap(), "acme");
        assert_eq!(config.normalizer.grouping, Grouping::Simple);
        assert_eq!(config.normalizer.match_by, MatchBy::Alias);
        assert_eq!(config.normalizer.error_policy, ErrorPolicy::FailFast);
    }

    #[test]
    fn test_invalid_config() {
        let err = BridgeConfig::from_toml_str("[normalizer]\ngrouping = \"sideways\"").unwrap_err();
        assert!(matches!(err, BridgeError::ConfigError(_)));
    }

    #[test]
    fn test_relative_models_dir_follows_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "models_dir = \"relations\"").unwrap();

        let config = BridgeConfig::from_file(&path).unwrap();

        assert_eq!(config.models_dir, dir.path().join("relations"));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = BridgeConfig::default();
        config.delivery.url = "http://localhost:8080".to_string();
        config.normalizer.error_policy = ErrorPolicy::FailFast;

        let text = config.to_toml_string().unwrap();

        assert_eq!(BridgeConfig::from_toml_str(&text).unwrap(), config);
    }
}
