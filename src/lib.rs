//! Telemetry Bridge - relation-driven normalization of device telemetry
//!
//! Collected raw values are resolved against per-model relation tables,
//! converted into typed values and assembled into telemetry records that are
//! delivered over HTTP: catalog lookup → value conversion → normalization →
//! encoding → resilient delivery.
//!
//! ## Modules
//!
//! - **Catalog**: Relation tables per model, with atomic reloads from a repository
//! - **Normalizer**: Collected values into telemetry records
//! - **Delivery**: Retrying HTTP client with a cooperative stop signal

pub mod catalog;
pub mod config;
pub mod converter;
pub mod delivery;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use catalog::{
    CatalogSnapshot, DirectoryModelRepository, InMemoryModelRepository, ModelRegistry,
    ModelRepository, RelationCatalog,
};
pub use config::BridgeConfig;
pub use converter::convert;
pub use delivery::{ClientOptions, DeliveryClient, RestMethod, StopToken};
pub use diagnostics::{DropCounter, DropObserver, DropReason, DroppedField};
pub use encoder::{JsonEncoder, RecordEncoder};
pub use error::{BridgeError, DeliveryError, DeliveryFailures, MessageFailure};
pub use normalizer::{Grouping, MatchBy, Normalizer};
pub use pipeline::{CollectPipeline, CollectionGenerator, ErrorPolicy, StaticGenerator};

// Schema exports
pub use schema::{DataType, EnumMapping, Model, Relation, SubRelation};

pub use types::{
    CollectBatch, CollectInfo, ComplexValue, Datapoint, Datastream, SubCollectInfo,
    TelemetryRecord, TelemetryValue, RECORD_VERSION,
};

/// Bridge version, reported by the CLI
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");
