//! Relation model schema
//!
//! Declarative definitions that drive normalization: one model per device
//! family, holding the relations that map device fields onto datastreams.

mod data_type;
mod relation;

pub use data_type::*;
pub use relation::*;
