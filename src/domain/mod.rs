//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the shared field schema (`Field`, `FieldKind`)
//! - typed and raw records (`Record`, `RawRecord`)
//! - labeled training data (`Dataset`)
//! - run configuration (`TrainConfig`, `UnknownCategoryPolicy`)

pub mod dataset;
pub mod record;
pub mod schema;
pub mod types;

pub use dataset::*;
pub use record::*;
pub use schema::*;
pub use types::*;
