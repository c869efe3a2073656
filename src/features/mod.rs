//! Feature encoding: numeric passthrough plus one-hot blocks over frozen
//! vocabularies.

pub mod transformer;
pub mod vocabulary;

pub use transformer::*;
pub use vocabulary::*;

/// A fixed-width numeric row as produced by `FeatureTransformer::transform`.
pub type FeatureVector = Vec<f64>;
