//! Ensemble-of-trees regression.
//!
//! - `params`: hyperparameters and their validation
//! - `tree`: a single variance-reduction regression tree
//! - `ensemble`: the bagged, feature-subsampled forest

pub mod ensemble;
pub mod params;
pub mod tree;

pub use ensemble::*;
pub use params::*;
pub use tree::{Node, NodeId, RegressionTree};
