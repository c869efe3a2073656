//! `salary-predictor` library crate.
//!
//! The binary (`salary`) is a thin wrapper around this library so that:
//!
//! - the encoder, forest, and persistence are testable without spawning processes
//! - serving layers (HTTP handlers, UIs) can embed `inference::Predictor` directly

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod features;
pub mod forest;
pub mod inference;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod report;
