//! Component graph drift detection and rollout impact analysis.
//!
//! - [`catalog::compose`] builds the current graph from the component catalog.
//! - [`diff::merge`] pairs it with the previous graph and marks every change.
//! - [`impact::find_affected_nodes`] / [`impact::plan`] find the dependents
//!   whose routines react to those changes.

pub mod catalog;
pub mod diff;
pub mod error;
pub mod graph;
pub mod impact;
pub mod report;
pub mod routine;

pub use error::{DriftError, DriftResult};

pub type Result<T> = anyhow::Result<T>;
