//! Error taxonomy for the graph core.
//!
//! Everything here is fatal for the current run. The CLI wraps these into
//! `anyhow::Error` with file context.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriftError {
    #[error("the component {component} depends on {dependency} which is missing in the list")]
    UnresolvedDependency {
        component: String,
        dependency: String,
    },

    #[error("node not found in graph: {0}")]
    MissingNode(String),

    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("duplicate property '{property}' on node {node}")]
    DuplicateProperty { node: String, property: String },

    #[error("cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error(
        "topologies of model graphs required to be identical (previous: [{}], current: [{}])",
        .previous.join(", "),
        .current.join(", ")
    )]
    TopologyMismatch {
        previous: Vec<String>,
        current: Vec<String>,
    },

    #[error("property '{property}' carries no change and has no operation")]
    InvalidOperation { property: String },

    #[error("cannot resolve reference '{reference}' for {component}.{property}")]
    UnresolvedReference {
        component: String,
        property: String,
        reference: String,
    },

    #[error("component not found in catalog: {0}")]
    UnknownComponent(String),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

pub type DriftResult<T> = std::result::Result<T, DriftError>;
