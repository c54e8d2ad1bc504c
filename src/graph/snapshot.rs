//! Persisted graph state (the previous run's baseline).
//!
//! JSON shape:
//! {
//!   "nodes": [
//!     {
//!       "id": "PHP",
//!       "outgoing": ["TYPO3"],           // dependents
//!       "incoming": [],                  // dependencies
//!       "marker": "noop",
//!       "properties": {
//!         "PHP": [ { "name": "version", "values": ["8.1"], "marker": "noop" } ]
//!       }
//!     },
//!     ...
//!   ]
//! }
//!
//! Node order in the file is the graph's insertion order, so a loaded graph
//! sorts exactly like the one that was saved.

use crate::Result;
use crate::error::{DriftError, DriftResult};
use crate::graph::{ComponentGraph, Marker, Property};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: String,

    #[serde(default)]
    pub outgoing: Vec<String>,

    #[serde(default)]
    pub incoming: Vec<String>,

    #[serde(default)]
    pub marker: Marker,

    #[serde(default)]
    pub properties: BTreeMap<String, Vec<Property>>,
}

impl ComponentGraph {
    pub fn serialize(&self) -> Snapshot {
        let nodes = self
            .nodes()
            .map(|node| {
                let props: Vec<Property> = node.properties.iter().cloned().collect();
                SnapshotNode {
                    id: node.name.clone(),
                    outgoing: self.adjacent(&node.name).map(<[String]>::to_vec).unwrap_or_default(),
                    incoming: self
                        .dependencies(&node.name)
                        .map(<[String]>::to_vec)
                        .unwrap_or_default(),
                    marker: node.marker,
                    properties: BTreeMap::from([(node.name.clone(), props)]),
                }
            })
            .collect();
        Snapshot { nodes }
    }

    /// Rebuild a graph from its transport form.
    ///
    /// Edges are taken from `outgoing`; `incoming` must agree with them.
    pub fn deserialize(snapshot: &Snapshot) -> DriftResult<ComponentGraph> {
        let mut graph = ComponentGraph::new();

        // Phase 1: nodes and their properties.
        for sn in &snapshot.nodes {
            graph.add_node(&sn.id)?;
            graph.set_marker(&sn.id, sn.marker)?;

            if let Some(key) = sn.properties.keys().find(|k| *k != &sn.id) {
                return Err(DriftError::Snapshot(format!(
                    "node {} carries properties keyed by {}",
                    sn.id, key
                )));
            }
            for p in sn.properties.get(&sn.id).into_iter().flatten() {
                if p.values.is_empty() || p.values.len() > 2 {
                    return Err(DriftError::Snapshot(format!(
                        "property {}.{} must hold 1 or 2 values, found {}",
                        sn.id,
                        p.name,
                        p.values.len()
                    )));
                }
                graph.add_property(&sn.id, p.clone())?;
            }
        }

        // Phase 2: edges.
        for sn in &snapshot.nodes {
            for dependent in &sn.outgoing {
                graph.add_edge(&sn.id, dependent)?;
            }
        }

        // Phase 3: incoming lists are redundant; reject files where they drifted.
        for sn in &snapshot.nodes {
            let mut expected = graph.dependencies(&sn.id)?.to_vec();
            let mut found = sn.incoming.clone();
            expected.sort();
            found.sort();
            if expected != found {
                return Err(DriftError::Snapshot(format!(
                    "incoming edges of {} disagree with outgoing edges: [{}] vs [{}]",
                    sn.id,
                    found.join(", "),
                    expected.join(", ")
                )));
            }
        }

        Ok(graph)
    }
}

/// Read a previously saved graph.
pub fn load_graph(path: &Path) -> Result<ComponentGraph> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read state file {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .with_context(|| format!("parse state file {}", path.display()))?;
    let graph = ComponentGraph::deserialize(&snapshot)
        .with_context(|| format!("rebuild graph from {}", path.display()))?;
    tracing::debug!(path = %path.display(), nodes = graph.len(), "loaded previous graph");
    Ok(graph)
}

/// Overwrite `path` with the serialized graph.
pub fn save_graph(path: &Path, graph: &ComponentGraph) -> Result<()> {
    let json = serde_json::to_string_pretty(&graph.serialize())?;
    fs::write(path, json).with_context(|| format!("write state file {}", path.display()))?;
    tracing::info!(path = %path.display(), nodes = graph.len(), "saved graph state");
    Ok(())
}
