//! Three-way property diff between two graphs of identical topology.
//!
//! The merged graph has the structure of `current`; every property carries
//! `[previous, current]` and a marker, every node an aggregate marker.

use crate::error::{DriftError, DriftResult};
use crate::graph::{ComponentGraph, Marker, Property, PropertySet};

/// Check that both graphs sort to the same sequence. Returns that order.
pub fn compare_topology(previous: &ComponentGraph, current: &ComponentGraph) -> DriftResult<Vec<String>> {
    let previous_order = previous.topological_sort()?;
    let current_order = current.topological_sort()?;
    if previous_order != current_order {
        return Err(DriftError::TopologyMismatch {
            previous: previous_order,
            current: current_order,
        });
    }
    Ok(current_order)
}

/// Merge `previous` into `current`, annotating every change.
pub fn merge(previous: &ComponentGraph, current: &ComponentGraph) -> DriftResult<ComponentGraph> {
    let order = compare_topology(previous, current)?;
    let mut merged = current.clone();

    for node_name in &order {
        let before = &previous.node(node_name)?.properties;
        let after = &current.node(node_name)?.properties;
        let properties = merge_properties(node_name, before, after)?;

        let marker = if properties.changed().is_empty() {
            Marker::Noop
        } else {
            Marker::Update
        };

        let node = merged.node_mut(node_name)?;
        node.properties = properties;
        node.marker = marker;

        tracing::debug!(node = %node_name, %marker, "merged node");
    }

    Ok(merged)
}

/// Pair up the property sets of one node.
///
/// Output order: current properties in their own order (kept or created),
/// followed by properties that only existed before (deleted).
fn merge_properties(node: &str, before: &PropertySet, after: &PropertySet) -> DriftResult<PropertySet> {
    let mut out = PropertySet::new();

    // Intersection and current-only.
    for p in after {
        let merged = match before.get(&p.name) {
            Some(prev) => Property::paired(p.name.clone(), Some(prev.current()), Some(p.current())),
            None => Property::paired(p.name.clone(), None, Some(p.current())),
        };
        out.insert(node, merged)?;
    }

    // Previous-only.
    for p in before {
        if after.get(&p.name).is_none() {
            out.insert(node, Property::paired(p.name.clone(), Some(p.current()), None))?;
        }
    }

    Ok(out)
}
