//! Affected-node resolution and routine planning over a merged graph.

use crate::Result;
use crate::error::{DriftError, DriftResult};
use crate::graph::{ComponentGraph, Property};
use crate::routine::{ExecutionMode, Routine, RoutineProvider};

use anyhow::Context;
use serde::Serialize;

/// Nodes downstream of `node` with a routine reacting to any of `changes`.
///
/// Result order is the visit order of [`ComponentGraph::downstream`].
pub fn find_affected_nodes(
    graph: &ComponentGraph,
    provider: &dyn RoutineProvider,
    node: &str,
    changes: &[Property],
) -> DriftResult<Vec<String>> {
    // NOOP properties have no operation; reject them before touching routines.
    if let Some(p) = changes.iter().find(|p| !p.marker.is_change()) {
        return Err(DriftError::InvalidOperation {
            property: p.name.clone(),
        });
    }

    let mut affected = Vec::new();
    for candidate in graph.downstream(node)? {
        if first_match(provider.routines(&candidate), node, changes)?.is_some() {
            affected.push(candidate);
        }
    }

    tracing::debug!(origin = %node, affected = ?affected, "resolved affected nodes");
    Ok(affected)
}

/// First routine that any change triggers. Stops at the first hit.
fn first_match<'r>(routines: &'r [Routine], origin: &str, changes: &[Property]) -> DriftResult<Option<&'r Routine>> {
    for routine in routines {
        for p in changes {
            if routine.matches(origin, p)? {
                return Ok(Some(routine));
            }
        }
    }
    Ok(None)
}

/// One routine that has to run because of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRoutine {
    /// Node owning the routine.
    pub node: String,
    pub routine: String,
    pub execution: ExecutionMode,
    /// Node whose change triggered it.
    pub origin: String,
    /// Names of the triggering properties.
    pub properties: Vec<String>,
}

/// Impact of one changed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeImpact {
    pub origin: String,
    pub affected: Vec<String>,
    pub routines: Vec<PlannedRoutine>,
}

/// Walk the merged graph in topological order and collect, for every changed
/// node, the affected downstream nodes and every routine to run.
pub fn plan(graph: &ComponentGraph, provider: &dyn RoutineProvider) -> DriftResult<Vec<NodeImpact>> {
    let mut out = Vec::new();
    for origin in graph.topological_sort()? {
        if let Some(impact) = impact_of(graph, provider, &origin)? {
            out.push(impact);
        }
    }
    Ok(out)
}

/// Impact of the changes recorded on `origin` in a merged graph.
///
/// `None` when the node carries no changes. A node's own routines take part
/// too when their context is unset or names the node itself; they are listed
/// before downstream routines.
pub fn impact_of(
    graph: &ComponentGraph,
    provider: &dyn RoutineProvider,
    origin: &str,
) -> DriftResult<Option<NodeImpact>> {
    let changes: Vec<Property> = graph
        .changed_properties(origin)?
        .into_iter()
        .cloned()
        .collect();
    if changes.is_empty() {
        return Ok(None);
    }

    let affected = find_affected_nodes(graph, provider, origin, &changes)?;

    let mut routines = Vec::new();
    for owner in std::iter::once(origin).chain(affected.iter().map(String::as_str)) {
        for routine in provider.routines(owner) {
            let mut triggering = Vec::new();
            for p in &changes {
                if routine.matches(origin, p)? {
                    triggering.push(p.name.clone());
                }
            }
            if triggering.is_empty() {
                continue;
            }
            routines.push(PlannedRoutine {
                node: owner.to_string(),
                routine: routine.name.clone(),
                execution: routine.execution,
                origin: origin.to_string(),
                properties: triggering,
            });
        }
    }

    tracing::info!(
        origin = %origin,
        changes = changes.len(),
        affected = affected.len(),
        routines = routines.len(),
        "node changed"
    );

    Ok(Some(NodeImpact {
        origin: origin.to_string(),
        affected,
        routines,
    }))
}

/// Run the actions of `automated` routines in plan order. Returns how many ran.
///
/// Manual and deployment routines are left to the operator.
pub fn execute_automated(
    graph: &ComponentGraph,
    provider: &dyn RoutineProvider,
    impacts: &[NodeImpact],
) -> Result<usize> {
    let mut ran = 0;
    for impact in impacts {
        for planned in impact
            .routines
            .iter()
            .filter(|r| r.execution == ExecutionMode::Automated)
        {
            let Some(routine) = provider
                .routines(&planned.node)
                .iter()
                .find(|r| r.name == planned.routine)
            else {
                continue;
            };
            let Some(action) = &routine.action else {
                tracing::warn!(node = %planned.node, routine = %planned.routine, "automated routine has no action");
                continue;
            };

            let origin = graph.node(&planned.origin)?;
            let triggering: Vec<Property> = planned
                .properties
                .iter()
                .filter_map(|name| origin.properties.get(name).cloned())
                .collect();

            action(&triggering).with_context(|| {
                format!(
                    "routine {} on {} (triggered by {})",
                    planned.routine, planned.node, planned.origin
                )
            })?;
            ran += 1;
        }
    }
    Ok(ran)
}
