//! Change report: combine the merged graph with the impact plan.

pub mod text;

pub use text::render_text_report;

use crate::Result;
use crate::graph::{ComponentGraph, Marker};
use crate::impact::{NodeImpact, PlannedRoutine};

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct PropertyChangeView {
    pub name: String,
    pub marker: Marker,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub name: String,
    pub marker: Marker,
    pub dependencies: Vec<String>,
    pub changes: Vec<PropertyChangeView>,

    /// Downstream nodes with a routine reacting to this node's changes.
    pub affected: Vec<String>,
    pub routines: Vec<PlannedRoutine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub nodes: usize,
    pub changed_nodes: usize,
    pub changed_properties: usize,
    pub routines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    /// Nodes in topological order.
    pub nodes: Vec<NodeView>,
    pub totals: TotalsView,
}

/// Build report data from a merged graph and its impact plan.
///
/// With `only` set, the report covers that single node.
pub fn build_report_data(
    merged: &ComponentGraph,
    impacts: &[NodeImpact],
    only: Option<&str>,
) -> Result<ReportData> {
    let order = match only {
        Some(name) => vec![merged.node(name)?.name.clone()],
        None => merged.topological_sort()?,
    };
    let by_origin: BTreeMap<&str, &NodeImpact> =
        impacts.iter().map(|i| (i.origin.as_str(), i)).collect();

    let mut nodes = Vec::with_capacity(merged.len());
    let mut changed_properties = 0usize;
    let mut routines = 0usize;

    for name in order {
        let node = merged.node(&name)?;
        let changes: Vec<PropertyChangeView> = node
            .properties
            .changed()
            .into_iter()
            .map(|p| PropertyChangeView {
                name: p.name.clone(),
                marker: p.marker,
                before: p.previous().to_string(),
                after: p.current().to_string(),
            })
            .collect();
        changed_properties += changes.len();

        let (affected, planned) = match by_origin.get(name.as_str()) {
            Some(i) => (i.affected.clone(), i.routines.clone()),
            None => (Vec::new(), Vec::new()),
        };
        routines += planned.len();

        nodes.push(NodeView {
            dependencies: merged.dependencies(&name)?.to_vec(),
            marker: node.marker,
            name,
            changes,
            affected,
            routines: planned,
        });
    }

    Ok(ReportData {
        totals: TotalsView {
            nodes: nodes.len(),
            changed_nodes: nodes.iter().filter(|n| n.marker.is_change()).count(),
            changed_properties,
            routines,
        },
        nodes,
    })
}

pub fn render_json_report(data: &ReportData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::merge;
    use crate::graph::Property;
    use crate::impact::plan;
    use crate::routine::{Operation, Routine, RoutineRegistry};
    use pretty_assertions::assert_eq;

    fn graph(version: &str, extra: Option<&str>) -> ComponentGraph {
        let mut g = ComponentGraph::new();
        g.add_node("TYPO3").unwrap();
        g.add_node("PHP").unwrap();
        g.add_edge("PHP", "TYPO3").unwrap();
        g.add_property("PHP", Property::new("version", version)).unwrap();
        if let Some(v) = extra {
            g.add_property("TYPO3", Property::new("site", v)).unwrap();
        }
        g
    }

    fn report() -> ReportData {
        let merged = merge(&graph("7.4", Some("a.org")), &graph("8.1", None)).unwrap();
        let mut reg = RoutineRegistry::new();
        reg.register(
            "TYPO3",
            Routine::new("php-version-update", Operation::Update, ["version"]).with_context("PHP"),
        );
        let impacts = plan(&merged, &reg).unwrap();
        build_report_data(&merged, &impacts, None).unwrap()
    }

    #[test]
    fn report_follows_topological_order() {
        let data = report();
        let names: Vec<&str> = data.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["PHP", "TYPO3"]);
        assert_eq!(data.nodes[0].affected, vec!["TYPO3"]);
        assert_eq!(data.nodes[1].dependencies, vec!["PHP"]);
        assert_eq!(data.totals.changed_nodes, 2);
        assert_eq!(data.totals.changed_properties, 2);
        assert_eq!(data.totals.routines, 1);
    }

    #[test]
    fn report_can_cover_one_node() {
        let merged = merge(&graph("7.4", None), &graph("8.1", None)).unwrap();
        let data = build_report_data(&merged, &[], Some("TYPO3")).unwrap();
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].name, "TYPO3");
        assert!(data.nodes[0].changes.is_empty());
        assert_eq!(data.totals.nodes, 1);
        assert_eq!(data.totals.changed_nodes, 0);

        let err = build_report_data(&merged, &[], Some("Redis")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<crate::DriftError>(),
            Some(&crate::DriftError::MissingNode("Redis".into()))
        );
    }

    #[test]
    fn json_uses_lowercase_markers() {
        let json = render_json_report(&report()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["nodes"][0]["marker"], "update");
        assert_eq!(v["nodes"][1]["changes"][0]["marker"], "delete");
        assert_eq!(v["nodes"][1]["changes"][0]["before"], "a.org");
    }
}
