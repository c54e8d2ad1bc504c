use crate::report::ReportData;

/// Render the report as plain text, one block per node:
///
/// [UPDATE] Node PHP:
/// - [UPDATE] version: '7.4' => '8.1'
///   affected: TYPO3
///   routine: TYPO3/php-version-update (manual) on version
pub fn render_text_report(data: &ReportData) -> String {
    let mut out = String::new();

    for node in &data.nodes {
        out.push_str(&format!("[{}] Node {}:\n", node.marker, node.name));
        if node.changes.is_empty() {
            out.push_str("- No changes\n");
            continue;
        }
        for c in &node.changes {
            out.push_str(&format!(
                "- [{}] {}: '{}' => '{}'\n",
                c.marker, c.name, c.before, c.after
            ));
        }
        if !node.affected.is_empty() {
            out.push_str(&format!("  affected: {}\n", node.affected.join(", ")));
        }
        for r in &node.routines {
            out.push_str(&format!(
                "  routine: {}/{} ({}) on {}\n",
                r.node,
                r.routine,
                r.execution,
                r.properties.join(", ")
            ));
        }
    }

    let t = &data.totals;
    out.push_str(&format!(
        "{} of {} nodes changed, {} properties, {} routines\n",
        t.changed_nodes, t.nodes, t.changed_properties, t.routines
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Marker;
    use crate::impact::PlannedRoutine;
    use crate::report::{NodeView, PropertyChangeView, TotalsView};
    use crate::routine::ExecutionMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_changes_and_impact() {
        let data = ReportData {
            nodes: vec![
                NodeView {
                    name: "PHP".into(),
                    marker: Marker::Update,
                    dependencies: vec![],
                    changes: vec![PropertyChangeView {
                        name: "version".into(),
                        marker: Marker::Update,
                        before: "7.4".into(),
                        after: "8.1".into(),
                    }],
                    affected: vec!["TYPO3".into()],
                    routines: vec![PlannedRoutine {
                        node: "TYPO3".into(),
                        routine: "php-version-update".into(),
                        execution: ExecutionMode::Manual,
                        origin: "PHP".into(),
                        properties: vec!["version".into()],
                    }],
                },
                NodeView {
                    name: "TYPO3".into(),
                    marker: Marker::Noop,
                    dependencies: vec!["PHP".into()],
                    changes: vec![],
                    affected: vec![],
                    routines: vec![],
                },
            ],
            totals: TotalsView {
                nodes: 2,
                changed_nodes: 1,
                changed_properties: 1,
                routines: 1,
            },
        };

        let expected = "\
[UPDATE] Node PHP:
- [UPDATE] version: '7.4' => '8.1'
  affected: TYPO3
  routine: TYPO3/php-version-update (manual) on version
[NOOP] Node TYPO3:
- No changes
1 of 2 nodes changed, 1 properties, 1 routines
";
        assert_eq!(render_text_report(&data), expected);
    }
}
