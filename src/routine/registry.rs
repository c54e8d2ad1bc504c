use crate::routine::Routine;
use std::collections::BTreeMap;

/// Source of routines for a node. Lookups never fail: an unknown node simply
/// has no routines.
pub trait RoutineProvider {
    fn routines(&self, node: &str) -> &[Routine];
}

/// Routines keyed by owning node, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RoutineRegistry {
    by_node: BTreeMap<String, Vec<Routine>>,
}

impl RoutineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: &str, routine: Routine) {
        self.by_node.entry(node.to_string()).or_default().push(routine);
    }

    /// Nodes that own at least one routine.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.by_node.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_node.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RoutineProvider for RoutineRegistry {
    fn routines(&self, node: &str) -> &[Routine] {
        self.by_node.get(node).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::Operation;
    use pretty_assertions::assert_eq;

    #[test]
    fn routines_keep_registration_order() {
        let mut reg = RoutineRegistry::new();
        reg.register("TYPO3", Routine::new("first", Operation::Update, ["version"]));
        reg.register("TYPO3", Routine::new("second", Operation::Delete, ["version"]));
        reg.register("PHP", Routine::new("own", Operation::Update, ["version"]));

        let names: Vec<&str> = reg.routines("TYPO3").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.nodes().collect::<Vec<_>>(), vec!["PHP", "TYPO3"]);
        assert!(reg.routines("Redis").is_empty());
    }
}
