//! Directed dependency graph of named components.
//!
//! Edges point from a dependency to its dependent, so a topological order
//! lists dependencies first. Node insertion order is preserved and drives
//! every tie-break, which makes two structurally identical graphs sort
//! identically.

use crate::error::{DriftError, DriftResult};
use crate::graph::{Marker, Property, PropertySet};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub properties: PropertySet,
    pub marker: Marker,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentGraph {
    nodes: Vec<Node>,
    index: BTreeMap<String, usize>,
    /// dependency -> dependents, in edge insertion order
    outgoing: BTreeMap<String, Vec<String>>,
    /// dependent -> dependencies, in edge insertion order
    incoming: BTreeMap<String, Vec<String>>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) -> DriftResult<()> {
        if self.index.contains_key(name) {
            return Err(DriftError::DuplicateNode(name.to_string()));
        }
        self.index.insert(name.to_string(), self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            properties: PropertySet::new(),
            marker: Marker::Noop,
        });
        self.outgoing.insert(name.to_string(), Vec::new());
        self.incoming.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Record that `dependent` depends on `dependency`. Repeated edges are ignored.
    pub fn add_edge(&mut self, dependency: &str, dependent: &str) -> DriftResult<()> {
        for end in [dependency, dependent] {
            if !self.index.contains_key(end) {
                return Err(DriftError::MissingNode(end.to_string()));
            }
        }

        let dependents = self.outgoing.entry(dependency.to_string()).or_default();
        if dependents.iter().any(|d| d == dependent) {
            return Ok(());
        }
        dependents.push(dependent.to_string());
        self.incoming
            .entry(dependent.to_string())
            .or_default()
            .push(dependency.to_string());
        Ok(())
    }

    pub fn add_property(&mut self, node: &str, property: Property) -> DriftResult<()> {
        let node = self.node_mut(node)?;
        node.properties.insert(&node.name, property)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> DriftResult<&Node> {
        self.index
            .get(name)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| DriftError::MissingNode(name.to_string()))
    }

    pub fn node_mut(&mut self, name: &str) -> DriftResult<&mut Node> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.nodes[i]),
            None => Err(DriftError::MissingNode(name.to_string())),
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Direct dependents of `name`.
    pub fn adjacent(&self, name: &str) -> DriftResult<&[String]> {
        self.outgoing
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DriftError::MissingNode(name.to_string()))
    }

    /// Direct dependencies of `name`.
    pub fn dependencies(&self, name: &str) -> DriftResult<&[String]> {
        self.incoming
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DriftError::MissingNode(name.to_string()))
    }

    pub fn marker(&self, name: &str) -> DriftResult<Marker> {
        Ok(self.node(name)?.marker)
    }

    pub fn set_marker(&mut self, name: &str, marker: Marker) -> DriftResult<()> {
        self.node_mut(name)?.marker = marker;
        Ok(())
    }

    pub fn changed_properties(&self, name: &str) -> DriftResult<Vec<&Property>> {
        Ok(self.node(name)?.properties.changed())
    }

    /// Dependencies before dependents, ties broken by insertion order.
    ///
    /// Kahn's algorithm where the ready node inserted earliest always goes
    /// next. If nodes remain once nothing is ready, a cycle is traced among
    /// them for the error.
    pub fn topological_sort(&self) -> DriftResult<Vec<String>> {
        let mut indegree: Vec<usize> = self
            .nodes
            .iter()
            .map(|n| self.incoming.get(&n.name).map_or(0, Vec::len))
            .collect();
        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(i) = ready.pop_first() {
            let name = &self.nodes[i].name;
            for dependent in self.outgoing.get(name).into_iter().flatten() {
                let j = self.index[dependent];
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    ready.insert(j);
                }
            }
            order.push(name.clone());
        }

        if order.len() < self.nodes.len() {
            return Err(DriftError::Cycle(self.trace_cycle(&indegree)));
        }
        Ok(order)
    }

    /// Find one cycle among the nodes Kahn's algorithm could not release.
    fn trace_cycle(&self, indegree: &[usize]) -> Vec<String> {
        #[derive(Copy, Clone, PartialEq, Eq)]
        enum Mark {
            Temp,
            Perm,
        }

        fn dfs<'g>(
            v: &'g str,
            outgoing: &'g BTreeMap<String, Vec<String>>,
            marks: &mut BTreeMap<&'g str, Mark>,
            stack: &mut Vec<&'g str>,
        ) -> Option<Vec<String>> {
            match marks.get(v) {
                Some(Mark::Perm) => return None,
                Some(Mark::Temp) => {
                    // v is on the current path => cycle
                    let start = stack.iter().position(|s| *s == v).unwrap_or(0);
                    let mut path: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
                    path.push(v.to_string());
                    return Some(path);
                }
                None => {}
            }

            marks.insert(v, Mark::Temp);
            stack.push(v);

            if let Some(kids) = outgoing.get(v) {
                for k in kids {
                    if let Some(path) = dfs(k, outgoing, marks, stack) {
                        return Some(path);
                    }
                }
            }

            stack.pop();
            marks.insert(v, Mark::Perm);
            None
        }

        let mut marks = BTreeMap::<&str, Mark>::new();
        let mut stack = Vec::<&str>::new();
        for (node, _) in self.nodes.iter().zip(indegree).filter(|(_, d)| **d > 0) {
            stack.clear();
            if let Some(path) = dfs(&node.name, &self.outgoing, &mut marks, &mut stack) {
                return path;
            }
        }
        Vec::new()
    }

    /// Every node transitively depending on `name`, excluding `name` itself.
    ///
    /// Pre-order depth-first walk; direct dependents are visited in reverse
    /// adjacency order (last added edge first).
    pub fn downstream(&self, name: &str) -> DriftResult<Vec<String>> {
        let mut stack: Vec<&str> = self.adjacent(name)?.iter().map(String::as_str).collect();
        let mut seen = BTreeSet::<&str>::new();
        let mut out = Vec::new();

        while let Some(v) = stack.pop() {
            if v == name || !seen.insert(v) {
                continue;
            }
            out.push(v.to_string());
            stack.extend(self.adjacent(v)?.iter().map(String::as_str));
        }

        Ok(out)
    }

    /// Baseline to persist after a merge: current values only, deleted
    /// properties dropped, every marker reset.
    pub fn settled(&self) -> ComponentGraph {
        let mut out = self.clone();
        for node in &mut out.nodes {
            node.properties = PropertySet::from_unique(
                node.properties
                    .iter()
                    .filter(|p| p.marker != Marker::Delete)
                    .map(|p| Property::new(p.name.clone(), p.current()))
                    .collect(),
            );
            node.marker = Marker::Noop;
        }
        out
    }
}
