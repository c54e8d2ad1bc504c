use crate::catalog::{Catalog, Component, Resolver};
use crate::error::{DriftError, DriftResult};
use crate::graph::{ComponentGraph, Property};

use std::collections::BTreeSet;

/// Build the current graph from the catalog entries named in `names`.
///
/// Components keep catalog order. An empty selection means the whole catalog.
pub fn compose(catalog: &Catalog, names: &[String], resolver: &Resolver) -> DriftResult<ComponentGraph> {
    if names.is_empty() {
        return compose_components(catalog.components(), resolver);
    }

    for n in names {
        if catalog.get(n).is_none() {
            return Err(DriftError::UnknownComponent(n.clone()));
        }
    }
    let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    let selected: Vec<Component> = catalog
        .components()
        .iter()
        .filter(|c| wanted.contains(c.name.as_str()))
        .cloned()
        .collect();

    compose_components(&selected, resolver)
}

/// Build a graph from a flat component list.
///
/// Every dependency must itself be in the list.
pub fn compose_components(components: &[Component], resolver: &Resolver) -> DriftResult<ComponentGraph> {
    let mut graph = ComponentGraph::new();

    // Phase 1: nodes with resolved property values.
    for c in components {
        graph.add_node(&c.name)?;
        for (name, raw) in &c.properties {
            let value = resolver.expand(&c.name, name, raw)?;
            graph.add_property(&c.name, Property::new(name.clone(), value))?;
        }
    }

    // Phase 2: dependency edges.
    for c in components {
        for dependency in &c.dependencies {
            if !graph.contains(dependency) {
                return Err(DriftError::UnresolvedDependency {
                    component: c.name.clone(),
                    dependency: dependency.clone(),
                });
            }
            tracing::debug!("setting edge from {} to {}", dependency, c.name);
            graph.add_edge(dependency, &c.name)?;
        }
    }

    Ok(graph)
}
