//! Component catalog: the live description of every available component.
//!
//! The catalog is loaded once, then only read. Composition picks the
//! requested components out of it and turns them into a [`ComponentGraph`].
//!
//! [`ComponentGraph`]: crate::graph::ComponentGraph

pub mod compose;
pub mod parse;
pub mod resolve;

pub use compose::{compose, compose_components};
pub use parse::{load_catalog, parse_catalog};
pub use resolve::{EnvResolver, PropertyResolver, ReferenceTable, Resolver};

/// One catalog entry. Property values are raw (placeholders not yet expanded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub properties: Vec<(String, String)>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    components: Vec<Component>,
}

impl Catalog {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}
