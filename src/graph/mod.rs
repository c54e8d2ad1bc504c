//! Graph layer: properties, change markers, the component graph, and its
//! persisted form.

pub mod component;
pub mod property;
pub mod snapshot;

pub use component::{ComponentGraph, Node};
pub use property::{Marker, Property, PropertySet};
