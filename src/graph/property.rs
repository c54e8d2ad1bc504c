use crate::error::{DriftError, DriftResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Change classification shared by properties and nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    Noop,
    Create,
    Update,
    Delete,
}

impl Marker {
    pub fn is_change(self) -> bool {
        self != Marker::Noop
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Marker::Noop => "NOOP",
            Marker::Create => "CREATE",
            Marker::Update => "UPDATE",
            Marker::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named value attached to a node.
///
/// `values` holds one entry before a merge and `[previous, current]` after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub marker: Marker,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
            marker: Marker::Noop,
        }
    }

    /// Build a merged property from its two sides. The marker is derived from them.
    pub fn paired(name: impl Into<String>, previous: Option<&str>, current: Option<&str>) -> Self {
        let marker = match (previous, current) {
            (Some(p), Some(c)) if p == c => Marker::Noop,
            (Some(_), Some(_)) => Marker::Update,
            (None, Some(_)) => Marker::Create,
            (Some(_), None) => Marker::Delete,
            (None, None) => Marker::Noop,
        };
        Self {
            name: name.into(),
            values: vec![
                previous.unwrap_or_default().to_string(),
                current.unwrap_or_default().to_string(),
            ],
            marker,
        }
    }

    /// Latest observed value. For a merged property this is the right-hand side.
    pub fn current(&self) -> &str {
        self.values.last().map(String::as_str).unwrap_or_default()
    }

    /// Left-hand side of a merged property, or the only value otherwise.
    pub fn previous(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or_default()
    }
}

/// Ordered list of properties with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet(Vec<Property>);

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap properties already known to have unique names.
    pub(crate) fn from_unique(properties: Vec<Property>) -> Self {
        Self(properties)
    }

    /// Append a property. Names are unique within a node.
    pub fn insert(&mut self, node: &str, property: Property) -> DriftResult<()> {
        if self.get(&property.name).is_some() {
            return Err(DriftError::DuplicateProperty {
                node: node.to_string(),
                property: property.name,
            });
        }
        self.0.push(property);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn changed(&self) -> Vec<&Property> {
        self.0.iter().filter(|p| p.marker.is_change()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paired_marker_follows_sides() {
        assert_eq!(Property::paired("v", Some("1"), Some("1")).marker, Marker::Noop);
        assert_eq!(Property::paired("v", Some("1"), Some("2")).marker, Marker::Update);
        assert_eq!(Property::paired("v", None, Some("2")).marker, Marker::Create);
        assert_eq!(Property::paired("v", Some("1"), None).marker, Marker::Delete);

        let deleted = Property::paired("legacy", Some("y"), None);
        assert_eq!(deleted.values, vec!["y".to_string(), String::new()]);
        assert_eq!(deleted.previous(), "y");
        assert_eq!(deleted.current(), "");
    }

    #[test]
    fn duplicate_property_is_rejected() {
        let mut set = PropertySet::new();
        set.insert("PHP", Property::new("version", "7.4")).unwrap();
        let err = set.insert("PHP", Property::new("version", "8.1")).unwrap_err();
        assert_eq!(
            err,
            DriftError::DuplicateProperty {
                node: "PHP".into(),
                property: "version".into()
            }
        );
        assert_eq!(set.names(), vec!["version"]);
    }

    #[test]
    fn marker_serializes_lowercase() {
        let json = serde_json::to_string(&Marker::Update).unwrap();
        assert_eq!(json, "\"update\"");
    }
}
