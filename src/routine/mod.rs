//! Change handlers ("routines") registered against nodes.
//!
//! A routine says: when `context` changes one of `properties` with
//! `operation`, the node owning this routine has to react. Routines are plain
//! records plus an optional action; there is no routine type hierarchy.

pub mod manifest;
pub mod registry;

pub use manifest::{load_manifest, parse_manifest};
pub use registry::{RoutineProvider, RoutineRegistry};

use crate::error::{DriftError, DriftResult};
use crate::graph::{Marker, Property};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Operation a property change calls for. NOOP has none.
    pub fn from_marker(marker: Marker, property: &str) -> DriftResult<Operation> {
        match marker {
            Marker::Create => Ok(Operation::Create),
            Marker::Update => Ok(Operation::Update),
            Marker::Delete => Ok(Operation::Delete),
            Marker::Noop => Err(DriftError::InvalidOperation {
                property: property.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Manual,
    Automated,
    Deployment,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionMode::Manual => "manual",
            ExecutionMode::Automated => "automated",
            ExecutionMode::Deployment => "deployment",
        })
    }
}

/// Callback run for `automated` routines. Receives the triggering properties.
pub type RoutineAction = Arc<dyn Fn(&[Property]) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct Routine {
    pub name: String,
    pub operation: Operation,
    pub properties: BTreeSet<String>,
    pub execution: ExecutionMode,
    /// Node whose changes trigger this routine. `None` reacts to any node.
    pub context: Option<String>,
    pub action: Option<RoutineAction>,
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routine")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .field("properties", &self.properties)
            .field("execution", &self.execution)
            .field("context", &self.context)
            .field("action", &self.action.as_ref().map(|_| "Some(fn)"))
            .finish()
    }
}

impl Routine {
    pub fn new<I, S>(name: &str, operation: Operation, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            operation,
            properties: properties.into_iter().map(Into::into).collect(),
            execution: ExecutionMode::Manual,
            context: None,
            action: None,
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&[Property]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn accepts_context(&self, origin: &str) -> bool {
        self.context.as_deref().is_none_or(|c| c == origin)
    }

    /// Whether a change to `property` on node `origin` triggers this routine.
    pub fn matches(&self, origin: &str, property: &Property) -> DriftResult<bool> {
        let operation = Operation::from_marker(property.marker, &property.name)?;
        Ok(operation == self.operation
            && self.properties.contains(&property.name)
            && self.accepts_context(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(name: &str) -> Property {
        Property::paired(name, Some("7.4"), Some("8.1"))
    }

    #[test]
    fn matches_operation_property_and_context() {
        let r = Routine::new("php-version", Operation::Update, ["version"]).with_context("PHP");
        assert!(r.matches("PHP", &update("version")).unwrap());
        assert!(!r.matches("MySQL", &update("version")).unwrap());
        assert!(!r.matches("PHP", &update("memory")).unwrap());

        let created = Property::paired("version", None, Some("8.1"));
        assert!(!r.matches("PHP", &created).unwrap());
    }

    #[test]
    fn context_is_exact() {
        let r = Routine::new("php-version", Operation::Update, ["version"]).with_context("PHP");
        assert!(!r.matches("PHP-FPM", &update("version")).unwrap());
        assert!(!r.matches("php", &update("version")).unwrap());
    }

    #[test]
    fn missing_context_accepts_any_node() {
        let r = Routine::new("any-version", Operation::Update, ["version"]);
        assert!(r.matches("PHP", &update("version")).unwrap());
        assert!(r.matches("Nginx", &update("version")).unwrap());
    }

    #[test]
    fn noop_property_is_a_contract_error() {
        let r = Routine::new("any", Operation::Update, ["version"]);
        let unchanged = Property::paired("version", Some("8.1"), Some("8.1"));
        assert_eq!(
            r.matches("PHP", &unchanged).unwrap_err(),
            DriftError::InvalidOperation {
                property: "version".into()
            }
        );
    }
}
