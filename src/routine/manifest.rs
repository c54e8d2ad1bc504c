//! Routine manifest (routines.yaml): declares which routines each node owns.
//!
//! YAML shape:
//!
//! TYPO3:
//!   - name: php-version-update
//!     operation: update        # create | update | delete
//!     properties: [version]
//!     execution: manual        # manual | automated | deployment (default manual)
//!     context: PHP             # optional; omitted = any triggering node
//!
//! Manifest routines carry no action. Actions are attached in code.

use crate::Result;
use crate::routine::{ExecutionMode, Operation, Routine, RoutineRegistry};

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRoutine {
    name: String,

    operation: Operation,

    #[serde(default)]
    properties: Vec<String>,

    #[serde(default)]
    execution: ExecutionMode,

    #[serde(default)]
    context: Option<String>,
}

pub fn load_manifest(path: &Path) -> Result<RoutineRegistry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read routine manifest {}", path.display()))?;
    parse_manifest(&text).with_context(|| format!("parse routine manifest {}", path.display()))
}

pub fn parse_manifest(text: &str) -> Result<RoutineRegistry> {
    let raw: Option<BTreeMap<String, Vec<RawRoutine>>> = serde_yaml::from_str(text)?;

    let mut registry = RoutineRegistry::new();
    for (node, routines) in raw.unwrap_or_default() {
        for r in routines {
            if r.properties.is_empty() {
                bail!("routine {} on {} watches no properties", r.name, node);
            }
            if r.context.as_deref().is_some_and(str::is_empty) {
                bail!("routine {} on {} has an empty context", r.name, node);
            }
            let mut routine = Routine::new(&r.name, r.operation, r.properties)
                .with_execution(r.execution);
            routine.context = r.context;
            registry.register(&node, routine);
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::RoutineProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_routines_per_node() {
        let reg = parse_manifest(
            r#"
TYPO3:
  - name: php-version-update
    operation: update
    properties: [version]
    context: PHP
PHP:
  - name: version-update
    operation: update
    properties: [version]
    execution: automated
"#,
        )
        .unwrap();

        let typo3 = &reg.routines("TYPO3")[0];
        assert_eq!(typo3.operation, Operation::Update);
        assert_eq!(typo3.execution, ExecutionMode::Manual);
        assert_eq!(typo3.context.as_deref(), Some("PHP"));
        assert!(typo3.properties.contains("version"));

        let php = &reg.routines("PHP")[0];
        assert_eq!(php.execution, ExecutionMode::Automated);
        assert_eq!(php.context, None);
    }

    #[test]
    fn empty_manifest_is_empty_registry() {
        assert!(parse_manifest("").unwrap().is_empty());
    }

    #[test]
    fn rejects_routine_without_properties() {
        let err = parse_manifest("PHP:\n  - name: x\n    operation: create\n").unwrap_err();
        assert!(err.to_string().contains("watches no properties"));
    }

    #[test]
    fn rejects_empty_context() {
        let err = parse_manifest(
            "TYPO3:\n  - name: x\n    operation: update\n    properties: [version]\n    context: ''\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("has an empty context"));
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(parse_manifest("PHP:\n  - name: x\n    operation: noop\n    properties: [v]\n").is_err());
    }
}
