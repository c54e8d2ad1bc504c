use crate::Result;
use crate::catalog::{Catalog, Component};

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Component entry as it appears in the catalog file.
#[derive(Debug, Clone, Deserialize)]
struct RawComponent {
    #[serde(default)]
    properties: RawProperties,

    #[serde(default)]
    dependencies: Vec<String>,
}

/// Properties are written either as a plain mapping or as a list of
/// single-entry mappings (`- version: "8.1"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawProperties {
    Map(Mapping),
    List(Vec<Mapping>),
}

impl Default for RawProperties {
    fn default() -> Self {
        RawProperties::List(Vec::new())
    }
}

/// Load the component catalog (`all_components.yaml`).
///
/// Expected shape:
///
/// TYPO3:
///   properties:
///     - version: "${ref:typo3_version}"
///   dependencies:
///     - PHP
/// PHP:
///   properties:
///     version: "8.1"
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read catalog file {}", path.display()))?;
    parse_catalog(&text).with_context(|| format!("parse catalog file {}", path.display()))
}

/// Parse catalog YAML, keeping components in file order.
pub fn parse_catalog(text: &str) -> Result<Catalog> {
    let doc: Value = serde_yaml::from_str(text)?;
    let top = match doc {
        Value::Mapping(m) => m,
        Value::Null => Mapping::new(),
        other => bail!("catalog must be a mapping of components, found {}", kind(&other)),
    };

    let mut components = Vec::with_capacity(top.len());
    for (key, value) in top {
        let name = match key {
            Value::String(s) => s,
            other => bail!("component names must be strings, found {}", kind(&other)),
        };

        // An entry with no body is a component without properties or dependencies.
        let raw: RawComponent = if value.is_null() {
            RawComponent {
                properties: RawProperties::default(),
                dependencies: Vec::new(),
            }
        } else {
            serde_yaml::from_value(value).with_context(|| format!("component {}", name))?
        };

        let mut properties: Vec<(String, String)> = Vec::new();
        let entries: Vec<Mapping> = match raw.properties {
            RawProperties::Map(m) => vec![m],
            RawProperties::List(list) => list,
        };
        for entry in entries {
            for (k, v) in entry {
                let key = scalar(&k)
                    .with_context(|| format!("property name in component {}", name))?;
                let val = scalar(&v)
                    .with_context(|| format!("property {}.{}", name, key))?;
                // Later entries override earlier ones.
                match properties.iter_mut().find(|(n, _)| *n == key) {
                    Some(slot) => slot.1 = val,
                    None => properties.push((key, val)),
                }
            }
        }

        components.push(Component {
            name,
            properties,
            dependencies: raw.dependencies,
        });
    }

    Ok(Catalog::new(components))
}

fn scalar(v: &Value) -> Result<String> {
    Ok(match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => bail!("expected a scalar value, found {}", kind(other)),
    })
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CATALOG: &str = r#"
TYPO3:
  properties:
    - version: "12.4"
    - site: example.org
  dependencies:
    - PHP
PHP:
  properties:
    version: 8.1
    opcache: true
Redis:
"#;

    #[test]
    fn keeps_file_order_and_flattens_properties() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let names: Vec<&str> = catalog.components().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["TYPO3", "PHP", "Redis"]);

        let typo3 = catalog.get("TYPO3").unwrap();
        assert_eq!(
            typo3.properties,
            vec![
                ("version".to_string(), "12.4".to_string()),
                ("site".to_string(), "example.org".to_string()),
            ]
        );
        assert_eq!(typo3.dependencies, vec!["PHP"]);

        let php = catalog.get("PHP").unwrap();
        assert_eq!(php.properties[0], ("version".to_string(), "8.1".to_string()));
        assert_eq!(php.properties[1], ("opcache".to_string(), "true".to_string()));

        let redis = catalog.get("Redis").unwrap();
        assert!(redis.properties.is_empty());
        assert!(redis.dependencies.is_empty());
    }

    #[test]
    fn later_list_entries_override() {
        let text = "PHP:\n  properties:\n    - version: '7.4'\n    - version: '8.1'\n";
        let catalog = parse_catalog(text).unwrap();
        assert_eq!(
            catalog.get("PHP").unwrap().properties,
            vec![("version".to_string(), "8.1".to_string())]
        );
    }

    #[test]
    fn nested_values_are_rejected() {
        let text = "PHP:\n  properties:\n    ext: [intl, gd]\n";
        let err = parse_catalog(text).unwrap_err();
        assert!(format!("{:#}", err).contains("expected a scalar value"));
    }

    #[test]
    fn top_level_must_be_mapping() {
        assert!(parse_catalog("- PHP\n").is_err());
        assert!(parse_catalog("").unwrap().components().is_empty());
    }
}
