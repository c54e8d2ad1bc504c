//! Property-reference resolution.
//!
//! Catalog values may embed `${scheme:key}` placeholders. Each scheme maps to a
//! [`PropertyResolver`]; `env` is always available, `ref` is backed by a
//! reference table when one is configured. A placeholder nobody can satisfy
//! is an error, never an empty string.

use crate::Result;
use crate::error::{DriftError, DriftResult};

use anyhow::Context;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

const PLACEHOLDER_RE: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*):([^}]*)\}";

pub trait PropertyResolver {
    /// Look up a single reference. `None` means unknown.
    fn resolve(&self, reference: &str) -> Option<String>;
}

/// Fixed reference -> value table, usually loaded from a YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable(BTreeMap<String, String>);

impl ReferenceTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read reference table {}", path.display()))?;
        let entries: BTreeMap<String, String> = serde_yaml::from_str(&text)
            .with_context(|| format!("parse reference table {}", path.display()))?;
        Ok(Self(entries))
    }
}

impl PropertyResolver for ReferenceTable {
    fn resolve(&self, reference: &str) -> Option<String> {
        self.0.get(reference).cloned()
    }
}

/// Reads references from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvResolver;

impl PropertyResolver for EnvResolver {
    fn resolve(&self, reference: &str) -> Option<String> {
        std::env::var(reference).ok()
    }
}

/// Expands placeholders in raw catalog values.
pub struct Resolver {
    pattern: Regex,
    schemes: BTreeMap<String, Box<dyn PropertyResolver>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("schemes", &self.schemes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Resolver {
    /// Resolver with only the `env` scheme registered.
    pub fn new() -> Result<Self> {
        let mut schemes: BTreeMap<String, Box<dyn PropertyResolver>> = BTreeMap::new();
        schemes.insert("env".to_string(), Box::new(EnvResolver));
        Ok(Self {
            pattern: Regex::new(PLACEHOLDER_RE)?,
            schemes,
        })
    }

    pub fn with_scheme(mut self, scheme: &str, resolver: impl PropertyResolver + 'static) -> Self {
        self.schemes.insert(scheme.to_string(), Box::new(resolver));
        self
    }

    /// Expand every placeholder in `raw`. Text outside placeholders is kept as is.
    pub fn expand(&self, component: &str, property: &str, raw: &str) -> DriftResult<String> {
        let mut out = String::with_capacity(raw.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(raw) {
            // Group 0 always exists for a match.
            let Some(whole) = caps.get(0) else { continue };
            let scheme = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let key = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            let value = self
                .schemes
                .get(scheme)
                .and_then(|r| r.resolve(key))
                .ok_or_else(|| DriftError::UnresolvedReference {
                    component: component.to_string(),
                    property: property.to_string(),
                    reference: whole.as_str().to_string(),
                })?;

            out.push_str(&raw[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }

        out.push_str(&raw[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> Resolver {
        let table = ReferenceTable::new(BTreeMap::from([
            ("some-reference".to_string(), "test1".to_string()),
            ("some-reference2".to_string(), "test2".to_string()),
        ]));
        Resolver::new().unwrap().with_scheme("ref", table)
    }

    #[test]
    fn literal_values_pass_through() {
        assert_eq!(resolver().expand("PHP", "version", "8.1").unwrap(), "8.1");
        assert_eq!(resolver().expand("PHP", "empty", "").unwrap(), "");
    }

    #[test]
    fn placeholders_are_substituted() {
        let r = resolver();
        assert_eq!(r.expand("PHP", "v", "${ref:some-reference}").unwrap(), "test1");
        assert_eq!(
            r.expand("PHP", "v", "a-${ref:some-reference}-${ref:some-reference2}")
                .unwrap(),
            "a-test1-test2"
        );
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let err = resolver()
            .expand("PHP", "version", "${ref:nope}")
            .unwrap_err();
        assert_eq!(
            err,
            DriftError::UnresolvedReference {
                component: "PHP".into(),
                property: "version".into(),
                reference: "${ref:nope}".into(),
            }
        );
    }

    #[test]
    fn unknown_scheme_is_an_error() {
        assert!(resolver().expand("PHP", "v", "${vault:db}").is_err());
    }

    #[test]
    fn env_scheme_reads_environment() {
        // PATH is set in every test environment we run in.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(resolver().expand("X", "p", "${env:PATH}").unwrap(), path);
    }
}
