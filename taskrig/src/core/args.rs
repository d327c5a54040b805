//! Validated, name-addressed task arguments.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::core::target::Target;

/// Canonical name → value mapping produced by validation. Positional values
/// are gone by the time an operation sees this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<String, Value>,
}

impl Args {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Required string argument.
    pub fn str(&self, name: &str) -> Result<&str> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| anyhow!("missing argument `{name}`"))?;
        value
            .as_str()
            .ok_or_else(|| anyhow!("argument `{name}` is not a string: {value}"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// The `target` argument, resolved.
    pub fn target(&self) -> Result<Target> {
        let raw = self.str("target")?;
        Ok(raw.parse()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
