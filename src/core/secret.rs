//! Credential bag resolved by the platform before an action runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use zeroize::Zeroize;

use crate::errors::{ActionError, ActionResult};

/// Named string-valued credential fields.
///
/// Scalar JSON values (numbers, booleans) are kept in their string form so that secrets such
/// as an SMTP `port` can be stored either way. Values are zeroized when the secret is dropped
/// and never appear in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret {
    fields: BTreeMap<String, String>,
}

impl Secret {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the field if it is present and non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns the field or `Secret is missing the '<name>' field.`
    pub fn require(&self, name: &str) -> ActionResult<&str> {
        self.get(name)
            .ok_or_else(|| ActionError::config(format!("Secret is missing the '{name}' field.")))
    }

    /// Checks every field in order and reports the first one missing.
    pub fn require_all(&self, names: &[&str]) -> ActionResult<()> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        for value in self.fields.values_mut() {
            value.zeroize();
        }
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let fields = raw
            .into_iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((name, value))
            })
            .collect();
        Ok(Self { fields })
    }
}
