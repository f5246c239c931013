//! Ordered `KEY=VALUE` substitution lists.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub key: String,
    pub value: String,
}

impl Substitution {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `KEY=VALUE`. Only the first `=` splits; the value may be empty.
    pub fn parse(entry: &str) -> Result<Self, SubstitutionError> {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| SubstitutionError::MissingSeparator(entry.to_string()))?;
        if key.is_empty() {
            return Err(SubstitutionError::EmptyKey(entry.to_string()));
        }
        Ok(Self::new(key, value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    #[error("invalid substitution '{0}': expected KEY=VALUE")]
    MissingSeparator(String),

    #[error("invalid substitution '{0}': missing key")]
    EmptyKey(String),
}

/// Substitutions in declaration order. Later entries override earlier ones
/// with the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionSet {
    entries: Vec<Substitution>,
}

impl SubstitutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_all<I, S>(entries: I) -> Result<Self, SubstitutionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for entry in entries {
            set.entries.push(Substitution::parse(entry.as_ref())?);
        }
        Ok(set)
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Substitution::new(key, value));
    }

    pub fn extend(&mut self, other: &SubstitutionSet) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Substitution> {
        self.entries.iter()
    }

    /// Value bound to `key`, last entry wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
    }

    /// Collapse to a lookup table with last-wins resolution.
    pub fn resolved(&self) -> HashMap<&str, &str> {
        let mut out = HashMap::with_capacity(self.entries.len());
        for s in &self.entries {
            out.insert(s.key.as_str(), s.value.as_str());
        }
        out
    }

    /// Render as repeated `-s=KEY=VALUE` helper arguments.
    pub fn to_args(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|s| format!("-s={}={}", s.key, s.value))
            .collect()
    }
}

impl FromIterator<Substitution> for SubstitutionSet {
    fn from_iter<T: IntoIterator<Item = Substitution>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
