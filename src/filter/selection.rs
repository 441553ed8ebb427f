use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey {
    pub dimension: String,
    pub value: String,
}

impl ElementKey {
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.dimension, self.value)
    }
}

/// Equality ignores the label.
#[derive(Clone, Debug)]
pub struct FilterSelection {
    key: ElementKey,
    label: String,
}

impl FilterSelection {
    pub fn new(
        dimension: impl Into<String>,
        value: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            key: ElementKey::new(dimension, value),
            label: label.into(),
        }
    }

    pub fn from_key(key: ElementKey, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
        }
    }

    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    pub fn dimension(&self) -> &str {
        &self.key.dimension
    }

    pub fn value(&self) -> &str {
        &self.key.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, dimension: &str, value: &str) -> bool {
        self.key.dimension == dimension && self.key.value == value
    }
}

impl PartialEq for FilterSelection {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FilterSelection {}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.key)
    }
}
