use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a distinguishable product or service variant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(pub String);

/// Identifier of one basket (a single purchasing event).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasketId(pub String);

impl Item {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BasketId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BasketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BasketId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BasketId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
