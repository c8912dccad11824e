//! Host dimensions attached to every emitted metric.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One key/value tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl FromStr for Dimension {
    type Err = String;

    /// Parses `KEY=VALUE`. The value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Ok(Self {
                name: name.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(format!("invalid dimension {:?}: expected KEY=VALUE", s)),
        }
    }
}

/// Ordered set of dimensions identifying the host.
///
/// Keys are unique: inserting an existing key replaces its value and keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DimensionSet {
    entries: Vec<Dimension>,
}

impl DimensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Dimension { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dimension> {
        self.entries.iter()
    }
}

impl FromIterator<Dimension> for DimensionSet {
    fn from_iter<I: IntoIterator<Item = Dimension>>(iter: I) -> Self {
        let mut set = DimensionSet::new();
        for d in iter {
            set.insert(d.name, d.value);
        }
        set
    }
}

impl fmt::Display for DimensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|d| format!("{}={}", d.name, d.value))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Subset of a cloud instance identity document.
///
/// Only the fields used as dimensions are read; everything else in the
/// document is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIdentity {
    pub instance_id: String,
    pub instance_type: String,
    pub image_id: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl InstanceIdentity {
    /// Parses an identity document from its JSON text.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Converts the identity into the standard host dimensions:
    /// `InstanceID`, `InstanceType`, `ImageID`.
    pub fn dimensions(&self) -> DimensionSet {
        let mut set = DimensionSet::new();
        set.insert("InstanceID", &self.instance_id);
        set.insert("InstanceType", &self.instance_type);
        set.insert("ImageID", &self.image_id);
        set
    }
}
