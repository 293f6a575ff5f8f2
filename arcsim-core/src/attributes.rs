//! Typed province/state attribute maps.
//!
//! Attributes are numeric accumulators that buildings feed every tick
//! (transport infrastructure, science points, ...). The well-known keys are
//! enumerated so config rules can name them; anything else a template grants
//! lands in [`AttributeKey::Other`].

use crate::fixed::Fixed;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKey {
    TransportInfrastructure,
    SciencePoints,
    CulturePoints,
    ReligionPoints,
    Other(String),
}

impl AttributeKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TransportInfrastructure => "transport_infrastructure",
            Self::SciencePoints => "science_points",
            Self::CulturePoints => "culture_points",
            Self::ReligionPoints => "religion_points",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for AttributeKey {
    fn from(s: &str) -> Self {
        match s {
            "transport_infrastructure" => Self::TransportInfrastructure,
            "science_points" => Self::SciencePoints,
            "culture_points" => Self::CulturePoints,
            "religion_points" => Self::ReligionPoints,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AttributeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AttributeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AttributeKey::from(s.as_str()))
    }
}

/// Attribute values keyed by [`AttributeKey`]. Missing keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<AttributeKey, Fixed>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, zero when absent.
    pub fn get(&self, key: &AttributeKey) -> Fixed {
        self.0.get(key).copied().unwrap_or(Fixed::ZERO)
    }

    pub fn contains(&self, key: &AttributeKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: AttributeKey, value: Fixed) {
        self.0.insert(key, value);
    }

    /// Adds `delta`, creating the key when absent.
    pub fn add(&mut self, key: AttributeKey, delta: Fixed) {
        *self.0.entry(key).or_insert(Fixed::ZERO) += delta;
    }

    /// Adds every entry of `other` into `self`.
    pub fn accumulate(&mut self, other: &AttributeMap) {
        for (key, &value) in &other.0 {
            self.add(key.clone(), value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, Fixed)> + '_ {
        self.0.iter().map(|(k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AttributeKey, Fixed)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (AttributeKey, Fixed)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
