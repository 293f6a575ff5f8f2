use crate::attributes::{AttributeKey, AttributeMap};
use crate::fixed::Fixed;
use serde::{Deserialize, Serialize};

/// Inclusive range an attribute is clamped to at the end of a tick.
/// Used for: transport infrastructure (0 to 100), science points (0 to 10000), etc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeLimit {
    pub attribute: AttributeKey,
    pub min: Fixed,
    pub max: Fixed,
    /// Whether an adjustment is reported in the event log.
    #[serde(default)]
    pub log: bool,
    /// Genitive noun used in the state-level report, e.g. "очков науки".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A value that was moved back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub old: Fixed,
    pub new: Fixed,
}

impl AttributeLimit {
    pub fn new(attribute: AttributeKey, min: Fixed, max: Fixed) -> Self {
        Self {
            attribute,
            min,
            max,
            log: false,
            label: None,
        }
    }

    pub fn logged(mut self, label: impl Into<String>) -> Self {
        self.log = true;
        self.label = Some(label.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Clamps `value`, returning the adjustment if it was out of range.
    pub fn clamp(&self, value: Fixed) -> Option<Adjustment> {
        let clamped = value.max(self.min).min(self.max);
        (clamped != value).then_some(Adjustment {
            old: value,
            new: clamped,
        })
    }

    /// Clamps the rule's attribute inside `map`. Absent keys are left absent.
    pub fn apply(&self, map: &mut AttributeMap) -> Option<Adjustment> {
        if !map.contains(&self.attribute) {
            return None;
        }
        let adjustment = self.clamp(map.get(&self.attribute))?;
        map.set(self.attribute.clone(), adjustment.new);
        Some(adjustment)
    }
}
