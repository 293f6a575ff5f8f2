//! Efficiency modifiers carried by building templates.
//!
//! Each multiplier scales one resource flow of a building: consumption,
//! production, or extraction. All values use [`Fixed`].

use crate::fixed::Fixed;
use crate::state::Extra;
use serde::{Deserialize, Serialize};

/// Modifier block as stored on a template. Absent or zero entries mean `1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyModifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_efficiency: Option<Fixed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_efficiency: Option<Fixed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption_efficiency: Option<Fixed>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Resolved multipliers for one building in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Efficiency {
    pub production: Fixed,
    pub extraction: Fixed,
    pub consumption: Fixed,
}

impl Default for Efficiency {
    fn default() -> Self {
        Self {
            production: Fixed::ONE,
            extraction: Fixed::ONE,
            consumption: Fixed::ONE,
        }
    }
}

fn or_one(v: Option<Fixed>) -> Fixed {
    match v {
        Some(v) if v != Fixed::ZERO => v,
        _ => Fixed::ONE,
    }
}

impl EfficiencyModifiers {
    pub fn resolve(&self) -> Efficiency {
        Efficiency {
            production: or_one(self.production_efficiency),
            extraction: or_one(self.extraction_efficiency),
            consumption: or_one(self.consumption_efficiency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_zero_default_to_one() {
        let m = EfficiencyModifiers {
            production_efficiency: Some(Fixed::ZERO),
            extraction_efficiency: Some(Fixed::from_raw(15_000)),
            ..Default::default()
        };
        let e = m.resolve();
        assert_eq!(e.production, Fixed::ONE);
        assert_eq!(e.extraction, Fixed::from_raw(15_000));
        assert_eq!(e.consumption, Fixed::ONE);
    }
}
