use crate::attributes::AttributeKey;
use crate::bounded::AttributeLimit;
use crate::fixed::Fixed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("attribute limit for `{0}` has min greater than max")]
    InvertedLimit(AttributeKey),
    #[error("self_destruction_warning ({warning}) must not exceed self_destruction_start ({start})")]
    WarningAfterStart { warning: u32, start: u32 },
}

/// Simulation configuration.
///
/// Every tunable constant of a tick lives here so a settings file can
/// override it without a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Countdown given to active buildings (and to buildings without one).
    pub self_destruction_start: u32,
    /// Countdown at or below which a pending demolition is announced.
    pub self_destruction_warning: u32,
    /// Remaining extraction cycles at or below which depletion is announced.
    pub depletion_warning_cycles: u32,
    /// Province attributes zeroed before buildings re-accrue them.
    pub resettable_province_attributes: Vec<AttributeKey>,
    pub province_attribute_limits: Vec<AttributeLimit>,
    pub state_attribute_limits: Vec<AttributeLimit>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let points = |key, label: &str| {
            AttributeLimit::new(key, Fixed::ZERO, Fixed::from_int(10_000)).logged(label)
        };
        Self {
            self_destruction_start: 10,
            self_destruction_warning: 3,
            depletion_warning_cycles: 5,
            resettable_province_attributes: vec![AttributeKey::TransportInfrastructure],
            province_attribute_limits: vec![AttributeLimit::new(
                AttributeKey::TransportInfrastructure,
                Fixed::ZERO,
                Fixed::from_int(100),
            )],
            state_attribute_limits: vec![
                points(AttributeKey::SciencePoints, "очков науки"),
                points(AttributeKey::CulturePoints, "очков культуры"),
                points(AttributeKey::ReligionPoints, "очков религии"),
            ],
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.self_destruction_warning > self.self_destruction_start {
            return Err(ConfigError::WarningAfterStart {
                warning: self.self_destruction_warning,
                start: self.self_destruction_start,
            });
        }
        self.province_attribute_limits
            .iter()
            .chain(&self.state_attribute_limits)
            .find(|rule| !rule.is_valid())
            .map_or(Ok(()), |rule| {
                Err(ConfigError::InvertedLimit(rule.attribute.clone()))
            })
    }
}
