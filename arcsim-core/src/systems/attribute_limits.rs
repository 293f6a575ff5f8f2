//! End-of-tick clamping of province and state attributes.

use crate::attributes::AttributeKey;
use crate::bounded::AttributeLimit;
use crate::event::{EventLog, TickEvent};
use crate::fixed::Fixed;
use crate::state::{ProvinceState, StateContext};

/// Zeroes the attributes that buildings re-accrue every tick.
pub fn reset_province_attributes(province: &mut ProvinceState, keys: &[AttributeKey]) {
    for key in keys {
        province.province_attributes.set(key.clone(), Fixed::ZERO);
    }
}

/// Clamps one province's attributes. Only rules flagged `log` are reported.
pub fn enforce_province_attribute_limits(
    province: &mut ProvinceState,
    rules: &[AttributeLimit],
    events: &mut EventLog,
) {
    for rule in rules {
        let Some(adjustment) = rule.apply(&mut province.province_attributes) else {
            continue;
        };
        log::debug!(
            "Province {} attribute {} clamped {} -> {}",
            province.province_id,
            rule.attribute,
            adjustment.old,
            adjustment.new
        );
        if rule.log {
            events.push(TickEvent::ProvinceAttributeClamped {
                province: province.province_id.clone(),
                attribute: rule.attribute.clone(),
                old: adjustment.old,
                new: adjustment.new,
            });
        }
    }
}

/// Clamps the acting state's accumulated points.
pub fn enforce_state_attribute_limits(
    state: &mut StateContext,
    rules: &[AttributeLimit],
    events: &mut EventLog,
) {
    for rule in rules {
        let Some(adjustment) = rule.apply(&mut state.attributes) else {
            continue;
        };
        if rule.log {
            events.push(TickEvent::StateAttributeClamped {
                attribute: rule.attribute.clone(),
                label: rule.label.clone(),
                old: adjustment.old,
                new: adjustment.new,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::event::EventCategory;

    #[test]
    fn test_transport_clamp_is_silent() {
        let mut p = ProvinceState::default();
        p.province_attributes
            .set(AttributeKey::TransportInfrastructure, Fixed::from_int(150));
        let mut events = EventLog::new();
        enforce_province_attribute_limits(
            &mut p,
            &SimConfig::default().province_attribute_limits,
            &mut events,
        );
        assert_eq!(
            p.province_attributes.get(&AttributeKey::TransportInfrastructure),
            Fixed::from_int(100)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_state_points_clamp_is_reported() {
        let mut state = StateContext::default();
        state
            .attributes
            .set(AttributeKey::SciencePoints, Fixed::from_int(12_000));
        state
            .attributes
            .set(AttributeKey::CulturePoints, Fixed::from_int(-5));
        let mut events = EventLog::new();
        enforce_state_attribute_limits(
            &mut state,
            &SimConfig::default().state_attribute_limits,
            &mut events,
        );

        assert_eq!(
            state.attributes.get(&AttributeKey::SciencePoints),
            Fixed::from_int(10_000)
        );
        assert_eq!(state.attributes.get(&AttributeKey::CulturePoints), Fixed::ZERO);
        assert_eq!(events.len(), 2);
        let first = &events.events()[0];
        assert_eq!(first.category(), EventCategory::Warning);
        assert_eq!(
            first.to_string(),
            "Количество очков науки(science_points) было изменено с 12000 на 10000 \
             из-за нарушения лимита накопления."
        );
    }

    #[test]
    fn test_reset_creates_zeroed_keys() {
        let mut p = ProvinceState::default();
        reset_province_attributes(&mut p, &[AttributeKey::TransportInfrastructure]);
        assert!(p.province_attributes.contains(&AttributeKey::TransportInfrastructure));
        assert_eq!(
            p.province_attributes.get(&AttributeKey::TransportInfrastructure),
            Fixed::ZERO
        );
    }
}
