//! Placement eligibility: province and state criteria, attribute ranges, and
//! the building-dependency tree.
//!
//! Every check runs even after an earlier one failed so the player sees all
//! reasons at once.

use crate::attributes::{AttributeKey, AttributeMap};
use crate::buildings::{AttributeRange, BuildingTemplate, ProvinceCriterion, StateCriterion};
use crate::criteria::{describe_dependencies, evaluate, Condition, CriteriaValue};
use crate::event::ProvinceNotice;
use crate::state::{ProvinceState, StateContext};
use std::collections::BTreeMap;

/// Failure reasons for every province criterion the template sets.
pub fn province_criteria_reasons(template: &BuildingTemplate, province: &ProvinceState) -> Vec<String> {
    ProvinceCriterion::ALL
        .iter()
        .filter_map(|&criterion| {
            let condition = template.province_criterion(criterion)?;
            let values = province.criterion_values(criterion);
            let result = evaluate(condition, CriteriaValue::List(&values));
            result
                .reason
                .map(|reason| format!("{}: {reason}", criterion.description()))
        })
        .collect()
}

/// Failure reasons for every state criterion the template sets.
pub fn state_criteria_reasons(template: &BuildingTemplate, state: &StateContext) -> Vec<String> {
    StateCriterion::ALL
        .iter()
        .filter_map(|&criterion| {
            let condition = template.state_criterion(criterion)?;
            let result = evaluate(condition, state.criterion_value(criterion));
            result
                .reason
                .map(|reason| format!("{}: {reason}", criterion.description()))
        })
        .collect()
}

fn range_reasons(
    scope: &str,
    ranges: &BTreeMap<AttributeKey, AttributeRange>,
    values: &AttributeMap,
    reasons: &mut Vec<String>,
) {
    for (attribute, range) in ranges {
        let value = values.get(attribute);
        if let Some(min) = range.min {
            if value < min {
                reasons.push(format!(
                    "Атрибут {scope} \"{attribute}\" меньше минимального ({value} < {min})"
                ));
            }
        }
        if let Some(max) = range.max {
            if value > max {
                reasons.push(format!(
                    "Атрибут {scope} \"{attribute}\" больше максимального ({value} > {max})"
                ));
            }
        }
    }
}

/// Province and state attribute-range violations. Absent attributes read as zero.
pub fn attribute_reasons(
    template: &BuildingTemplate,
    province: &ProvinceState,
    state: &StateContext,
) -> Vec<String> {
    let mut reasons = Vec::new();
    range_reasons(
        "провинции",
        &template.required_province_attributes,
        &province.province_attributes,
        &mut reasons,
    );
    range_reasons(
        "государства",
        &template.required_state_attributes,
        &state.attributes,
        &mut reasons,
    );
    reasons
}

/// Whether the dependency tree holds for the buildings present in `province`.
pub fn dependencies_met(condition: &Condition, province: &ProvinceState) -> bool {
    let names = province.building_names();
    evaluate(condition, CriteriaValue::List(&names)).success
}

fn dependency_requirement(condition: &Condition) -> String {
    match condition {
        Condition::Literal(name) => format!("наличия следующих построек: {name}"),
        other => describe_dependencies(other),
    }
}

/// Runs every eligibility check for one building instance.
///
/// Returns one notice per failed check group; an empty result means the
/// building may operate.
pub fn check_building(
    template: &BuildingTemplate,
    building_owner: &str,
    province: &ProvinceState,
    state_name: &str,
    state: &StateContext,
) -> Vec<ProvinceNotice> {
    let mut notices = Vec::new();
    let building = &template.name;

    let reasons = province_criteria_reasons(template, province);
    if !reasons.is_empty() {
        notices.push(ProvinceNotice::ProvinceCriteria {
            building: building.clone(),
            reasons,
        });
    }

    let reasons = state_criteria_reasons(template, state);
    if !reasons.is_empty() {
        notices.push(ProvinceNotice::StateCriteria {
            state: state_name.to_string(),
            building: building.clone(),
            owner: building_owner.to_string(),
            reasons,
        });
    }

    let reasons = attribute_reasons(template, province, state);
    if !reasons.is_empty() {
        notices.push(ProvinceNotice::Attributes {
            building: building.clone(),
            reasons,
        });
    }

    if let Some(deps) = &template.required_buildings {
        if !dependencies_met(deps, province) {
            notices.push(ProvinceNotice::Dependencies {
                building: building.clone(),
                requirement: dependency_requirement(deps),
            });
        }
    }

    notices
}

/// Whether the province could host one more copy of `template` right now.
///
/// Same checks as [`check_building`] plus worker and land capacity, without
/// reserving anything.
pub fn can_place(template: &BuildingTemplate, province: &ProvinceState, state: &StateContext) -> bool {
    province_criteria_reasons(template, province).is_empty()
        && state_criteria_reasons(template, state).is_empty()
        && attribute_reasons(template, province, state).is_empty()
        && province.free_workers() >= template.required_workers
        && province.agricultural_land_free >= template.required_agricultural_land
        && template
            .required_buildings
            .as_ref()
            .map_or(true, |deps| dependencies_met(deps, province))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::state::Building;
    use serde_json::json;

    fn template(raw: serde_json::Value) -> BuildingTemplate {
        serde_json::from_value(raw).unwrap()
    }

    fn province() -> ProvinceState {
        ProvinceState {
            province_id: "1".to_string(),
            owner: "Avalon".to_string(),
            cultures: vec!["elven".to_string()],
            landscapes: vec!["forest".to_string()],
            resources: vec![crate::state::ResourceDeposit::new("iron", Fixed::from_int(9))],
            available_workers: 50,
            agricultural_land_free: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_eligible_building_has_no_notices() {
        let t = template(json!({
            "name": "Sawmill",
            "required_province_landscapes": "forest",
            "required_province_resources": "iron"
        }));
        let notices = check_building(&t, "Avalon", &province(), "Avalon", &StateContext::default());
        assert!(notices.is_empty());
    }

    #[test]
    fn test_each_failed_group_is_reported() {
        let t = template(json!({
            "name": "Temple",
            "required_province_cultures": "dwarven",
            "required_state_stability": {"GREATER_THAN": 50},
            "required_province_attributes": {"transport_infrastructure": {"min": 5}},
            "required_buildings": "Shrine"
        }));
        let state = StateContext {
            stability: Fixed::from_int(20),
            ..Default::default()
        };
        let notices = check_building(&t, "Other", &province(), "Avalon", &state);
        assert_eq!(notices.len(), 4);

        let text = notices[0].render("1");
        assert!(text.contains("Культуры: Ожидалось значение \"dwarven\""));
        let text = notices[1].render("1");
        assert!(text.contains("Владелец постройки \"Other\""));
        assert!(text.contains("Социальная стабильность"));
        let text = notices[2].render("1");
        assert!(text.contains("меньше минимального (0 < 5)"));
        let text = notices[3].render("1");
        assert!(text.contains("наличия следующих построек: Shrine"));
    }

    #[test]
    fn test_dependencies_see_present_buildings() {
        let t = template(json!({"name": "Forge", "required_buildings": {"OR": ["Mine", "Quarry"]}}));
        let mut p = province();
        assert!(!can_place(&t, &p, &StateContext::default()));
        p.buildings.push(Building::new("Quarry", "Avalon"));
        assert!(can_place(&t, &p, &StateContext::default()));
    }

    #[test]
    fn test_can_place_checks_capacity() {
        let mut t = BuildingTemplate::new("Farm");
        t.required_workers = 40;
        t.required_agricultural_land = 10;
        let mut p = province();
        assert!(can_place(&t, &p, &StateContext::default()));
        p.occupied_workers = 20;
        assert!(!can_place(&t, &p, &StateContext::default()));
        p.occupied_workers = 0;
        p.agricultural_land_free = 9;
        assert!(!can_place(&t, &p, &StateContext::default()));
    }
}
