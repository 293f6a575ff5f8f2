//! Advisory list of provinces where each building type could be placed.

use crate::buildings::{BuildingCatalog, BuildingTemplate};
use crate::state::{ProvinceId, ProvinceState, StateContext};
use crate::systems::eligibility::can_place;
use tracing::instrument;

/// Owned provinces, in snapshot order, that could host one more `template`.
///
/// A simulated global capacity starts at `global_limit` minus the state's own
/// instance count and shrinks with every qualifying province. Provinces that
/// already hold `province_limit` copies are skipped.
pub fn buildable_provinces(
    template: &BuildingTemplate,
    provinces: &[ProvinceState],
    acting_state: &str,
    state: &StateContext,
) -> Vec<ProvinceId> {
    let owned = || provinces.iter().filter(|p| p.owner == acting_state);

    let mut remaining = match template.global_limit() {
        Some(limit) => {
            let current: usize = owned().map(|p| p.count_buildings(&template.name)).sum();
            (limit as usize).saturating_sub(current)
        }
        None => usize::MAX,
    };

    let mut result = Vec::new();
    for province in owned() {
        if remaining == 0 {
            break;
        }
        if let Some(limit) = template.province_limit() {
            if province.count_buildings(&template.name) >= limit as usize {
                continue;
            }
        }
        if can_place(template, province, state) {
            result.push(province.province_id.clone());
            remaining -= 1;
        }
    }
    result
}

/// Recomputes `buildable_provinces` for every template in the catalog.
#[instrument(skip_all, name = "buildable")]
pub fn refresh_buildable_provinces(
    catalog: &mut BuildingCatalog,
    provinces: &[ProvinceState],
    acting_state: &str,
    state: &StateContext,
) {
    for template in catalog.iter_mut() {
        template.buildable_provinces = buildable_provinces(template, provinces, acting_state, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;
    use serde_json::json;

    #[test]
    fn test_only_owned_qualifying_provinces_in_order() {
        let template: BuildingTemplate = serde_json::from_value(json!({
            "name": "Vineyard",
            "required_province_cultures": "elven"
        }))
        .unwrap();
        let world = WorldStateBuilder::new("Avalon")
            .province("3", "Avalon", |p| p.culture("elven"))
            .province("1", "Avalon", |p| p.culture("human"))
            .province("2", "Lyonesse", |p| p.culture("elven"))
            .province("4", "Avalon", |p| p.culture("elven"))
            .build();

        let result = buildable_provinces(&template, &world.provinces, "Avalon", &world.state);
        assert_eq!(result, vec!["3", "4"]);
    }

    #[test]
    fn test_global_capacity_counts_down() {
        let mut template = BuildingTemplate::new("Wonder");
        template.global_limit = 2;
        let world = WorldStateBuilder::new("Avalon")
            .province("1", "Avalon", |p| p.building("Wonder", "Avalon"))
            .province("2", "Avalon", |p| p)
            .province("3", "Avalon", |p| p)
            .build();

        let result = buildable_provinces(&template, &world.provinces, "Avalon", &world.state);
        assert_eq!(result, vec!["1"]);
    }

    #[test]
    fn test_province_limit_skips_full_provinces() {
        let mut template = BuildingTemplate::new("Farm");
        template.province_limit = 1;
        let world = WorldStateBuilder::new("Avalon")
            .province("1", "Avalon", |p| p.building("Farm", "Avalon"))
            .province("2", "Avalon", |p| p)
            .build();

        let result = buildable_provinces(&template, &world.provinces, "Avalon", &world.state);
        assert_eq!(result, vec!["2"]);
    }

    #[test]
    fn test_refresh_writes_every_template() {
        let mut world = WorldStateBuilder::new("Avalon")
            .template(BuildingTemplate::new("Farm"))
            .template(BuildingTemplate::new("Mill"))
            .province("1", "Avalon", |p| p)
            .build();
        refresh_buildable_provinces(&mut world.catalog, &world.provinces, "Avalon", &world.state);
        assert!(world.catalog.iter().all(|t| t.buildable_provinces == vec!["1"]));
    }
}
