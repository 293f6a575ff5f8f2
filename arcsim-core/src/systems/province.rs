//! Province-level orchestration of the building pipeline.

use crate::event::{EventLog, TickEvent};
use crate::fixed::Fixed;
use crate::state::{ProvinceState, StateMetrics, Tag};
use crate::systems::attribute_limits::{enforce_province_attribute_limits, reset_province_attributes};
use crate::systems::building::{process_building, Economy, ProvinceScratch};
use crate::systems::self_destruction::run_self_destruction;

/// Workers a province can field: `floor(population × coefficient)`, never negative.
pub fn available_workers(population: u64, coefficient: Fixed) -> u64 {
    let population = i64::try_from(population)
        .unwrap_or(i64::MAX)
        .min(i64::MAX / Fixed::SCALE);
    Fixed::from_int(population).mul(coefficient).floor().max(0) as u64
}

/// Runs one owned province through a tick.
///
/// Buildings are processed in stored order against a running free-land
/// counter. Afterwards the demolition sweep and attribute clamping run, land
/// usage is written back, and the collected notices become one log entry.
pub fn process_province(economy: &mut Economy<'_>, province: &mut ProvinceState, events: &mut EventLog) {
    province.available_workers =
        available_workers(province.population, economy.state.workers_coefficient);
    province.occupied_workers = 0;
    economy.metrics.workers_available += province.available_workers;
    economy.metrics.agricultural_land_total += province.agricultural_land;

    reset_province_attributes(province, &economy.config.resettable_province_attributes);

    let mut scratch = ProvinceScratch {
        free_land: province.agricultural_land,
        ..Default::default()
    };
    for index in 0..province.buildings.len() {
        process_building(economy, province, index, &mut scratch, events);
    }

    run_self_destruction(province, economy.config, events);
    enforce_province_attribute_limits(province, &economy.config.province_attribute_limits, events);

    province.agricultural_land_used = scratch.used_land;
    province.agricultural_land_free = scratch.free_land;
    economy.metrics.agricultural_land_used += scratch.used_land;
    economy.metrics.agricultural_land_free += scratch.free_land;

    if !scratch.notices.is_empty() {
        events.push(TickEvent::ProvinceNotices {
            province: province.province_id.clone(),
            notices: scratch.notices,
        });
    }
}

/// Ages every building standing in a province the state owns.
pub fn advance_cycle_counts(provinces: &mut [ProvinceState], acting_state: &str) {
    provinces
        .iter_mut()
        .filter(|p| p.owner == acting_state)
        .flat_map(|p| p.buildings.iter_mut())
        .for_each(|b| b.cycle_count = b.cycle_count.saturating_add(1));
}

/// Books the stored results of the state's active buildings abroad.
pub fn collect_foreign_income(provinces: &[ProvinceState], acting_state: &Tag, metrics: &mut StateMetrics) {
    for building in provinces
        .iter()
        .filter(|p| p.owner != *acting_state)
        .flat_map(|p| &p.buildings)
        .filter(|b| b.building_owner == *acting_state && b.is_active())
    {
        metrics.state_buildings_income_foreign += building.incomes;
        metrics.state_buildings_expenses_foreign += building.expenses;
    }
}
