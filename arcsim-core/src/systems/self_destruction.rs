//! Demolition countdown for buildings that stay inactive.

use crate::config::SimConfig;
use crate::event::{EventLog, TickEvent};
use crate::state::ProvinceState;

/// Advances every building's countdown and removes the ones that reach zero.
///
/// Active buildings are reset to the configured start; inactive ones tick
/// down by one, never below zero. Decisions are made over a snapshot of the
/// building list and applied by index afterwards.
pub fn run_self_destruction(province: &mut ProvinceState, config: &SimConfig, events: &mut EventLog) {
    let start = config.self_destruction_start;
    let mut doomed = Vec::new();

    for (index, building) in province.buildings.iter_mut().enumerate() {
        let countdown = building.self_destruction.unwrap_or(start);
        let next = if building.is_active() {
            start
        } else {
            countdown.saturating_sub(1)
        };
        building.self_destruction = Some(next);

        if building.is_active() {
            continue;
        }
        if next == 0 {
            log::debug!(
                "Demolished inactive {} in province {}",
                building.name,
                province.province_id
            );
            events.push(TickEvent::Demolished {
                province: province.province_id.clone(),
                building: building.name.clone(),
            });
            doomed.push(index);
        } else if next <= config.self_destruction_warning {
            events.push(TickEvent::DemolitionPending {
                province: province.province_id.clone(),
                building: building.name.clone(),
                turns: next,
            });
        }
    }
    // Highest index first keeps the remaining indices valid.
    for index in doomed.into_iter().rev() {
        province.buildings.remove(index);
    }
}
