//! Building caps: per state, per province, and worldwide.
//!
//! The three passes are independent and run in that order. Every removal is
//! immediate and reported.

use crate::buildings::BuildingCatalog;
use crate::event::{EventLog, TickEvent};
use crate::state::ProvinceState;
use tracing::instrument;

/// Position of a building instance: (province index, building index).
type Slot = (usize, usize);

/// Removes the given slots. Slots must not repeat.
fn remove_slots(provinces: &mut [ProvinceState], mut slots: Vec<Slot>) {
    // Back to front so earlier indices stay valid.
    slots.sort_unstable_by(|a, b| b.cmp(a));
    for (p, b) in slots {
        provinces[p].buildings.remove(b);
    }
}

/// Caps the number of each building type across the acting state's provinces.
///
/// Instances are collected in scan order and evicted from the end.
#[instrument(skip_all, name = "state_limits")]
pub fn enforce_building_limits(
    catalog: &BuildingCatalog,
    provinces: &mut [ProvinceState],
    acting_state: &str,
    events: &mut EventLog,
) {
    for template in catalog.iter() {
        let Some(limit) = template.building_limit() else {
            continue;
        };
        let limit = limit as usize;
        let mut slots: Vec<Slot> = Vec::new();
        for (p, province) in provinces.iter().enumerate() {
            if province.owner != acting_state {
                continue;
            }
            slots.extend(
                province
                    .buildings
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.name == template.name)
                    .map(|(b, _)| (p, b)),
            );
        }
        if slots.len() <= limit {
            continue;
        }

        let evicted = slots.split_off(limit);
        log::info!(
            "{}: {} of {} exceed the state limit {}",
            acting_state,
            evicted.len(),
            template.name,
            limit
        );
        for &(p, _) in evicted.iter().rev() {
            events.push(TickEvent::StateLimitEviction {
                building: template.name.clone(),
                province: provinces[p].province_id.clone(),
            });
        }
        remove_slots(provinces, evicted);
    }
}

/// Caps each building type inside every owned province.
///
/// Types are checked in order of first appearance; the last instances go.
#[instrument(skip_all, name = "province_limits")]
pub fn enforce_province_building_limits(
    catalog: &BuildingCatalog,
    provinces: &mut [ProvinceState],
    acting_state: &str,
    events: &mut EventLog,
) {
    for province in provinces.iter_mut().filter(|p| p.owner == acting_state) {
        let mut names: Vec<String> = Vec::new();
        for building in &province.buildings {
            if !names.contains(&building.name) {
                names.push(building.name.clone());
            }
        }

        for name in names {
            let Some(limit) = catalog.get(&name).and_then(|t| t.province_limit()) else {
                continue;
            };
            let matching: Vec<usize> = province
                .buildings
                .iter()
                .enumerate()
                .filter(|(_, b)| b.name == name)
                .map(|(i, _)| i)
                .collect();
            let count = matching.len();
            if count <= limit as usize {
                continue;
            }

            for &index in matching[limit as usize..].iter().rev() {
                province.buildings.remove(index);
                events.push(TickEvent::ProvinceLimitEviction {
                    building: name.clone(),
                    province: province.province_id.clone(),
                    count,
                    limit,
                });
            }
        }
    }
}

/// Caps each building type across the whole world.
///
/// Only the acting state's instances can be evicted, and only those no older
/// (by `cycle_count`) than the youngest foreign instance. Newest go first.
#[instrument(skip_all, name = "global_limits")]
pub fn enforce_global_building_limits(
    catalog: &BuildingCatalog,
    provinces: &mut [ProvinceState],
    acting_state: &str,
    events: &mut EventLog,
) {
    for template in catalog.iter() {
        let Some(limit) = template.global_limit() else {
            continue;
        };

        let mut ours: Vec<(Slot, u32)> = Vec::new();
        let mut youngest_other: Option<u32> = None;
        let mut count = 0usize;
        for (p, province) in provinces.iter().enumerate() {
            for (b, building) in province.buildings.iter().enumerate() {
                if building.name != template.name {
                    continue;
                }
                count += 1;
                if province.owner == acting_state {
                    ours.push(((p, b), building.cycle_count));
                } else {
                    youngest_other = Some(
                        youngest_other.map_or(building.cycle_count, |m| m.min(building.cycle_count)),
                    );
                }
            }
        }

        if count <= limit as usize {
            continue;
        }
        let excess = count - limit as usize;
        log::debug!(
            "Global limit for {}: {}/{}, own {}",
            template.name,
            count,
            limit,
            ours.len()
        );

        if ours.is_empty() {
            events.push(TickEvent::GlobalLimitNothingOwned {
                building: template.name.clone(),
                count,
                limit,
            });
            continue;
        }

        let mut eligible: Vec<(Slot, u32)> = ours
            .into_iter()
            .filter(|&(_, cycles)| youngest_other.map_or(true, |min| cycles <= min))
            .collect();
        if eligible.is_empty() {
            events.push(TickEvent::GlobalLimitNothingEligible {
                building: template.name.clone(),
                count,
                limit,
            });
            continue;
        }

        // Stable: equal ages keep scan order.
        eligible.sort_by_key(|&(_, cycles)| cycles);
        eligible.truncate(excess);

        for &((p, _), _) in &eligible {
            events.push(TickEvent::GlobalLimitEviction {
                building: template.name.clone(),
                province: provinces[p].province_id.clone(),
            });
        }
        remove_slots(provinces, eligible.into_iter().map(|(slot, _)| slot).collect());
    }
}
