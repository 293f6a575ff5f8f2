//! Per-building tick pipeline.
//!
//! Stages run in a fixed order: reset, template lookup, eligibility, workers,
//! land, consumption, production, corporate tax, attribute accrual,
//! extraction, metrics. The first failing stage marks the building inactive
//! and skips everything after it. Whatever earlier stages committed (worker
//! reservation, salary expense) stays committed.

use crate::buildings::{BuildingCatalog, BuildingTemplate};
use crate::config::SimConfig;
use crate::event::{EventLog, ProvinceNotice, Shortage, TickEvent};
use crate::fixed::Fixed;
use crate::modifiers::Efficiency;
use crate::state::{
    Building, BuildingStatus, ProvinceState, ResourceLedger, StateContext, StateMetrics,
};
use crate::systems::eligibility;

/// Stage at which a building stopped running this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Template,
    Eligibility,
    Workers,
    Land,
    Consumption,
    Production,
}

/// Borrowed view of everything a building touches outside its province.
pub struct Economy<'a> {
    pub acting_state: &'a str,
    pub catalog: &'a BuildingCatalog,
    pub config: &'a SimConfig,
    pub state: &'a mut StateContext,
    pub ledger: &'a mut ResourceLedger,
    pub metrics: &'a mut StateMetrics,
}

/// Per-province scratch carried across that province's buildings.
#[derive(Debug, Default)]
pub struct ProvinceScratch {
    /// Land not yet allocated to a building this tick.
    pub free_land: u64,
    pub used_land: u64,
    pub notices: Vec<ProvinceNotice>,
}

/// Runs the pipeline for `province.buildings[index]`.
///
/// Returns the stage that deactivated the building, if any.
pub fn process_building(
    economy: &mut Economy<'_>,
    province: &mut ProvinceState,
    index: usize,
    scratch: &mut ProvinceScratch,
    events: &mut EventLog,
) -> Option<Stage> {
    let mut building = province.buildings[index].clone();
    building.reset();

    let halted = run_stages(economy, province, &mut building, scratch, events).err();
    if let Some(stage) = halted {
        building.status = BuildingStatus::Inactive;
        log::trace!(
            "{} in province {} halted at {:?}",
            building.name,
            province.province_id,
            stage
        );
    }

    province.buildings[index] = building;
    halted
}

fn run_stages(
    economy: &mut Economy<'_>,
    province: &mut ProvinceState,
    building: &mut Building,
    scratch: &mut ProvinceScratch,
    events: &mut EventLog,
) -> Result<(), Stage> {
    let Some(template) = economy.catalog.get(&building.name) else {
        log::warn!(
            "No template for building {} in province {}",
            building.name,
            province.province_id
        );
        events.push(TickEvent::TemplateMissing {
            province: province.province_id.clone(),
            building: building.name.clone(),
        });
        return Err(Stage::Template);
    };
    let efficiency = template.modifiers.resolve();

    let notices = eligibility::check_building(
        template,
        &building.building_owner,
        province,
        economy.acting_state,
        economy.state,
    );
    if !notices.is_empty() {
        scratch.notices.extend(notices);
        return Err(Stage::Eligibility);
    }

    assign_workers(economy, template, province, building, scratch)?;
    assign_land(template, building, scratch)?;
    consume(economy, template, efficiency, building, scratch)?;
    produce(economy, template, efficiency, building, scratch)?;

    // Corporate tax on foreign-owned buildings.
    if building.building_owner != economy.acting_state && building.is_active() {
        let tax = building.incomes.mul(economy.state.corporate_tax);
        building.expenses += tax;
        economy.metrics.corporate_tax_income += tax;
    }

    if building.is_active() {
        template.grant_attributes(&mut province.province_attributes, &mut economy.state.attributes);
        extract(economy, template, efficiency, province, building, scratch);
    }

    if building.building_owner == economy.acting_state {
        economy.metrics.state_buildings_income += building.incomes;
        economy.metrics.state_buildings_expenses += building.expenses;
    }
    Ok(())
}

fn assign_workers(
    economy: &mut Economy<'_>,
    template: &BuildingTemplate,
    province: &mut ProvinceState,
    building: &mut Building,
    scratch: &mut ProvinceScratch,
) -> Result<(), Stage> {
    let required = template.required_workers;
    let free = province.free_workers();
    economy.metrics.workers_required += required;

    if free < required {
        scratch.notices.push(ProvinceNotice::Workers {
            building: building.name.clone(),
            required,
            available: free,
        });
        return Err(Stage::Workers);
    }

    province.occupied_workers += required;
    economy.metrics.workers_occupied += required;
    building.expenses += economy.state.average_salary.mul_int(required as i64);
    Ok(())
}

fn assign_land(
    template: &BuildingTemplate,
    building: &Building,
    scratch: &mut ProvinceScratch,
) -> Result<(), Stage> {
    let required = template.required_agricultural_land;
    if scratch.free_land < required {
        scratch.notices.push(ProvinceNotice::Land {
            building: building.name.clone(),
            required,
            available: scratch.free_land,
        });
        return Err(Stage::Land);
    }
    scratch.free_land -= required;
    scratch.used_land += required;
    Ok(())
}

/// Check-then-commit: stock moves only if every input is available.
fn consume(
    economy: &mut Economy<'_>,
    template: &BuildingTemplate,
    efficiency: Efficiency,
    building: &mut Building,
    scratch: &mut ProvinceScratch,
) -> Result<(), Stage> {
    let mut shortages = Vec::new();
    let mut plan = Vec::with_capacity(template.consumption.len());

    for (resource, &base) in &template.consumption {
        let required = base.mul(efficiency.consumption);
        let Some(entry) = economy.ledger.get_mut(resource) else {
            shortages.push(Shortage::Unknown {
                resource: resource.clone(),
            });
            continue;
        };
        entry.demand += required;
        if entry.stock >= required {
            plan.push((resource, required));
        } else {
            shortages.push(Shortage::Insufficient {
                resource: resource.clone(),
                required,
                available: entry.stock,
            });
        }
    }

    if !shortages.is_empty() {
        scratch.notices.push(ProvinceNotice::Consumption {
            building: building.name.clone(),
            shortages,
        });
        return Err(Stage::Consumption);
    }

    let mut cost = Fixed::ZERO;
    for (resource, required) in plan {
        if let Some(entry) = economy.ledger.get_mut(resource) {
            entry.stock -= required;
            cost += required.mul(entry.price);
        }
    }
    building.expenses += cost;
    Ok(())
}

/// Check-then-commit: output is delivered only if every product is tracked.
fn produce(
    economy: &mut Economy<'_>,
    template: &BuildingTemplate,
    efficiency: Efficiency,
    building: &mut Building,
    scratch: &mut ProvinceScratch,
) -> Result<(), Stage> {
    let shortages: Vec<Shortage> = template
        .production
        .keys()
        .filter(|resource| !economy.ledger.contains(resource))
        .map(|resource| Shortage::Unknown {
            resource: resource.clone(),
        })
        .collect();
    if !shortages.is_empty() {
        scratch.notices.push(ProvinceNotice::Production {
            building: building.name.clone(),
            shortages,
        });
        return Err(Stage::Production);
    }

    let mut income = Fixed::ZERO;
    for (resource, &base) in &template.production {
        let produced = base.mul(efficiency.production);
        if let Some(entry) = economy.ledger.get_mut(resource) {
            entry.stock += produced;
            entry.supply += produced;
            income += produced.mul(entry.price);
        }
    }
    building.incomes += income;
    Ok(())
}

/// Draws from province deposits. Problems here never deactivate the building.
fn extract(
    economy: &mut Economy<'_>,
    template: &BuildingTemplate,
    efficiency: Efficiency,
    province: &mut ProvinceState,
    building: &mut Building,
    scratch: &mut ProvinceScratch,
) {
    for (resource, &base) in &template.resource_extraction {
        let amount = base.mul(efficiency.extraction);
        if amount <= Fixed::ZERO {
            continue;
        }
        let Some(entry) = economy.ledger.get_mut(resource) else {
            log::warn!("Extracted resource {resource} is not tracked by the ledger");
            scratch.notices.push(ProvinceNotice::ExtractionUnknownResource {
                building: building.name.clone(),
                resource: resource.clone(),
            });
            continue;
        };

        let deposit = province
            .resources
            .iter()
            .position(|d| d.name == *resource)
            .map(|i| (i, province.resources[i].quantity));

        let extracted = match deposit {
            Some((i, quantity)) if quantity > amount => {
                province.resources[i].quantity = quantity - amount;
                let cycles = (quantity - amount).div(amount).floor();
                if cycles <= i64::from(economy.config.depletion_warning_cycles) {
                    scratch.notices.push(ProvinceNotice::DepositDepleting {
                        building: building.name.clone(),
                        resource: resource.clone(),
                        cycles,
                    });
                }
                amount
            }
            Some((i, quantity)) if quantity > Fixed::ZERO => {
                province.resources.remove(i);
                scratch.notices.push(ProvinceNotice::DepositDepleted {
                    building: building.name.clone(),
                    resource: resource.clone(),
                });
                quantity
            }
            _ => {
                scratch.notices.push(ProvinceNotice::DepositNotFound {
                    building: building.name.clone(),
                    resource: resource.clone(),
                });
                continue;
            }
        };

        entry.stock += extracted;
        entry.supply += extracted;
        building.incomes += extracted.mul(entry.price);
    }
}
