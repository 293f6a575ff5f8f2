//! Tick systems, leaf first.

pub mod attribute_limits;
pub mod buildable;
pub mod building;
pub mod eligibility;
pub mod limits;
pub mod province;
pub mod self_destruction;

pub use attribute_limits::{enforce_province_attribute_limits, enforce_state_attribute_limits};
pub use buildable::{buildable_provinces, refresh_buildable_provinces};
pub use building::{process_building, Economy, ProvinceScratch, Stage};
pub use limits::{
    enforce_building_limits, enforce_global_building_limits, enforce_province_building_limits,
};
pub use province::{advance_cycle_counts, collect_foreign_income, process_province};
pub use self_destruction::run_self_destruction;
