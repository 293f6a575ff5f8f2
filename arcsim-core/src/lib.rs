//! # Arcanum Economy Simulation Core
//!
//! Deterministic rule engine for one state's economic turn: building
//! eligibility, resource flows, worker and land allocation, demolition of
//! idle buildings, and building caps.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   Loader    │────▶│  WorldState  │────▶│ step_state  │
//! │  (runner)   │     │  (snapshot)  │     │ (pure fn)   │
//! └─────────────┘     └──────────────┘     └──────┬──────┘
//!                                                 │
//!                     ┌──────────────┐     ┌──────▼──────┐
//!                     │   Journal    │◀────│ TickOutcome │
//!                     │  (runner)    │     │ state+events│
//!                     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`WorldState`] | Provinces, catalog, state context, ledger, metrics |
//! | [`BuildingTemplate`] | Requirements and effects of a building type |
//! | [`Condition`] | Criteria DSL expression tree |
//! | [`step_state`] | Pure function: `(state, config) -> outcome` |
//! | [`TickEvent`] | Player-facing event with a journal category |
//!
//! ## Tick order
//!
//! 1. Reset metrics and ledger flows
//! 2. Owned provinces: buildings, demolition sweep, attribute clamping
//! 3. Cycle counts, foreign income
//! 4. State, province, and global building limits
//! 5. State attribute clamping
//! 6. Buildable-province lists

pub mod attributes;
pub mod bounded;
pub mod buildings;
pub mod config;
pub mod criteria;
pub mod event;
pub mod fixed;
pub mod metrics;
pub mod modifiers;
pub mod profiling;
pub mod state;
pub mod step;
pub mod systems;
pub mod testing;


pub use attributes::{AttributeKey, AttributeMap};
pub use bounded::AttributeLimit;
pub use buildings::{AttributeRange, BuildingCatalog, BuildingTemplate};
pub use config::{ConfigError, SimConfig};
pub use criteria::{evaluate, Condition, CriteriaError, CriteriaValue, Evaluation};
pub use event::{EventCategory, EventLog, LogEntry, ProvinceNotice, TickEvent};
pub use fixed::Fixed;
pub use metrics::SimMetrics;
pub use modifiers::{Efficiency, EfficiencyModifiers};
pub use state::{
    Building, BuildingStatus, LedgerEntry, ProvinceState, ResourceDeposit, ResourceLedger,
    StateContext, StateMetrics, WorldState,
};
pub use step::{step_state, TickError, TickOutcome};
