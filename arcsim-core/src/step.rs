use crate::config::{ConfigError, SimConfig};
use crate::event::{EventLog, LogEntry, TickEvent};
use crate::metrics::SimMetrics;
use crate::state::{StateMetrics, WorldState};
use crate::systems::{
    advance_cycle_counts, collect_foreign_income, enforce_building_limits,
    enforce_global_building_limits, enforce_province_building_limits,
    enforce_state_attribute_limits, process_province, refresh_buildable_provinces, Economy,
};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TickError {
    #[error("acting state is not set")]
    NoActingState,
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result of one committed tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub state: WorldState,
    /// Events in emission order.
    pub events: Vec<TickEvent>,
    pub metrics: SimMetrics,
}

impl TickOutcome {
    pub fn elapsed(&self) -> Duration {
        self.metrics.total_time
    }

    /// Rendered `(message, category)` pairs for the journal.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.events
            .iter()
            .map(|e| LogEntry {
                message: e.to_string(),
                category: e.category(),
            })
            .collect()
    }
}

/// Advance the acting state's economy by one tick.
///
/// Works on a clone of `state`: on error the caller's snapshot is untouched,
/// and on success the returned snapshot is the only one carrying the changes.
pub fn step_state(state: &WorldState, config: &SimConfig) -> Result<TickOutcome, TickError> {
    if state.acting_state.is_empty() {
        return Err(TickError::NoActingState);
    }
    config.validate()?;

    let started = Instant::now();
    let span = tracing::info_span!("tick", state = %state.acting_state);
    let _guard = span.enter();

    let mut next = state.clone();
    let mut events = EventLog::new();
    let mut metrics = SimMetrics {
        total_ticks: 1,
        ..Default::default()
    };

    // 1. Fresh aggregates
    next.metrics = StateMetrics::default();
    next.ledger.reset_flows();

    // 2. Owned provinces
    let phase = Instant::now();
    run_owned_provinces(&mut next, config, &mut events);
    metrics.provinces_time = phase.elapsed();

    // 3. Bookkeeping and limits
    let phase = Instant::now();
    let WorldState {
        acting_state,
        provinces,
        catalog,
        state: context,
        metrics: state_metrics,
        ..
    } = &mut next;
    advance_cycle_counts(provinces, acting_state);
    collect_foreign_income(provinces, acting_state, state_metrics);
    enforce_building_limits(catalog, provinces, acting_state, &mut events);
    enforce_province_building_limits(catalog, provinces, acting_state, &mut events);
    enforce_global_building_limits(catalog, provinces, acting_state, &mut events);
    enforce_state_attribute_limits(context, &config.state_attribute_limits, &mut events);
    metrics.limits_time = phase.elapsed();

    // 4. Advisory placement lists
    let phase = Instant::now();
    refresh_buildable_provinces(catalog, provinces, acting_state, context);
    metrics.buildable_time = phase.elapsed();

    metrics.total_time = started.elapsed();
    log::info!(
        "{}: tick done in {:.2}ms, {} events",
        next.acting_state,
        metrics.total_time.as_secs_f64() * 1000.0,
        events.len()
    );
    crate::profiling::frame_mark_cycle();

    Ok(TickOutcome {
        state: next,
        events: events.into_events(),
        metrics,
    })
}

#[instrument(skip_all, name = "provinces")]
fn run_owned_provinces(world: &mut WorldState, config: &SimConfig, events: &mut EventLog) {
    let WorldState {
        acting_state,
        provinces,
        catalog,
        state,
        ledger,
        metrics,
    } = world;
    let acting_state: &str = acting_state;
    let mut economy = Economy {
        acting_state,
        catalog,
        config,
        state,
        ledger,
        metrics,
    };

    let mut owned = 0usize;
    for province in provinces.iter_mut().filter(|p| p.owner == acting_state) {
        process_province(&mut economy, province, events);
        owned += 1;
    }
    if owned == 0 {
        log::warn!("State {} owns no provinces", acting_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingTemplate;
    use crate::fixed::Fixed;
    use crate::testing::WorldStateBuilder;

    #[test]
    fn test_missing_acting_state_is_an_error() {
        let world = WorldStateBuilder::default().build();
        assert_eq!(
            step_state(&world, &SimConfig::default()).unwrap_err(),
            TickError::NoActingState
        );
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let world = WorldStateBuilder::new("Avalon").build();
        let mut config = SimConfig::default();
        config.state_attribute_limits[0].max = Fixed::from_int(-1);
        assert!(matches!(
            step_state(&world, &config),
            Err(TickError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_input_snapshot_is_untouched() {
        let mut t = BuildingTemplate::new("Farm");
        t.production.insert("grain".into(), Fixed::from_int(3));
        let world = WorldStateBuilder::new("Avalon")
            .template(t)
            .resource("grain", Fixed::ONE, Fixed::ZERO)
            .province("1", "Avalon", |p| p.building("Farm", "Avalon"))
            .build();
        let before = serde_json::to_string(&world).unwrap();

        let outcome = step_state(&world, &SimConfig::default()).unwrap();
        assert_eq!(serde_json::to_string(&world).unwrap(), before);
        assert_eq!(outcome.state.ledger.get("grain").unwrap().stock, Fixed::from_int(3));
        assert_eq!(outcome.metrics.total_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        let mut t = BuildingTemplate::new("Farm");
        t.production.insert("grain".into(), Fixed::from_int(3));
        t.required_workers = 5;
        let world = WorldStateBuilder::new("Avalon")
            .template(t)
            .resource("grain", Fixed::ONE, Fixed::ZERO)
            .province("1", "Avalon", |p| p.population(4).building("Farm", "Avalon"))
            .province("2", "Avalon", |p| p.population(40).building("Farm", "Avalon"))
            .build();

        let a = step_state(&world, &SimConfig::default()).unwrap();
        let b = step_state(&world, &SimConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&a.state).unwrap(),
            serde_json::to_string(&b.state).unwrap()
        );
        assert_eq!(a.events, b.events);
    }
}
