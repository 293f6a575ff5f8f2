//! JSON snapshot storage.
//!
//! A snapshot document carries one state's view of the world:
//!
//! ```json
//! {
//!   "state_name": "Avalon",
//!   "state_modifiers": {"workers_coefficient": 0.5, "average_salary": 2, ...},
//!   "attributes": {"science_points": 120},
//!   "state_metrics": {...},
//!   "cultures": [...], "religions": [...], "races": [...],
//!   "technologies": [{"name": "Plough", "status": "Изучена"}],
//!   "laws": [{"name": "Guilds", "status": "Принят"}],
//!   "provinces": [{...}, null, ...],
//!   "building_templates": [{...}, ...],
//!   "resources": [{"name": "grain", "countries": {"Avalon": {"price": 3, "stock": 10}}}]
//! }
//! ```
//!
//! Malformed records are logged and skipped. Saving writes back into the
//! loaded document so fields this crate does not model survive untouched.

use anyhow::{bail, Context, Result};
use arcsim_core::{AttributeMap, BuildingTemplate, Fixed, ProvinceState, StateContext, WorldState};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

const LEARNED: [&str; 2] = ["Изучена", "Learned"];
const ENACTED: [&str; 2] = ["Принят", "Enacted"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StateModifiers {
    workers_coefficient: Fixed,
    average_salary: Fixed,
    corporate_tax: Fixed,
    social_stability: Fixed,
}

/// A technology or law record; only the status decides whether it counts.
#[derive(Debug, Deserialize)]
struct StatusEntry {
    name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct ResourceRecord {
    name: String,
    #[serde(default)]
    countries: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarketSlice {
    price: Fixed,
    stock: Fixed,
}

/// A loaded snapshot document and the world parsed out of it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    document: Map<String, Value>,
    /// For every raw `provinces` entry, its index in `world.provinces`.
    province_slots: Vec<Option<usize>>,
    /// For every raw `building_templates` entry, the template it defined.
    /// Shadowed duplicates have no slot and are saved untouched.
    template_slots: Vec<Option<String>>,
    world: WorldState,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading snapshot from {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid snapshot {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("Snapshot is not valid JSON")?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(document) = value else {
            bail!("Snapshot root must be a JSON object");
        };

        let acting_state = match document.get("state_name") {
            Some(Value::String(name)) => name.clone(),
            _ => {
                log::warn!("Snapshot has no state_name");
                String::new()
            }
        };

        let modifiers: StateModifiers = section(&document, "state_modifiers");
        let mut world = WorldState {
            acting_state,
            state: StateContext {
                cultures: section(&document, "cultures"),
                religions: section(&document, "religions"),
                races: section(&document, "races"),
                technologies: statuses(&document, "technologies", &LEARNED),
                laws: statuses(&document, "laws", &ENACTED),
                stability: modifiers.social_stability,
                workers_coefficient: modifiers.workers_coefficient,
                average_salary: modifiers.average_salary,
                corporate_tax: modifiers.corporate_tax,
                attributes: section::<AttributeMap>(&document, "attributes"),
            },
            ..Default::default()
        };

        let mut province_slots = Vec::new();
        for record in records::<ProvinceState>(&document, "provinces") {
            province_slots.push(record.map(|province| {
                world.provinces.push(province);
                world.provinces.len() - 1
            }));
        }

        let mut template_slots = Vec::new();
        for record in records::<BuildingTemplate>(&document, "building_templates") {
            let slot = match record {
                Some(template) if template.name.is_empty() => {
                    log::warn!("Skipping building template without a name");
                    None
                }
                Some(template) => {
                    let name = template.name.clone();
                    if world.catalog.insert(template).is_some() {
                        log::warn!("Duplicate building template {name}; the later one wins");
                    }
                    Some(name)
                }
                None => None,
            };
            template_slots.push(slot);
        }
        let mut seen = HashSet::new();
        for slot in template_slots.iter_mut().rev() {
            if slot.as_ref().is_some_and(|name| !seen.insert(name.clone())) {
                *slot = None;
            }
        }

        for record in records::<ResourceRecord>(&document, "resources").into_iter().flatten() {
            let slice = match record.countries.get(&world.acting_state) {
                Some(raw) => MarketSlice::deserialize(raw).unwrap_or_else(|e| {
                    log::warn!("Malformed market data for {}: {e}", record.name);
                    MarketSlice::default()
                }),
                None => MarketSlice::default(),
            };
            world.ledger.insert(record.name, slice.price, slice.stock);
        }

        log::info!(
            "Loaded {}: {} provinces ({} owned), {} templates",
            world.acting_state,
            world.provinces.len(),
            world.owned_province_indices().len(),
            world.catalog.len()
        );
        Ok(Self {
            document,
            province_slots,
            template_slots,
            world,
        })
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// The loaded document with `world` written over the parts it models.
    pub fn to_value(&self, world: &WorldState) -> Result<Value> {
        let mut document = self.document.clone();

        if let Some(Value::Array(raw)) = document.get_mut("provinces") {
            for (entry, slot) in raw.iter_mut().zip(&self.province_slots) {
                if let Some(province) = slot.and_then(|i| world.provinces.get(i)) {
                    *entry = serde_json::to_value(province)?;
                }
            }
        }

        if let Some(Value::Array(raw)) = document.get_mut("building_templates") {
            for (entry, slot) in raw.iter_mut().zip(&self.template_slots) {
                if let Some(template) = slot.as_deref().and_then(|name| world.catalog.get(name)) {
                    *entry = serde_json::to_value(template)?;
                }
            }
        }

        if let Some(Value::Array(raw)) = document.get_mut("resources") {
            for record in raw.iter_mut() {
                patch_market_slice(record, world)?;
            }
        }

        document.insert(
            "attributes".to_string(),
            serde_json::to_value(&world.state.attributes)?,
        );
        document.insert("state_metrics".to_string(), serde_json::to_value(&world.metrics)?);
        Ok(Value::Object(document))
    }

    pub fn save(&self, world: &WorldState, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.to_value(world)?)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        log::info!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

/// Updates the acting state's `price/stock/supply/demand` in one resource
/// record. Records without a slice for the state are left alone.
fn patch_market_slice(record: &mut Value, world: &WorldState) -> Result<()> {
    let Some(name) = record.get("name").and_then(Value::as_str) else {
        return Ok(());
    };
    let Some(entry) = world.ledger.get(name).copied() else {
        return Ok(());
    };
    let Some(Value::Object(slice)) = record
        .get_mut("countries")
        .and_then(|c| c.get_mut(&world.acting_state))
    else {
        return Ok(());
    };
    slice.insert("price".to_string(), serde_json::to_value(entry.price)?);
    slice.insert("stock".to_string(), serde_json::to_value(entry.stock)?);
    slice.insert("supply".to_string(), serde_json::to_value(entry.supply)?);
    slice.insert("demand".to_string(), serde_json::to_value(entry.demand)?);
    Ok(())
}

/// Reads an optional section; a malformed one is logged and replaced by the default.
fn section<T: DeserializeOwned + Default>(document: &Map<String, Value>, key: &str) -> T {
    match document.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(raw) => T::deserialize(raw).unwrap_or_else(|e| {
            log::warn!("Malformed {key} section: {e}");
            T::default()
        }),
    }
}

/// Parses every entry of an array section. Null and malformed entries yield
/// `None` so their positions are kept.
fn records<T: DeserializeOwned>(document: &Map<String, Value>, key: &str) -> Vec<Option<T>> {
    let Some(raw) = document.get(key) else {
        return Vec::new();
    };
    let Value::Array(entries) = raw else {
        log::warn!("{key} section is not an array");
        return Vec::new();
    };
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            if entry.is_null() {
                return None;
            }
            T::deserialize(entry)
                .map_err(|e| log::warn!("Skipping malformed {key}[{i}]: {e}"))
                .ok()
        })
        .collect()
}

/// Names of the entries whose status is one of `accepted`.
fn statuses(document: &Map<String, Value>, key: &str, accepted: &[&str]) -> Vec<String> {
    records::<StatusEntry>(document, key)
        .into_iter()
        .flatten()
        .filter(|entry| accepted.contains(&entry.status.as_str()))
        .map(|entry| entry.name)
        .collect()
}
