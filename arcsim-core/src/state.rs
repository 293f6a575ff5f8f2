use crate::attributes::AttributeMap;
use crate::buildings::{BuildingCatalog, ProvinceCriterion, StateCriterion};
use crate::criteria::CriteriaValue;
use crate::fixed::Fixed;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// State (nation) identifier.
pub type Tag = String;
pub type ProvinceId = String;

/// Opaque fields carried through a load/save cycle untouched.
pub type Extra = Map<String, Value>;

/// A whole-number count read leniently: null is zero, fractions are floored,
/// negatives read as zero and numeric strings are accepted.
#[derive(Clone, Copy)]
struct Count(u64);

struct CountVisitor;

impl Visitor<'_> for CountVisitor {
    type Value = Count;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a whole number, a numeric string, or null")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Count, E> {
        Ok(Count(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Count, E> {
        Ok(Count(u64::try_from(v).unwrap_or(0)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Count, E> {
        // `as` saturates; NaN reads as zero.
        Ok(Count(v.floor() as u64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Count, E> {
        let trimmed = v.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => Ok(Count(n)),
            Err(_) => trimmed
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid count: {v:?}")))
                .and_then(|f| self.visit_f64(f)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Count, E> {
        Ok(Count(0))
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CountVisitor)
    }
}

impl Count {
    fn saturating_u32(self) -> u32 {
        u32::try_from(self.0).unwrap_or(u32::MAX)
    }
}

fn deserialize_count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Count::deserialize(d).map(|c| c.0)
}

fn deserialize_count_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Count::deserialize(d).map(Count::saturating_u32)
}

fn deserialize_optional_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Option::<Count>::deserialize(d).map(|c| c.map(Count::saturating_u32))
}

/// Lifecycle status of a building for the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingStatus {
    #[default]
    #[serde(rename = "Активная", alias = "Active")]
    Active,
    #[serde(rename = "Неактивная", alias = "Inactive")]
    Inactive,
}

/// A building instance placed in a province.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Name of the [`BuildingTemplate`](crate::buildings::BuildingTemplate).
    pub name: String,
    #[serde(default)]
    pub building_owner: Tag,
    #[serde(default)]
    pub status: BuildingStatus,
    #[serde(default)]
    pub incomes: Fixed,
    #[serde(default)]
    pub expenses: Fixed,
    /// Turns this building has existed. Only ever incremented.
    #[serde(default, deserialize_with = "deserialize_count_u32")]
    pub cycle_count: u32,
    /// Turns left before an inactive building is demolished.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub self_destruction: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Building {
    pub fn new(name: impl Into<String>, owner: impl Into<Tag>) -> Self {
        Self {
            name: name.into(),
            building_owner: owner.into(),
            status: BuildingStatus::Active,
            incomes: Fixed::ZERO,
            expenses: Fixed::ZERO,
            cycle_count: 0,
            self_destruction: None,
            extra: Extra::new(),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == BuildingStatus::Active
    }

    /// Start-of-tick reset: zero the books and assume the building runs.
    pub fn reset(&mut self) {
        self.incomes = Fixed::ZERO;
        self.expenses = Fixed::ZERO;
        self.status = BuildingStatus::Active;
    }
}

/// A natural resource deposit in a province, stored as `"name:quantity"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeposit {
    pub name: String,
    pub quantity: Fixed,
}

impl ResourceDeposit {
    pub fn new(name: impl Into<String>, quantity: Fixed) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }

    /// Lenient parse: a missing or unreadable quantity reads as zero.
    pub fn parse(entry: &str) -> Self {
        match entry.split_once(':') {
            Some((name, qty)) => Self {
                name: name.to_string(),
                quantity: qty.parse().unwrap_or(Fixed::ZERO),
            },
            None => Self {
                name: entry.to_string(),
                quantity: Fixed::ZERO,
            },
        }
    }
}

impl std::fmt::Display for ResourceDeposit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.quantity)
    }
}

impl Serialize for ResourceDeposit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceDeposit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entry = String::deserialize(deserializer)?;
        Ok(ResourceDeposit::parse(&entry))
    }
}

/// Province identifiers appear both as strings and as bare numbers.
fn deserialize_province_id<'de, D: Deserializer<'de>>(d: D) -> Result<ProvinceId, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "province_id must be a string or number, found {other}"
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvinceState {
    #[serde(deserialize_with = "deserialize_province_id")]
    pub province_id: ProvinceId,
    #[serde(default)]
    pub owner: Tag,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub population: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub available_workers: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub occupied_workers: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub agricultural_land: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub agricultural_land_used: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub agricultural_land_free: u64,
    #[serde(default)]
    pub cultures: Vec<String>,
    #[serde(default)]
    pub landscapes: Vec<String>,
    #[serde(default)]
    pub religions: Vec<String>,
    #[serde(default)]
    pub races: Vec<String>,
    #[serde(default)]
    pub climates: Vec<String>,
    #[serde(default)]
    pub continents: Vec<String>,
    #[serde(default)]
    pub planets: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceDeposit>,
    #[serde(default)]
    pub province_attributes: AttributeMap,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ProvinceState {
    /// Values a province criterion is checked against. Resource deposits are
    /// reduced to their names.
    pub fn criterion_values(&self, criterion: ProvinceCriterion) -> Cow<'_, [String]> {
        match criterion {
            ProvinceCriterion::Cultures => Cow::Borrowed(&self.cultures),
            ProvinceCriterion::Landscapes => Cow::Borrowed(&self.landscapes),
            ProvinceCriterion::Religions => Cow::Borrowed(&self.religions),
            ProvinceCriterion::Races => Cow::Borrowed(&self.races),
            ProvinceCriterion::Climates => Cow::Borrowed(&self.climates),
            ProvinceCriterion::Continents => Cow::Borrowed(&self.continents),
            ProvinceCriterion::Planets => Cow::Borrowed(&self.planets),
            ProvinceCriterion::Resources => {
                Cow::Owned(self.resources.iter().map(|r| r.name.clone()).collect())
            }
        }
    }

    /// Names of the buildings currently standing here, in stored order.
    pub fn building_names(&self) -> Vec<String> {
        self.buildings.iter().map(|b| b.name.clone()).collect()
    }

    pub fn count_buildings(&self, name: &str) -> usize {
        self.buildings.iter().filter(|b| b.name == name).count()
    }

    #[inline]
    pub fn free_workers(&self) -> u64 {
        self.available_workers.saturating_sub(self.occupied_workers)
    }
}

/// The acting state's own context: identity lists, modifiers, and attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateContext {
    pub cultures: Vec<String>,
    pub religions: Vec<String>,
    pub races: Vec<String>,
    /// Learned technologies only.
    pub technologies: Vec<String>,
    /// Enacted laws only.
    pub laws: Vec<String>,
    pub stability: Fixed,
    pub workers_coefficient: Fixed,
    pub average_salary: Fixed,
    pub corporate_tax: Fixed,
    pub attributes: AttributeMap,
}

impl StateContext {
    pub fn criterion_value(&self, criterion: StateCriterion) -> CriteriaValue<'_> {
        match criterion {
            StateCriterion::Cultures => CriteriaValue::List(&self.cultures),
            StateCriterion::Religions => CriteriaValue::List(&self.religions),
            StateCriterion::Races => CriteriaValue::List(&self.races),
            StateCriterion::Technologies => CriteriaValue::List(&self.technologies),
            StateCriterion::Laws => CriteriaValue::List(&self.laws),
            StateCriterion::Stability => CriteriaValue::Number(self.stability),
        }
    }
}

/// Per-resource market record, scoped to the acting state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub price: Fixed,
    pub stock: Fixed,
    /// Cumulative amount produced or extracted this tick.
    pub supply: Fixed,
    /// Cumulative amount requested by consumers this tick.
    pub demand: Fixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLedger(BTreeMap<String, LedgerEntry>);

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, price: Fixed, stock: Fixed) {
        self.0.insert(
            name.into(),
            LedgerEntry {
                price,
                stock,
                ..Default::default()
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&LedgerEntry> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LedgerEntry> {
        self.0.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Zero cumulative supply and demand at the start of a tick.
    pub fn reset_flows(&mut self) {
        for entry in self.0.values_mut() {
            entry.supply = Fixed::ZERO;
            entry.demand = Fixed::ZERO;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Aggregate per-tick metrics for the acting state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMetrics {
    pub corporate_tax_income: Fixed,
    pub state_buildings_income: Fixed,
    pub state_buildings_expenses: Fixed,
    pub state_buildings_income_foreign: Fixed,
    pub state_buildings_expenses_foreign: Fixed,
    pub workers_available: u64,
    pub workers_occupied: u64,
    pub workers_required: u64,
    pub agricultural_land_total: u64,
    pub agricultural_land_used: u64,
    pub agricultural_land_free: u64,
}

/// In-memory world snapshot for one state's turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    /// State the tick is computed for.
    pub acting_state: Tag,
    /// Every known province, in stored order.
    pub provinces: Vec<ProvinceState>,
    pub catalog: BuildingCatalog,
    pub state: StateContext,
    pub ledger: ResourceLedger,
    pub metrics: StateMetrics,
}

impl WorldState {
    pub fn is_owned(&self, province: &ProvinceState) -> bool {
        province.owner == self.acting_state
    }

    /// Indices of provinces owned by the acting state, in stored order.
    pub fn owned_province_indices(&self) -> Vec<usize> {
        self.provinces
            .iter()
            .enumerate()
            .filter(|(_, p)| self.is_owned(p))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn province(&self, id: &str) -> Option<&ProvinceState> {
        self.provinces.iter().find(|p| p.province_id == id)
    }
}
