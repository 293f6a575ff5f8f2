//! Building templates and the catalog they live in.
//!
//! A template is the immutable-per-tick definition of a building type: what
//! it needs (workers, land, eligibility criteria, other buildings), what it
//! consumes, produces and extracts, what it grants while active, and how many
//! copies may exist per province, per state, and worldwide.

use crate::attributes::{AttributeKey, AttributeMap};
use crate::criteria::Condition;
use crate::fixed::Fixed;
use crate::modifiers::EfficiencyModifiers;
use crate::state::{Extra, ProvinceId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Province-side eligibility criteria, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvinceCriterion {
    Cultures,
    Landscapes,
    Religions,
    Races,
    Climates,
    Resources,
    Continents,
    Planets,
}

impl ProvinceCriterion {
    pub const ALL: [ProvinceCriterion; 8] = [
        Self::Cultures,
        Self::Landscapes,
        Self::Religions,
        Self::Races,
        Self::Climates,
        Self::Resources,
        Self::Continents,
        Self::Planets,
    ];

    /// Label used in player-facing failure reasons.
    pub fn description(self) -> &'static str {
        match self {
            Self::Cultures => "Культуры",
            Self::Landscapes => "Ландшафты",
            Self::Religions => "Религии",
            Self::Races => "Расы",
            Self::Climates => "Климат",
            Self::Resources => "Ресурсы",
            Self::Continents => "Континенты",
            Self::Planets => "Планеты",
        }
    }
}

/// State-side eligibility criteria, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateCriterion {
    Cultures,
    Religions,
    Races,
    Technologies,
    Laws,
    Stability,
}

impl StateCriterion {
    pub const ALL: [StateCriterion; 6] = [
        Self::Cultures,
        Self::Religions,
        Self::Races,
        Self::Technologies,
        Self::Laws,
        Self::Stability,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::Cultures => "Культуры государства",
            Self::Religions => "Религии государства",
            Self::Races => "Расы государства",
            Self::Technologies => "Технологии",
            Self::Laws => "Законы",
            Self::Stability => "Социальная стабильность",
        }
    }
}

/// Inclusive bounds on a named attribute. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Fixed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Fixed>,
}

/// Static building definition loaded from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingTemplate {
    pub name: String,

    // Inputs
    #[serde(default)]
    pub required_workers: u64,
    #[serde(default)]
    pub required_agricultural_land: u64,

    // Resource flows (resource name -> base quantity per tick)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub consumption: BTreeMap<String, Fixed>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub production: BTreeMap<String, Fixed>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_extraction: BTreeMap<String, Fixed>,
    #[serde(default)]
    pub modifiers: EfficiencyModifiers,

    // Province criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_cultures: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_landscapes: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_religions: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_races: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_climates: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_resources: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_continents: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_province_planets: Option<Condition>,

    // State criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state_cultures: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state_religions: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state_races: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state_technologies: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state_laws: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state_stability: Option<Condition>,

    // Attribute ranges
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub required_province_attributes: BTreeMap<AttributeKey, AttributeRange>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub required_state_attributes: BTreeMap<AttributeKey, AttributeRange>,

    /// Dependency tree over the names of buildings in the same province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_buildings: Option<Condition>,

    // Limits (0 = unlimited)
    /// Zero means unlimited when enforcing, not "none allowed", so it agrees
    /// with the buildable-province lists.
    #[serde(default)]
    pub province_limit: u32,
    #[serde(default)]
    pub global_limit: u32,
    #[serde(default)]
    pub building_limit: u32,

    // Granted while active
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub province_attributes: AttributeMap,
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub state_attributes: AttributeMap,

    /// Advisory: owned provinces where this building could be placed now.
    #[serde(default)]
    pub buildable_provinces: Vec<ProvinceId>,

    #[serde(flatten)]
    pub extra: Extra,
}

fn limit(v: u32) -> Option<u32> {
    (v > 0).then_some(v)
}

impl BuildingTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn province_criterion(&self, criterion: ProvinceCriterion) -> Option<&Condition> {
        match criterion {
            ProvinceCriterion::Cultures => self.required_province_cultures.as_ref(),
            ProvinceCriterion::Landscapes => self.required_province_landscapes.as_ref(),
            ProvinceCriterion::Religions => self.required_province_religions.as_ref(),
            ProvinceCriterion::Races => self.required_province_races.as_ref(),
            ProvinceCriterion::Climates => self.required_province_climates.as_ref(),
            ProvinceCriterion::Resources => self.required_province_resources.as_ref(),
            ProvinceCriterion::Continents => self.required_province_continents.as_ref(),
            ProvinceCriterion::Planets => self.required_province_planets.as_ref(),
        }
    }

    pub fn state_criterion(&self, criterion: StateCriterion) -> Option<&Condition> {
        match criterion {
            StateCriterion::Cultures => self.required_state_cultures.as_ref(),
            StateCriterion::Religions => self.required_state_religions.as_ref(),
            StateCriterion::Races => self.required_state_races.as_ref(),
            StateCriterion::Technologies => self.required_state_technologies.as_ref(),
            StateCriterion::Laws => self.required_state_laws.as_ref(),
            StateCriterion::Stability => self.required_state_stability.as_ref(),
        }
    }

    /// Per-province cap, if any.
    pub fn province_limit(&self) -> Option<u32> {
        limit(self.province_limit)
    }

    /// Worldwide cap across every state, if any.
    pub fn global_limit(&self) -> Option<u32> {
        limit(self.global_limit)
    }

    /// Cap across the acting state's provinces, if any.
    pub fn building_limit(&self) -> Option<u32> {
        limit(self.building_limit)
    }

    /// Grants the template's attribute bonuses.
    pub fn grant_attributes(&self, province: &mut AttributeMap, state: &mut AttributeMap) {
        province.accumulate(&self.province_attributes);
        state.accumulate(&self.state_attributes);
    }
}

/// Ordered set of templates with lookup by name.
///
/// Iteration follows catalog order; every limit pass and the buildable
/// generator rely on it being stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BuildingTemplate>", into = "Vec<BuildingTemplate>")]
pub struct BuildingCatalog {
    templates: Vec<BuildingTemplate>,
    by_name: FxHashMap<String, usize>,
}

impl BuildingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template. A template with the same name replaces the earlier
    /// one in place; the replaced definition is returned.
    pub fn insert(&mut self, template: BuildingTemplate) -> Option<BuildingTemplate> {
        match self.by_name.get(&template.name) {
            Some(&idx) => Some(std::mem::replace(&mut self.templates[idx], template)),
            None => {
                self.by_name
                    .insert(template.name.clone(), self.templates.len());
                self.templates.push(template);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&BuildingTemplate> {
        self.by_name.get(name).map(|&idx| &self.templates[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BuildingTemplate> {
        match self.by_name.get(name) {
            Some(&idx) => Some(&mut self.templates[idx]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuildingTemplate> {
        self.templates.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BuildingTemplate> {
        self.templates.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl From<Vec<BuildingTemplate>> for BuildingCatalog {
    fn from(templates: Vec<BuildingTemplate>) -> Self {
        let mut catalog = BuildingCatalog::new();
        for template in templates {
            catalog.insert(template);
        }
        catalog
    }
}

impl From<BuildingCatalog> for Vec<BuildingTemplate> {
    fn from(catalog: BuildingCatalog) -> Self {
        catalog.templates
    }
}

impl FromIterator<BuildingTemplate> for BuildingCatalog {
    fn from_iter<I: IntoIterator<Item = BuildingTemplate>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}
