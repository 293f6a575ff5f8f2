use crate::attributes::AttributeKey;
use crate::buildings::BuildingTemplate;
use crate::fixed::Fixed;
use crate::state::{Building, BuildingStatus, ProvinceState, ResourceDeposit, WorldState};

/// Fluent builder for test worlds.
pub struct WorldStateBuilder {
    state: WorldState,
}

impl WorldStateBuilder {
    pub fn new(acting_state: &str) -> Self {
        let mut state = WorldState {
            acting_state: acting_state.to_string(),
            ..Default::default()
        };
        state.state.workers_coefficient = Fixed::ONE;
        Self { state }
    }

    pub fn workers_coefficient(mut self, value: Fixed) -> Self {
        self.state.state.workers_coefficient = value;
        self
    }

    pub fn average_salary(mut self, value: Fixed) -> Self {
        self.state.state.average_salary = value;
        self
    }

    pub fn corporate_tax(mut self, value: Fixed) -> Self {
        self.state.state.corporate_tax = value;
        self
    }

    pub fn stability(mut self, value: Fixed) -> Self {
        self.state.state.stability = value;
        self
    }

    pub fn state_attribute(mut self, key: AttributeKey, value: Fixed) -> Self {
        self.state.state.attributes.set(key, value);
        self
    }

    pub fn template(mut self, template: BuildingTemplate) -> Self {
        self.state.catalog.insert(template);
        self
    }

    pub fn resource(mut self, name: &str, price: Fixed, stock: Fixed) -> Self {
        self.state.ledger.insert(name, price, stock);
        self
    }

    pub fn province(
        mut self,
        id: &str,
        owner: &str,
        configure: impl FnOnce(ProvinceBuilder) -> ProvinceBuilder,
    ) -> Self {
        let builder = ProvinceBuilder {
            province: ProvinceState {
                province_id: id.to_string(),
                owner: owner.to_string(),
                ..Default::default()
            },
        };
        self.state.provinces.push(configure(builder).province);
        self
    }

    pub fn build(self) -> WorldState {
        self.state
    }
}

pub struct ProvinceBuilder {
    province: ProvinceState,
}

impl ProvinceBuilder {
    /// Sets population; with the default coefficient of one this is also the
    /// worker pool a tick computes.
    pub fn population(mut self, population: u64) -> Self {
        self.province.population = population;
        self
    }

    /// Sets the worker pool directly, bypassing the population formula.
    pub fn workers(mut self, available: u64) -> Self {
        self.province.available_workers = available;
        self.province.population = available;
        self
    }

    pub fn land(mut self, acres: u64) -> Self {
        self.province.agricultural_land = acres;
        self.province.agricultural_land_free = acres;
        self
    }

    pub fn attribute(mut self, key: AttributeKey, value: Fixed) -> Self {
        self.province.province_attributes.set(key, value);
        self
    }

    pub fn deposit(mut self, deposit: ResourceDeposit) -> Self {
        self.province.resources.push(deposit);
        self
    }

    pub fn culture(mut self, culture: &str) -> Self {
        self.province.cultures.push(culture.to_string());
        self
    }

    pub fn building(self, name: &str, owner: &str) -> Self {
        self.building_with(Building::new(name, owner))
    }

    pub fn inactive_building(self, name: &str, owner: &str, countdown: u32) -> Self {
        let mut building = Building::new(name, owner);
        building.status = BuildingStatus::Inactive;
        building.self_destruction = Some(countdown);
        self.building_with(building)
    }

    pub fn building_with(mut self, building: Building) -> Self {
        self.province.buildings.push(building);
        self
    }
}

impl Default for WorldStateBuilder {
    fn default() -> Self {
        Self::new("")
    }
}
