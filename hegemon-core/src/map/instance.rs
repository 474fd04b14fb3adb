//! Mutable map state: province instances and their container.

use crate::country::CountryId;
use crate::economy::rgo::ResourceGatheringOperation;
use crate::fixed::Fixed;
use crate::map::definition::MapDefinition;
use crate::map::province::ProvinceIndex;
use crate::map::state::{StateId, StateManager};
use crate::modifier::{ModifierId, ModifierSum};
use crate::pop::{Pop, PopSize, PopTypeManager};
use crate::types::date::Date;
use serde::{Deserialize, Serialize};

/// How integrated a province is with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColonyStatus {
    #[default]
    State,
    Protectorate,
    Colony,
}

impl ColonyStatus {
    pub const fn name(self) -> &'static str {
        match self {
            ColonyStatus::State => "state",
            ColonyStatus::Protectorate => "protectorate",
            ColonyStatus::Colony => "colony",
        }
    }
}

/// A named modifier applied to a province, with an optional expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveModifier {
    pub modifier: ModifierId,
    pub expiry: Option<Date>,
}

/// Mutable per-province state: ownership, pops, the RGO, applied modifiers
/// and cached aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceInstance {
    province: ProvinceIndex,
    owner: Option<CountryId>,
    colony_status: ColonyStatus,
    state: Option<StateId>,
    pops: Vec<Pop>,
    rgo: ResourceGatheringOperation,
    modifier_sum: ModifierSum,
    buildings: Vec<ModifierId>,
    event_modifiers: Vec<ActiveModifier>,
    total_population: PopSize,
    average_literacy: Fixed,
    average_consciousness: Fixed,
    average_militancy: Fixed,
    pop_type_distribution: Vec<PopSize>,
    max_supported_regiments: i64,
}

impl ProvinceInstance {
    pub(crate) fn new(province: ProvinceIndex, pop_type_count: usize) -> Self {
        Self {
            province,
            owner: None,
            colony_status: ColonyStatus::default(),
            state: None,
            pops: Vec::new(),
            rgo: ResourceGatheringOperation::new(pop_type_count),
            modifier_sum: ModifierSum::new(),
            buildings: Vec::new(),
            event_modifiers: Vec::new(),
            total_population: 0,
            average_literacy: Fixed::ZERO,
            average_consciousness: Fixed::ZERO,
            average_militancy: Fixed::ZERO,
            pop_type_distribution: vec![0; pop_type_count],
            max_supported_regiments: 0,
        }
    }

    pub fn province(&self) -> ProvinceIndex {
        self.province
    }

    pub fn owner(&self) -> Option<CountryId> {
        self.owner
    }

    pub fn colony_status(&self) -> ColonyStatus {
        self.colony_status
    }

    pub fn state(&self) -> Option<StateId> {
        self.state
    }

    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }

    pub fn pops_mut(&mut self) -> &mut [Pop] {
        &mut self.pops
    }

    pub fn rgo(&self) -> &ResourceGatheringOperation {
        &self.rgo
    }

    pub fn rgo_mut(&mut self) -> &mut ResourceGatheringOperation {
        &mut self.rgo
    }

    pub fn modifier_sum(&self) -> &ModifierSum {
        &self.modifier_sum
    }

    pub(crate) fn modifier_sum_mut(&mut self) -> &mut ModifierSum {
        &mut self.modifier_sum
    }

    pub fn buildings(&self) -> &[ModifierId] {
        &self.buildings
    }

    pub fn event_modifiers(&self) -> &[ActiveModifier] {
        &self.event_modifiers
    }

    pub fn total_population(&self) -> PopSize {
        self.total_population
    }

    pub fn average_literacy(&self) -> Fixed {
        self.average_literacy
    }

    pub fn average_consciousness(&self) -> Fixed {
        self.average_consciousness
    }

    pub fn average_militancy(&self) -> Fixed {
        self.average_militancy
    }

    pub fn pop_type_distribution(&self) -> &[PopSize] {
        &self.pop_type_distribution
    }

    pub fn max_supported_regiments(&self) -> i64 {
        self.max_supported_regiments
    }

    pub(crate) fn set_owner(&mut self, owner: Option<CountryId>) {
        self.owner = owner;
    }

    pub(crate) fn set_colony_status(&mut self, colony_status: ColonyStatus) {
        self.colony_status = colony_status;
    }

    pub(crate) fn set_state(&mut self, state: Option<StateId>) {
        self.state = state;
    }

    pub(crate) fn add_pop(&mut self, pop: Pop) {
        self.pops.push(pop);
    }

    pub(crate) fn add_building(&mut self, building: ModifierId) {
        self.buildings.push(building);
    }

    pub(crate) fn add_event_modifier(&mut self, modifier: ModifierId, expiry: Option<Date>) {
        self.event_modifiers.push(ActiveModifier { modifier, expiry });
    }

    pub(crate) fn expire_modifiers(&mut self, today: Date) {
        self.event_modifiers
            .retain(|active| active.expiry.map_or(true, |expiry| expiry > today));
    }

    /// Split borrow for the production step: the RGO mutates while pops
    /// and the cached modifier sum are read.
    pub(crate) fn rgo_parts_mut(
        &mut self,
    ) -> (
        &mut ResourceGatheringOperation,
        &[Pop],
        &crate::modifier::ModifierSum,
    ) {
        (&mut self.rgo, &self.pops, &self.modifier_sum)
    }

    /// Rebuild this province's local modifier sum: terrain, climate,
    /// continent, buildings and active event modifiers, all attributed to
    /// this province as source.
    pub(crate) fn update_local_modifier_sum(
        &mut self,
        index: ProvinceIndex,
        map_definition: &MapDefinition,
        manager: &crate::modifier::ModifierManager,
    ) {
        use crate::modifier::{ModifierSource, ModifierTargetMask};

        let source = ModifierSource::Province(index);
        let Self {
            modifier_sum,
            buildings,
            event_modifiers,
            ..
        } = self;
        modifier_sum.clear();

        let mut add = |id: ModifierId| match manager.modifier_by_id(id) {
            Some(modifier) => modifier_sum.add_modifier(
                id,
                modifier,
                source,
                Fixed::ONE,
                ModifierTargetMask::NONE,
                manager.effects(),
            ),
            None => log::error!("province {} references unknown modifier #{}", index, id.0),
        };

        if let Some(definition) = map_definition.province(index) {
            let terrain_modifier = definition
                .terrain()
                .and_then(|terrain| map_definition.terrain_type_manager().terrain_type(terrain))
                .and_then(|terrain| terrain.modifier());
            if let Some(id) = terrain_modifier {
                add(id);
            }
            let climate_modifier = definition
                .climate()
                .and_then(|climate| map_definition.climate(climate))
                .and_then(|climate| climate.modifier());
            if let Some(id) = climate_modifier {
                add(id);
            }
            let continent_modifier = definition
                .continent()
                .and_then(|continent| map_definition.continent(continent))
                .and_then(|continent| continent.modifier());
            if let Some(id) = continent_modifier {
                add(id);
            }
        }
        for &building in buildings.iter() {
            add(building);
        }
        for active in event_modifiers.iter() {
            add(active.modifier);
        }
    }

    /// Refresh the pop-derived caches the tick and the state aggregates
    /// read.
    pub(crate) fn update_gamestate(&mut self, pop_types: &PopTypeManager) {
        self.total_population = 0;
        self.average_literacy = Fixed::ZERO;
        self.average_consciousness = Fixed::ZERO;
        self.average_militancy = Fixed::ZERO;
        self.pop_type_distribution.fill(0);
        self.max_supported_regiments = 0;

        for pop in &self.pops {
            let size = pop.size();
            self.total_population += size;
            let weight = Fixed::from_int(size);
            self.average_literacy += pop.literacy() * weight;
            self.average_consciousness += pop.consciousness() * weight;
            self.average_militancy += pop.militancy() * weight;
            if let Some(slot) = self
                .pop_type_distribution
                .get_mut(pop.pop_type().0 as usize)
            {
                *slot += size;
            }
            let recruitable = pop_types
                .pop_type(pop.pop_type())
                .is_some_and(|pop_type| pop_type.can_be_recruited());
            if recruitable {
                self.max_supported_regiments += size / 1000;
            }
        }

        if self.total_population > 0 {
            let total = Fixed::from_int(self.total_population);
            self.average_literacy /= total;
            self.average_consciousness /= total;
            self.average_militancy /= total;
        }
    }
}

/// Owns one [`ProvinceInstance`] per locked province definition, plus the
/// states generated over them.
#[derive(Debug, Default)]
pub struct MapInstance {
    provinces: Vec<ProvinceInstance>,
    state_manager: StateManager,
    highest_province_population: PopSize,
    total_map_population: PopSize,
}

impl MapInstance {
    pub fn setup(map_definition: &MapDefinition, pop_type_count: usize) -> Option<Self> {
        if !map_definition.provinces().is_locked() {
            log::error!("cannot create map instance before province definitions are locked");
            return None;
        }
        let provinces = (0..map_definition.province_count())
            .map(|position| {
                ProvinceInstance::new(ProvinceIndex(position as u16 + 1), pop_type_count)
            })
            .collect();
        Some(Self {
            provinces,
            state_manager: StateManager::new(),
            highest_province_population: 0,
            total_map_population: 0,
        })
    }

    pub fn provinces(&self) -> &[ProvinceInstance] {
        &self.provinces
    }

    pub fn provinces_mut(&mut self) -> &mut [ProvinceInstance] {
        &mut self.provinces
    }

    pub fn province_instance(&self, index: ProvinceIndex) -> Option<&ProvinceInstance> {
        index
            .0
            .checked_sub(1)
            .and_then(|position| self.provinces.get(position as usize))
    }

    pub fn province_instance_mut(&mut self, index: ProvinceIndex) -> Option<&mut ProvinceInstance> {
        index
            .0
            .checked_sub(1)
            .and_then(|position| self.provinces.get_mut(position as usize))
    }

    pub fn state_manager(&self) -> &StateManager {
        &self.state_manager
    }

    /// Split borrow for the parallel submission phase: mutable provinces,
    /// shared state aggregates.
    pub(crate) fn provinces_and_states_mut(
        &mut self,
    ) -> (&mut [ProvinceInstance], &StateManager) {
        (&mut self.provinces, &self.state_manager)
    }

    /// Regenerate states from every non-meta region over the current
    /// ownership pattern.
    pub(crate) fn generate_states(
        &mut self,
        map_definition: &MapDefinition,
        countries: &mut [crate::country::CountryInstance],
        pop_type_count: usize,
    ) -> bool {
        let Self {
            provinces,
            state_manager,
            ..
        } = self;
        state_manager.generate_states(map_definition, provinces, countries, pop_type_count)
    }

    pub fn highest_province_population(&self) -> PopSize {
        self.highest_province_population
    }

    pub fn total_map_population(&self) -> PopSize {
        self.total_map_population
    }

    pub(crate) fn update_gamestate(&mut self, pop_types: &PopTypeManager) {
        for province in &mut self.provinces {
            province.update_gamestate(pop_types);
        }
        self.state_manager.update_gamestate(&self.provinces);
        self.highest_province_population = self
            .provinces
            .iter()
            .map(ProvinceInstance::total_population)
            .max()
            .unwrap_or(0);
        self.total_map_population = self
            .provinces
            .iter()
            .map(ProvinceInstance::total_population)
            .sum();
    }
}
