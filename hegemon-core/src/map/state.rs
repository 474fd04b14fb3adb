//! States: mutable groups of provinces sharing one owner and colony
//! status within a non-meta region.

use crate::country::{CountryId, CountryInstance};
use crate::fixed::Fixed;
use crate::map::definition::MapDefinition;
use crate::map::instance::{ColonyStatus, ProvinceInstance};
use crate::map::province::ProvinceIndex;
use crate::map::region::RegionId;
use crate::pop::{PopSize, PopTypeId};
use crate::registry::HasIdentifier;
use serde::{Deserialize, Serialize};

/// Index of a state in the [`StateManager`]'s flat state list. Stable while
/// states are appended, which generation guarantees by reserving capacity
/// for one state per region province up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    region: RegionId,
    owner: Option<CountryId>,
    capital: ProvinceIndex,
    provinces: Vec<ProvinceIndex>,
    colony_status: ColonyStatus,
    total_population: PopSize,
    average_literacy: Fixed,
    average_consciousness: Fixed,
    average_militancy: Fixed,
    pop_type_distribution: Vec<PopSize>,
    industrial_power: Fixed,
    max_supported_regiments: i64,
}

impl State {
    fn new(
        region: RegionId,
        owner: Option<CountryId>,
        capital: ProvinceIndex,
        provinces: Vec<ProvinceIndex>,
        colony_status: ColonyStatus,
        pop_type_count: usize,
    ) -> Self {
        Self {
            region,
            owner,
            capital,
            provinces,
            colony_status,
            total_population: 0,
            average_literacy: Fixed::ZERO,
            average_consciousness: Fixed::ZERO,
            average_militancy: Fixed::ZERO,
            pop_type_distribution: vec![0; pop_type_count],
            industrial_power: Fixed::ZERO,
            max_supported_regiments: 0,
        }
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn owner(&self) -> Option<CountryId> {
        self.owner
    }

    pub fn capital(&self) -> ProvinceIndex {
        self.capital
    }

    pub fn provinces(&self) -> &[ProvinceIndex] {
        &self.provinces
    }

    pub fn colony_status(&self) -> ColonyStatus {
        self.colony_status
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

    /// State-wide head-count of one pop type, from the cached distribution.
    pub fn pop_type_size(&self, pop_type: PopTypeId) -> PopSize {
        self.pop_type_distribution
            .get(pop_type.0 as usize)
            .copied()
            .unwrap_or(0)
    }

    pub fn industrial_power(&self) -> Fixed {
        self.industrial_power
    }

    pub fn max_supported_regiments(&self) -> i64 {
        self.max_supported_regiments
    }

    /// Refresh the cached aggregates from the member provinces' own caches.
    pub(crate) fn update_gamestate(&mut self, provinces: &[ProvinceInstance]) {
        self.total_population = 0;
        self.average_literacy = Fixed::ZERO;
        self.average_consciousness = Fixed::ZERO;
        self.average_militancy = Fixed::ZERO;
        self.pop_type_distribution.fill(0);
        self.max_supported_regiments = 0;

        let mut potential_workforce_in_state: PopSize = 0;
        for &index in &self.provinces {
            let Some(province) = provinces.get(index.0 as usize - 1) else {
                continue;
            };
            let province_population = province.total_population();
            self.total_population += province_population;
            let weight = Fixed::from_int(province_population);
            self.average_literacy += province.average_literacy() * weight;
            self.average_consciousness += province.average_consciousness() * weight;
            self.average_militancy += province.average_militancy() * weight;
            for (slot, &count) in self
                .pop_type_distribution
                .iter_mut()
                .zip(province.pop_type_distribution())
            {
                *slot += count;
            }
            self.max_supported_regiments += province.max_supported_regiments();
            potential_workforce_in_state += province_population;
        }

        if self.total_population > 0 {
            let total = Fixed::from_int(self.total_population);
            self.average_literacy /= total;
            self.average_consciousness /= total;
            self.average_militancy /= total;
        }

        // Industrial power scales factory levels by how well the state's
        // workforce could staff them; without factory data the state has
        // no industrial power, but the scalar keeps its clamped form.
        let total_factory_levels_in_state: i64 = 0;
        let potential_employment_in_state: i64 = 0;
        let min_workforce_scalar = Fixed::ONE / Fixed::from_int(5);
        let max_workforce_scalar = Fixed::from_int(4);
        let workforce_scalar = if potential_employment_in_state <= 0 {
            min_workforce_scalar
        } else {
            ((Fixed::from_int(potential_workforce_in_state) / Fixed::from_int(100)).floor()
                * Fixed::from_int(400)
                / Fixed::from_int(potential_employment_in_state))
            .clamp(min_workforce_scalar, max_workforce_scalar)
        };
        self.industrial_power = Fixed::from_int(total_factory_levels_in_state) * workforce_scalar;
    }
}

/// The states generated from one non-meta region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSet {
    region: RegionId,
    states: Vec<StateId>,
}

impl StateSet {
    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// Owns every state, grouped into per-region state sets.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StateManager {
    states: Vec<State>,
    state_sets: Vec<StateSet>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.states.clear();
        self.state_sets.clear();
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0 as usize)
    }

    pub fn state_sets(&self) -> &[StateSet] {
        &self.state_sets
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Partition one non-meta region's provinces into states sharing
    /// `(owner, colony status)` and wire the back-pointers.
    fn add_state_set(
        &mut self,
        region_id: RegionId,
        map_definition: &MapDefinition,
        provinces: &mut [ProvinceInstance],
        countries: &mut [CountryInstance],
        pop_type_count: usize,
    ) -> bool {
        let Some(region) = map_definition.region(region_id) else {
            log::error!("cannot generate states from unknown region #{}", region_id.0);
            return false;
        };
        if region.is_meta() {
            log::error!("cannot use meta region {} as state template", region.identifier());
            return false;
        }
        if region.is_empty() {
            log::error!("cannot use empty region {} as state template", region.identifier());
            return false;
        }

        // Group member provinces: join the first group with a matching
        // owner and colony status, otherwise start a new one.
        let mut groups: Vec<Vec<ProvinceIndex>> = Vec::new();
        for &index in region.provinces() {
            let Some(instance) = provinces.get(index.0 as usize - 1) else {
                log::error!("region {} references missing province {}", region.identifier(), index);
                return false;
            };
            let key = (instance.owner(), instance.colony_status());
            let group = groups.iter_mut().find(|group| {
                let first = provinces_ref(provinces, group[0]);
                (first.owner(), first.colony_status()) == key
            });
            match group {
                Some(group) => group.push(index),
                None => groups.push(vec![index]),
            }
        }

        // Keep ids stable while appending: one state per province at most.
        self.states.reserve(region.len());

        let mut state_ids = Vec::with_capacity(groups.len());
        for group in groups {
            let capital = group[0];
            let capital_instance = provinces_ref(provinces, capital);
            let owner = capital_instance.owner();
            let colony_status = capital_instance.colony_status();
            let id = StateId(self.states.len() as u32);
            self.states.push(State::new(
                region_id,
                owner,
                capital,
                group.clone(),
                colony_status,
                pop_type_count,
            ));
            for index in group {
                if let Some(instance) = provinces.get_mut(index.0 as usize - 1) {
                    instance.set_state(Some(id));
                }
            }
            if let Some(owner) = owner {
                if let Some(country) = countries.get_mut(owner.0 as usize) {
                    country.add_state(id);
                }
            }
            state_ids.push(id);
        }

        self.state_sets.push(StateSet {
            region: region_id,
            states: state_ids,
        });
        true
    }

    /// Generate states from every non-meta region.
    pub fn generate_states(
        &mut self,
        map_definition: &MapDefinition,
        provinces: &mut [ProvinceInstance],
        countries: &mut [CountryInstance],
        pop_type_count: usize,
    ) -> bool {
        self.reset();
        self.state_sets.reserve(map_definition.regions().len());

        let mut ok = true;
        for (position, region) in map_definition.regions().items().iter().enumerate() {
            if !region.is_meta() {
                ok &= self.add_state_set(
                    RegionId(position as u16),
                    map_definition,
                    provinces,
                    countries,
                    pop_type_count,
                );
            }
        }
        log::info!(
            "generated {} states across {} state sets",
            self.states.len(),
            self.state_sets.len()
        );
        ok
    }

    pub(crate) fn update_gamestate(&mut self, provinces: &[ProvinceInstance]) {
        for state in &mut self.states {
            state.update_gamestate(provinces);
        }
    }
}

fn provinces_ref(provinces: &[ProvinceInstance], index: ProvinceIndex) -> &ProvinceInstance {
    &provinces[index.0 as usize - 1]
}
