//! Country definitions and instances.

use crate::fixed::Fixed;
use crate::map::province::ProvinceIndex;
use crate::map::state::StateId;
use crate::modifier::{ModifierId, ModifierSum};
use crate::pop::PopSize;
use crate::registry::{HasIdentifier, Registry};
use crate::types::colour::Colour;
use serde::{Deserialize, Serialize};

/// Index of a country in the definition registry (and the instance list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountryId(pub u16);

/// Immutable country description: a tag and a map colour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryDefinition {
    identifier: String,
    colour: Colour,
}

impl CountryDefinition {
    pub fn new(identifier: impl Into<String>, colour: Colour) -> Self {
        Self {
            identifier: identifier.into(),
            colour,
        }
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }
}

impl HasIdentifier for CountryDefinition {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
pub struct CountryDefinitionManager {
    countries: Registry<CountryDefinition>,
}

impl Default for CountryDefinitionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CountryDefinitionManager {
    pub fn new() -> Self {
        Self {
            countries: Registry::new("country definitions"),
        }
    }

    pub fn add_country(&mut self, identifier: &str, colour: Colour) -> bool {
        if identifier.is_empty() {
            log::error!("invalid country identifier - empty");
            return false;
        }
        self.countries.add(CountryDefinition::new(identifier, colour))
    }

    pub fn lock(&mut self) {
        self.countries.lock();
    }

    pub fn countries(&self) -> &Registry<CountryDefinition> {
        &self.countries
    }

    pub fn country(&self, id: CountryId) -> Option<&CountryDefinition> {
        self.countries.by_index(id.0 as usize)
    }

    pub fn country_id(&self, identifier: &str) -> Option<CountryId> {
        self.countries.index_of(identifier).map(|i| CountryId(i as u16))
    }
}

/// Mutable country state: its modifier sum, national modifiers, owned
/// provinces and states, and gamestate-visible totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryInstance {
    country: CountryId,
    modifier_sum: ModifierSum,
    national_modifiers: Vec<ModifierId>,
    owned_provinces: Vec<ProvinceIndex>,
    states: Vec<StateId>,
    total_population: PopSize,
    research_points: Fixed,
}

impl CountryInstance {
    pub(crate) fn new(country: CountryId) -> Self {
        Self {
            country,
            modifier_sum: ModifierSum::new(),
            national_modifiers: Vec::new(),
            owned_provinces: Vec::new(),
            states: Vec::new(),
            total_population: 0,
            research_points: Fixed::ZERO,
        }
    }

    pub fn country(&self) -> CountryId {
        self.country
    }

    pub fn modifier_sum(&self) -> &ModifierSum {
        &self.modifier_sum
    }

    pub(crate) fn modifier_sum_mut(&mut self) -> &mut ModifierSum {
        &mut self.modifier_sum
    }

    pub fn national_modifiers(&self) -> &[ModifierId] {
        &self.national_modifiers
    }

    pub(crate) fn add_national_modifier(&mut self, modifier: ModifierId) {
        self.national_modifiers.push(modifier);
    }

    pub fn owned_provinces(&self) -> &[ProvinceIndex] {
        &self.owned_provinces
    }

    pub(crate) fn add_owned_province(&mut self, province: ProvinceIndex) {
        if !self.owned_provinces.contains(&province) {
            self.owned_provinces.push(province);
        }
    }

    pub(crate) fn remove_owned_province(&mut self, province: ProvinceIndex) {
        self.owned_provinces.retain(|&owned| owned != province);
    }

    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub(crate) fn add_state(&mut self, state: StateId) {
        self.states.push(state);
    }

    pub(crate) fn clear_states(&mut self) {
        self.states.clear();
    }

    pub fn total_population(&self) -> PopSize {
        self.total_population
    }

    pub(crate) fn set_total_population(&mut self, total_population: PopSize) {
        self.total_population = total_population;
    }

    pub fn research_points(&self) -> Fixed {
        self.research_points
    }

    pub(crate) fn add_research_points(&mut self, points: Fixed) {
        self.research_points += points;
    }

    /// Rebuild the national half of this country's modifier sum: applied
    /// national modifiers plus every triggered modifier whose condition
    /// holds in this country's scope. Province contributions are folded in
    /// afterwards by the driver.
    pub(crate) fn update_modifier_sum(&mut self, manager: &crate::modifier::ModifierManager) {
        use crate::modifier::{ModifierSource, ModifierTargetMask, ScopeContext};

        let source = ModifierSource::Country(self.country);
        let scopes = ScopeContext {
            country: Some(self.country),
            province: None,
        };
        let Self {
            modifier_sum,
            national_modifiers,
            ..
        } = self;
        modifier_sum.clear();

        for &id in national_modifiers.iter() {
            match manager.modifier_by_id(id) {
                Some(modifier) => modifier_sum.add_modifier(
                    id,
                    modifier,
                    source,
                    Fixed::ONE,
                    ModifierTargetMask::NONE,
                    manager.effects(),
                ),
                None => log::error!("{} references unknown modifier #{}", source, id.0),
            }
        }

        for (id, condition) in manager.triggered_modifiers() {
            if !condition.evaluate(&scopes) {
                continue;
            }
            if let Some(modifier) = manager.modifier_by_id(*id) {
                modifier_sum.add_modifier(
                    *id,
                    modifier,
                    source,
                    Fixed::ONE,
                    ModifierTargetMask::NONE,
                    manager.effects(),
                );
            }
        }
    }
}
