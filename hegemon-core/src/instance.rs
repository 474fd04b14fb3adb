//! The world-state driver: the definition container, the instance
//! container, and the daily tick.
//!
//! The tick runs in three phases. Order submission is parallel over
//! provinces; each province touches only its own pops and RGO, plus the
//! thread-safe per-good order queues. Market clearing is serial: every
//! settlement mutates pops through one dispatcher holding the whole map.
//! Gamestate updates then refresh the cached aggregates the next tick
//! reads. Ticks are strictly sequential.

use crate::bookmark::BookmarkManager;
use crate::country::{CountryDefinitionManager, CountryId, CountryInstance};
use crate::economy::artisan::artisan_tick;
use crate::economy::good::{GoodDefinitionManager, GoodId};
use crate::economy::market::MarketInstance;
use crate::economy::order::{MarketSellOrder, OrderRecipient, Settlement};
use crate::economy::production_type::{ProductionTypeId, ProductionTypeManager};
use crate::economy::rgo;
use crate::fixed::Fixed;
use crate::map::definition::MapDefinition;
use crate::map::instance::{ColonyStatus, MapInstance, ProvinceInstance};
use crate::map::province::ProvinceIndex;
use crate::map::state::StateManager;
use crate::modifier::{ModifierId, ModifierManager, ModifierSource, ModifierTargetMask};
use crate::pop::{Pop, PopTypeManager};
use crate::types::date::{Date, Timespan};
use rayon::prelude::*;

/// Owns every definition-side manager. Filled through the builder calls,
/// locked before instances are created.
#[derive(Default)]
pub struct DefinitionManager {
    map: MapDefinition,
    goods: GoodDefinitionManager,
    production_types: ProductionTypeManager,
    pop_types: PopTypeManager,
    countries: CountryDefinitionManager,
    modifiers: ModifierManager,
    bookmarks: BookmarkManager,
}

impl DefinitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> &MapDefinition {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapDefinition {
        &mut self.map
    }

    pub fn goods(&self) -> &GoodDefinitionManager {
        &self.goods
    }

    pub fn goods_mut(&mut self) -> &mut GoodDefinitionManager {
        &mut self.goods
    }

    pub fn production_types(&self) -> &ProductionTypeManager {
        &self.production_types
    }

    pub fn production_types_mut(&mut self) -> &mut ProductionTypeManager {
        &mut self.production_types
    }

    pub fn pop_types(&self) -> &PopTypeManager {
        &self.pop_types
    }

    pub fn pop_types_mut(&mut self) -> &mut PopTypeManager {
        &mut self.pop_types
    }

    pub fn countries(&self) -> &CountryDefinitionManager {
        &self.countries
    }

    pub fn countries_mut(&mut self) -> &mut CountryDefinitionManager {
        &mut self.countries
    }

    pub fn modifiers(&self) -> &ModifierManager {
        &self.modifiers
    }

    pub fn modifiers_mut(&mut self) -> &mut ModifierManager {
        &mut self.modifiers
    }

    pub fn bookmarks(&self) -> &BookmarkManager {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut BookmarkManager {
        &mut self.bookmarks
    }

    /// Register the modifier effect catalog (including per-good effects)
    /// and lock the mappings. Goods must be locked first.
    pub fn setup_modifier_effects(&mut self) -> bool {
        if !self.goods.goods().is_locked() {
            log::error!("cannot set up modifier effects before good definitions are locked");
            return false;
        }
        self.modifiers.setup_modifier_effects(self.goods.goods())
    }
}

/// Owns every instance-side container and drives the daily tick.
pub struct InstanceManager {
    today: Date,
    map_instance: MapInstance,
    countries: Vec<CountryInstance>,
    market: MarketInstance,
}

impl InstanceManager {
    /// Build instances from locked definitions.
    pub fn setup(definitions: &DefinitionManager, start_date: Date) -> Option<Self> {
        let pop_type_count = definitions.pop_types().pop_types().len();
        let map_instance = MapInstance::setup(definitions.map(), pop_type_count)?;
        let countries = (0..definitions.countries().countries().len())
            .map(|position| CountryInstance::new(CountryId(position as u16)))
            .collect();
        let mut market = MarketInstance::new();
        if !market.setup(definitions.goods()) {
            return None;
        }
        Some(Self {
            today: start_date,
            map_instance,
            countries,
            market,
        })
    }

    pub fn today(&self) -> Date {
        self.today
    }

    pub fn map_instance(&self) -> &MapInstance {
        &self.map_instance
    }

    pub fn market(&self) -> &MarketInstance {
        &self.market
    }

    pub fn countries(&self) -> &[CountryInstance] {
        &self.countries
    }

    pub fn country_instance(&self, id: CountryId) -> Option<&CountryInstance> {
        self.countries.get(id.0 as usize)
    }

    // ----- builder calls (history loading boundary) --------------------

    pub fn set_province_owner(
        &mut self,
        province: ProvinceIndex,
        owner: Option<CountryId>,
        colony_status: ColonyStatus,
    ) -> bool {
        if let Some(owner) = owner {
            if owner.0 as usize >= self.countries.len() {
                log::error!("cannot set unknown country #{} as province owner", owner.0);
                return false;
            }
        }
        let Some(instance) = self.map_instance.province_instance_mut(province) else {
            log::error!("cannot set owner of unknown province {}", province);
            return false;
        };
        let previous = instance.owner();
        instance.set_owner(owner);
        instance.set_colony_status(colony_status);
        if let Some(previous) = previous {
            self.countries[previous.0 as usize].remove_owned_province(province);
        }
        if let Some(owner) = owner {
            self.countries[owner.0 as usize].add_owned_province(province);
        }
        true
    }

    pub fn add_pop(
        &mut self,
        definitions: &DefinitionManager,
        province: ProvinceIndex,
        pop: Pop,
    ) -> bool {
        if definitions.pop_types().pop_type(pop.pop_type()).is_none() {
            log::error!("cannot add pop with unknown pop type #{}", pop.pop_type().0);
            return false;
        }
        let Some(instance) = self.map_instance.province_instance_mut(province) else {
            log::error!("cannot add pop to unknown province {}", province);
            return false;
        };
        instance.add_pop(pop);
        true
    }

    pub fn set_rgo_production_type(
        &mut self,
        definitions: &DefinitionManager,
        province: ProvinceIndex,
        production_type: Option<ProductionTypeId>,
    ) -> bool {
        if let Some(id) = production_type {
            if definitions.production_types().production_type(id).is_none() {
                log::error!("cannot assign unknown production type #{} as RGO", id.0);
                return false;
            }
        }
        let Some(instance) = self.map_instance.province_instance_mut(province) else {
            log::error!("cannot set RGO of unknown province {}", province);
            return false;
        };
        instance.rgo_mut().set_production_type(production_type);
        true
    }

    pub fn add_province_building(
        &mut self,
        definitions: &DefinitionManager,
        province: ProvinceIndex,
        building: ModifierId,
    ) -> bool {
        if definitions.modifiers().modifier_by_id(building).is_none() {
            log::error!("cannot add unknown building modifier #{}", building.0);
            return false;
        }
        let Some(instance) = self.map_instance.province_instance_mut(province) else {
            log::error!("cannot add building to unknown province {}", province);
            return false;
        };
        instance.add_building(building);
        true
    }

    pub fn add_province_event_modifier(
        &mut self,
        definitions: &DefinitionManager,
        province: ProvinceIndex,
        modifier: ModifierId,
        expiry: Option<Date>,
    ) -> bool {
        if definitions.modifiers().modifier_by_id(modifier).is_none() {
            log::error!("cannot apply unknown modifier #{}", modifier.0);
            return false;
        }
        let Some(instance) = self.map_instance.province_instance_mut(province) else {
            log::error!("cannot apply modifier to unknown province {}", province);
            return false;
        };
        instance.add_event_modifier(modifier, expiry);
        true
    }

    pub fn add_national_modifier(
        &mut self,
        definitions: &DefinitionManager,
        country: CountryId,
        modifier: ModifierId,
    ) -> bool {
        if definitions.modifiers().modifier_by_id(modifier).is_none() {
            log::error!("cannot apply unknown modifier #{}", modifier.0);
            return false;
        }
        let Some(instance) = self.countries.get_mut(country.0 as usize) else {
            log::error!("cannot apply modifier to unknown country #{}", country.0);
            return false;
        };
        instance.add_national_modifier(modifier);
        true
    }

    // ----- game start ---------------------------------------------------

    /// Generate states, build caches and run the day-one RGO pass, which
    /// sells at base price and distributes the income immediately.
    pub fn start_new_game(&mut self, definitions: &DefinitionManager) -> bool {
        let pop_type_count = definitions.pop_types().pop_types().len();
        for country in &mut self.countries {
            country.clear_states();
        }
        let mut ok = self.map_instance.generate_states(
            definitions.map(),
            &mut self.countries,
            pop_type_count,
        );
        self.update_modifier_sums(definitions);
        self.map_instance.update_gamestate(definitions.pop_types());
        self.update_country_totals();

        for position in 0..self.map_instance.provinces().len() {
            let province_index = ProvinceIndex(position as u16 + 1);
            ok &= self.initialise_rgo_for_new_game(definitions, province_index);
        }
        self.map_instance.update_gamestate(definitions.pop_types());
        self.update_country_totals();
        ok
    }

    fn initialise_rgo_for_new_game(
        &mut self,
        definitions: &DefinitionManager,
        province_index: ProvinceIndex,
    ) -> bool {
        let produced = {
            let (provinces, states) = self.map_instance.provinces_and_states_mut();
            let Some(province) = provinces.get_mut(province_index.0 as usize - 1) else {
                return false;
            };
            run_rgo_production(province, states, definitions)
        };
        let Some((output, good)) = produced else {
            return true;
        };
        let Some(definition) = definitions.goods().good(good) else {
            log::error!("RGO output references unknown good #{}", good.0);
            return false;
        };
        let revenue = output * definition.base_price();
        rgo::pay_employees(
            &mut self.map_instance,
            province_index,
            revenue,
            definitions.production_types(),
            definitions.pop_types(),
        );
        true
    }

    // ----- the daily tick ----------------------------------------------

    /// Advance the world by one day.
    pub fn tick(&mut self, definitions: &DefinitionManager) {
        self.today = self.today + Timespan::days(1);

        let today = self.today;
        for province in self.map_instance.provinces_mut() {
            province.expire_modifiers(today);
        }
        self.update_modifier_sums(definitions);

        // Phase 1: order submission, parallel over provinces. Provinces
        // only touch their own pops and RGO; the market's per-good queues
        // take care of cross-thread submission.
        {
            let (provinces, states) = self.map_instance.provinces_and_states_mut();
            let market = &self.market;
            provinces
                .par_iter_mut()
                .enumerate()
                .for_each(|(position, province)| {
                    let province_index = ProvinceIndex(position as u16 + 1);
                    submit_province_orders(province, province_index, states, definitions, market);
                });
        }

        // Phase 2: market clearing, serial, strictly after the submission
        // barrier. Settlements mutate pops through this one dispatcher.
        {
            let Self {
                market,
                map_instance,
                ..
            } = self;
            market.execute_orders(&mut |settlement| {
                apply_settlement(map_instance, definitions, settlement);
            });
        }

        // Phase 3: gamestate updates feeding the next tick's caches.
        self.map_instance.update_gamestate(definitions.pop_types());
        self.update_country_totals();
        self.accrue_research(definitions);
    }

    /// Rebuild the modifier sums bottom-up: province local sums, country
    /// national sums, country folds of province sums (dropping
    /// province-targeted effects and skipping its own earlier
    /// contributions), then provinces fold their owner's sum back in minus
    /// their own entries.
    fn update_modifier_sums(&mut self, definitions: &DefinitionManager) {
        let manager = definitions.modifiers();
        let map_definition = definitions.map();

        for (position, province) in self.map_instance.provinces_mut().iter_mut().enumerate() {
            let index = ProvinceIndex(position as u16 + 1);
            province.update_local_modifier_sum(index, map_definition, manager);
        }

        for country in &mut self.countries {
            country.update_modifier_sum(manager);
            let source = ModifierSource::Country(country.country());
            let owned: Vec<ProvinceIndex> = country.owned_provinces().to_vec();
            for province_index in owned {
                let Some(province) = self.map_instance.province_instance(province_index) else {
                    continue;
                };
                country.modifier_sum_mut().add_sum_filtered(
                    province.modifier_sum(),
                    ModifierTargetMask::PROVINCE,
                    Some(source),
                    manager.modifiers(),
                    manager.effects(),
                );
            }
        }

        let countries = &self.countries;
        for (position, province) in self.map_instance.provinces_mut().iter_mut().enumerate() {
            let index = ProvinceIndex(position as u16 + 1);
            let Some(owner) = province.owner() else {
                continue;
            };
            let Some(country) = countries.get(owner.0 as usize) else {
                continue;
            };
            province.modifier_sum_mut().add_sum_exclude_source(
                country.modifier_sum(),
                ModifierSource::Province(index),
                manager.modifiers(),
                manager.effects(),
            );
        }
    }

    fn update_country_totals(&mut self) {
        for country in &mut self.countries {
            let total_population = country
                .owned_provinces()
                .iter()
                .filter_map(|&province| self.map_instance.province_instance(province))
                .map(ProvinceInstance::total_population)
                .sum();
            country.set_total_population(total_population);
        }
    }

    /// Daily research accrual from the country's accumulated effects.
    fn accrue_research(&mut self, definitions: &DefinitionManager) {
        let cache = definitions.modifiers().effect_cache();
        for country in &mut self.countries {
            let base = country.modifier_sum().effect_nullcheck(cache.research_points);
            if base == Fixed::ZERO {
                continue;
            }
            let modifier = country
                .modifier_sum()
                .effect_nullcheck(cache.research_points_modifier);
            country.add_research_points(base * (Fixed::ONE + modifier));
        }
    }
}

/// The per-province half of the submission phase: the RGO step and every
/// artisanal pop's tick.
fn submit_province_orders(
    province: &mut ProvinceInstance,
    province_index: ProvinceIndex,
    states: &StateManager,
    definitions: &DefinitionManager,
    market: &MarketInstance,
) {
    for pop in province.pops_mut() {
        pop.reset_daily_income();
    }

    if let Some((output, good)) = run_rgo_production(province, states, definitions) {
        if output > Fixed::ZERO {
            market.place_market_sell_order(MarketSellOrder {
                good,
                quantity: output,
                recipient: OrderRecipient::RgoOutput {
                    province: province_index,
                },
            });
        } else {
            province
                .rgo_mut()
                .record_income(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO);
        }
    }

    for pop_index in 0..province.pops().len() {
        let pop = &mut province.pops_mut()[pop_index];
        artisan_tick(
            pop,
            province_index,
            pop_index,
            definitions.production_types(),
            market,
        );
    }
}

/// Size, hire and produce for one province's RGO. Returns the produced
/// quantity and output good, or `None` when the province hosts no RGO.
fn run_rgo_production(
    province: &mut ProvinceInstance,
    states: &StateManager,
    definitions: &DefinitionManager,
) -> Option<(Fixed, GoodId)> {
    let production_type_id = province.rgo().production_type()?;
    let Some(production_type) = definitions
        .production_types()
        .production_type(production_type_id)
    else {
        log::error!(
            "province {} RGO references unknown production type #{}",
            province.province(),
            production_type_id.0
        );
        return None;
    };
    let cache = definitions.modifiers().effect_cache();
    let state = province.state().and_then(|id| states.state(id));

    let (rgo, pops, sum) = province.rgo_parts_mut();
    let size_modifier = rgo.calculate_size_modifier(production_type, sum, cache);
    let available_workers = rgo.update_size(production_type, pops, sum, cache, size_modifier);
    rgo.hire(production_type, pops, definitions.pop_types(), available_workers);
    let output = rgo.produce(production_type, state, sum, cache, size_modifier);
    rgo.record_output(output);
    Some((output, production_type.output_good()))
}

/// Dispatch one settlement from the clearing pass to its recipient.
fn apply_settlement(
    map: &mut MapInstance,
    definitions: &DefinitionManager,
    settlement: Settlement,
) {
    match settlement {
        Settlement::Buy {
            recipient:
                OrderRecipient::ArtisanInput {
                    province,
                    pop,
                    good,
                },
            result,
        } => {
            let Some(instance) = map.province_instance_mut(province) else {
                log::error!("buy settlement for unknown province {}", province);
                return;
            };
            let Some(pop) = instance.pops_mut().get_mut(pop) else {
                log::error!("buy settlement for missing pop {} in province {}", pop, province);
                return;
            };
            pop.add_cash(result.money_left);
            match pop.artisan_mut() {
                Some(artisan) => artisan.add_to_stockpile(good, result.quantity_bought),
                None => log::error!("buy settlement for a pop without an artisanal producer"),
            }
        }
        Settlement::Sell {
            recipient: OrderRecipient::ArtisanOutput { province, pop },
            result,
        } => {
            let Some(instance) = map.province_instance_mut(province) else {
                log::error!("sell settlement for unknown province {}", province);
                return;
            };
            let Some(pop) = instance.pops_mut().get_mut(pop) else {
                log::error!("sell settlement for missing pop {} in province {}", pop, province);
                return;
            };
            pop.add_artisan_income(result.money);
        }
        Settlement::Sell {
            recipient: OrderRecipient::RgoOutput { province },
            result,
        } => {
            rgo::pay_employees(
                map,
                province,
                result.money,
                definitions.production_types(),
                definitions.pop_types(),
            );
        }
        Settlement::Buy { recipient, .. } => {
            log::error!("buy settlement delivered to a sell-only recipient {:?}", recipient);
        }
        Settlement::Sell { recipient, .. } => {
            log::error!("sell settlement delivered to a buy-only recipient {:?}", recipient);
        }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
