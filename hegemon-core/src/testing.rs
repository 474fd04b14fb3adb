//! Test fixtures: a small ready-made world.

use crate::country::CountryId;
use crate::economy::artisan::ArtisanalProducer;
use crate::economy::good::GoodCategory;
use crate::economy::production_type::{Job, JobEffect, ProductionType};
use crate::fixed::Fixed;
use crate::instance::{DefinitionManager, InstanceManager};
use crate::map::instance::ColonyStatus;
use crate::map::province::ProvinceIndex;
use crate::pop::{CultureId, Pop, PopType, ReligionId, Strata};
use crate::types::colour::Colour;
use crate::types::date::Date;
use std::collections::BTreeMap;

/// Assembles a two-country, three-province world with grain farming and
/// artisanal tool-making, then applies the recorded instance setup.
pub struct WorldBuilder {
    owners: Vec<(&'static str, &'static str)>,
    rgos: Vec<(&'static str, &'static str)>,
    pops: Vec<(&'static str, &'static str, i64, Fixed, Option<&'static str>)>,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            owners: Vec::new(),
            rgos: Vec::new(),
            pops: Vec::new(),
        }
    }

    pub fn owner(mut self, province: &'static str, country: &'static str) -> Self {
        self.owners.push((province, country));
        self
    }

    pub fn rgo(mut self, province: &'static str, production_type: &'static str) -> Self {
        self.rgos.push((province, production_type));
        self
    }

    pub fn pop(mut self, province: &'static str, pop_type: &'static str, size: i64, cash: Fixed) -> Self {
        self.pops.push((province, pop_type, size, cash, None));
        self
    }

    pub fn artisan_pop(
        mut self,
        province: &'static str,
        pop_type: &'static str,
        size: i64,
        cash: Fixed,
        production_type: &'static str,
    ) -> Self {
        self.pops
            .push((province, pop_type, size, cash, Some(production_type)));
        self
    }

    /// Shared definition fixture: goods grain/tools, pop types
    /// farmers/aristocrats/slaves/artisans, a grain farm RGO type, an
    /// artisanal tool recipe, two countries and a two-province region.
    pub fn definitions() -> DefinitionManager {
        let mut definitions = DefinitionManager::new();

        let goods = definitions.goods_mut();
        assert!(goods.add_good_definition(
            "grain",
            Colour::new(217, 170, 109),
            GoodCategory::RawMaterial,
            Fixed::ONE,
            true,
        ));
        assert!(goods.add_good_definition(
            "tools",
            Colour::new(138, 89, 56),
            GoodCategory::Industrial,
            Fixed::from_int(2),
            true,
        ));
        goods.lock();
        let grain = definitions.goods().good_id("grain").unwrap();

        let pop_types = definitions.pop_types_mut();
        assert!(pop_types.add_pop_type(PopType::new("farmers", Strata::Poor, false, true)));
        assert!(pop_types.add_pop_type(PopType::new("aristocrats", Strata::Rich, false, false)));
        assert!(pop_types.add_pop_type(PopType::new("slaves", Strata::Poor, true, false)));
        assert!(pop_types.add_pop_type(PopType::new("artisans", Strata::Middle, false, false)));
        pop_types.lock();
        let farmers = definitions.pop_types().pop_type_id("farmers").unwrap();
        let aristocrats = definitions.pop_types().pop_type_id("aristocrats").unwrap();
        let slaves = definitions.pop_types().pop_type_id("slaves").unwrap();

        let tools = definitions.goods().good_id("tools").unwrap();
        let production_types = definitions.production_types_mut();
        assert!(production_types.add_production_type(ProductionType::new(
            "grain_farm",
            grain,
            Fixed::from_int(2),
            100,
            Some(Job {
                pop_type: aristocrats,
                effect: JobEffect::Output,
                effect_multiplier: Fixed::ONE,
                amount: Fixed::ONE,
            }),
            vec![
                Job {
                    pop_type: farmers,
                    effect: JobEffect::Throughput,
                    effect_multiplier: Fixed::ONE,
                    amount: Fixed::ONE,
                },
                Job {
                    pop_type: slaves,
                    effect: JobEffect::Throughput,
                    effect_multiplier: Fixed::ONE,
                    amount: Fixed::ONE,
                },
            ],
            BTreeMap::new(),
            true,
            false,
        )));
        let mut tool_inputs = BTreeMap::new();
        tool_inputs.insert(grain, Fixed::from_int(10));
        assert!(production_types.add_production_type(ProductionType::new(
            "artisan_tools",
            tools,
            Fixed::from_int(5),
            100,
            None,
            Vec::new(),
            tool_inputs,
            false,
            false,
        )));
        production_types.lock();

        let countries = definitions.countries_mut();
        assert!(countries.add_country("ostmark", Colour::new(180, 40, 40)));
        assert!(countries.add_country("norland", Colour::new(40, 40, 180)));
        countries.lock();

        let map = definitions.map_mut();
        assert!(map.add_province("plains_east", Colour::new(255, 0, 0)));
        assert!(map.add_province("plains_west", Colour::new(0, 255, 0)));
        assert!(map.add_province("coast_sea", Colour::new(0, 0, 255)));
        map.lock_provinces();
        assert!(map.set_water_province_list(&["coast_sea"]));
        assert!(map.add_region(
            "central_plain",
            &["plains_east", "plains_west"],
            Colour::new(10, 60, 10)
        ));
        map.lock_regions();
        map.terrain_type_manager_mut().lock_terrain_types();
        map.terrain_type_manager_mut().lock_terrain_type_mappings();

        assert!(definitions.setup_modifier_effects());
        definitions
    }

    pub fn build(self) -> (DefinitionManager, InstanceManager) {
        let definitions = Self::definitions();
        let start = Date::from_ymd(1836, 1, 1).unwrap();
        let mut instance = InstanceManager::setup(&definitions, start).unwrap();

        for (province, country) in self.owners {
            let province = definitions.map().province_index(province).unwrap();
            let country = definitions.countries().country_id(country).unwrap();
            assert!(instance.set_province_owner(province, Some(country), ColonyStatus::State));
        }
        for (province, production_type) in self.rgos {
            let province = definitions.map().province_index(province).unwrap();
            let id = definitions
                .production_types()
                .production_type_id(production_type)
                .unwrap();
            assert!(instance.set_rgo_production_type(&definitions, province, Some(id)));
        }
        for (province, pop_type, size, cash, artisan) in self.pops {
            let province = definitions.map().province_index(province).unwrap();
            let pop_type = definitions.pop_types().pop_type_id(pop_type).unwrap();
            let mut pop = Pop::new(pop_type, size, CultureId(0), ReligionId(0));
            pop.set_cash(cash);
            if let Some(production_type) = artisan {
                let id = definitions
                    .production_types()
                    .production_type_id(production_type)
                    .unwrap();
                pop.set_artisan(Some(ArtisanalProducer::new(id)));
            }
            assert!(instance.add_pop(&definitions, province, pop));
        }

        (definitions, instance)
    }
}

/// Province index lookup shorthand for tests.
pub fn province_index(definitions: &DefinitionManager, identifier: &str) -> ProvinceIndex {
    definitions.map().province_index(identifier).unwrap()
}

/// Country id lookup shorthand for tests.
pub fn country_id(definitions: &DefinitionManager, identifier: &str) -> CountryId {
    definitions.countries().country_id(identifier).unwrap()
}
