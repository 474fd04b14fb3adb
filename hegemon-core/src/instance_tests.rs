//! Unit tests for the world-state driver and the daily tick.

use super::*;
use crate::testing::{country_id, province_index, WorldBuilder};
use crate::types::tree::{TreeValue, ValueTree};

#[test]
fn tick_advances_date() {
    let (definitions, mut instance) = WorldBuilder::new().build();
    assert!(instance.start_new_game(&definitions));
    assert_eq!(instance.today(), Date::from_ymd(1836, 1, 1).unwrap());
    instance.tick(&definitions);
    assert_eq!(instance.today(), Date::from_ymd(1836, 1, 2).unwrap());
    instance.tick(&definitions);
    assert_eq!(instance.today(), Date::from_ymd(1836, 1, 3).unwrap());
}

#[test]
fn states_partition_by_owner_and_colony_status() {
    let (definitions, mut instance) = WorldBuilder::new()
        .owner("plains_east", "ostmark")
        .owner("plains_west", "norland")
        .build();
    assert!(instance.start_new_game(&definitions));

    // One region, two owners: two states, each with one province.
    let state_manager = instance.map_instance().state_manager();
    assert_eq!(state_manager.state_count(), 2);
    assert_eq!(state_manager.state_sets().len(), 1);

    let east = province_index(&definitions, "plains_east");
    let east_state = instance
        .map_instance()
        .province_instance(east)
        .unwrap()
        .state()
        .unwrap();
    assert_eq!(
        state_manager.state(east_state).unwrap().owner(),
        Some(country_id(&definitions, "ostmark"))
    );
    let ostmark = instance
        .country_instance(country_id(&definitions, "ostmark"))
        .unwrap();
    assert_eq!(ostmark.states().len(), 1);
}

#[test]
fn rgo_owner_share_cap() {
    // 100 workers in the province, 50 owner pops in the state: the owner
    // share caps at min(0.5, 2 × 50 / 100) = 0.5 of the revenue.
    let (definitions, mut instance) = WorldBuilder::new()
        .owner("plains_east", "ostmark")
        .owner("plains_west", "ostmark")
        .rgo("plains_east", "grain_farm")
        .pop("plains_east", "farmers", 100, Fixed::ZERO)
        .pop("plains_east", "aristocrats", 50, Fixed::ZERO)
        .build();
    assert!(instance.start_new_game(&definitions));

    let east = province_index(&definitions, "plains_east");
    for pop in instance
        .map_instance
        .province_instance_mut(east)
        .unwrap()
        .pops_mut()
    {
        pop.reset_daily_income();
        pop.set_cash(Fixed::ZERO);
    }

    {
        let (provinces, states) = instance.map_instance.provinces_and_states_mut();
        let province = &mut provinces[east.0 as usize - 1];
        let (output, _) = run_rgo_production(province, states, &definitions).unwrap();
        assert!(output > Fixed::ZERO);
    }
    rgo::pay_employees(
        &mut instance.map_instance,
        east,
        Fixed::from_int(1000),
        definitions.production_types(),
        definitions.pop_types(),
    );

    let province = instance.map_instance().province_instance(east).unwrap();
    assert_eq!(province.rgo().total_owner_income(), Fixed::from_int(500));
    assert_eq!(province.rgo().total_employee_income(), Fixed::from_int(500));
    assert_eq!(province.rgo().revenue_yesterday(), Fixed::from_int(1000));

    // The income reached the pops: aristocrats took 500, farmers 500.
    let farmers = definitions.pop_types().pop_type_id("farmers").unwrap();
    for pop in province.pops() {
        if pop.pop_type() == farmers {
            assert_eq!(pop.rgo_worker_income_today(), Fixed::from_int(500));
            assert_eq!(pop.rgo_owner_income_today(), Fixed::ZERO);
        } else {
            assert_eq!(pop.rgo_owner_income_today(), Fixed::from_int(500));
        }
    }
    // No rounding loss here: owner + employee income equals the revenue.
    assert_eq!(
        province.rgo().total_owner_income() + province.rgo().total_employee_income(),
        Fixed::from_int(1000)
    );
}

#[test]
fn slave_only_rgo_burns_revenue() {
    let (definitions, mut instance) = WorldBuilder::new()
        .owner("plains_east", "ostmark")
        .rgo("plains_east", "grain_farm")
        .pop("plains_east", "slaves", 100, Fixed::ZERO)
        .build();
    assert!(instance.start_new_game(&definitions));

    let east = province_index(&definitions, "plains_east");
    let province = instance.map_instance().province_instance(east).unwrap();
    // Revenue was recorded but nobody was paid; the money left circulation.
    assert!(province.rgo().revenue_yesterday() > Fixed::ZERO);
    assert_eq!(province.rgo().total_owner_income(), Fixed::ZERO);
    assert_eq!(province.rgo().total_employee_income(), Fixed::ZERO);
    assert_eq!(province.pops()[0].cash(), Fixed::ZERO);
}

#[test]
fn daily_tick_clears_the_grain_market() {
    let (definitions, mut instance) = WorldBuilder::new()
        .owner("plains_east", "ostmark")
        .owner("plains_west", "ostmark")
        .rgo("plains_east", "grain_farm")
        .pop("plains_east", "farmers", 100, Fixed::ZERO)
        .pop("plains_east", "aristocrats", 50, Fixed::ZERO)
        .artisan_pop("plains_west", "artisans", 100, Fixed::from_int(50), "artisan_tools")
        .build();
    assert!(instance.start_new_game(&definitions));

    instance.tick(&definitions);

    let grain = definitions.goods().good_id("grain").unwrap();
    let grain_market = instance.market().good_instance(grain).unwrap();
    // The artisan demanded 10 grain; the farm supplied less, so the price
    // rose by the one-cent bound.
    assert_eq!(grain_market.total_demand_yesterday(), Fixed::from_int(10));
    assert!(grain_market.total_supply_yesterday() > Fixed::ZERO);
    assert!(grain_market.total_supply_yesterday() < Fixed::from_int(10));
    assert_eq!(grain_market.price(), Fixed::ONE + Fixed::ONE_HUNDREDTH);

    // The artisan's money bought the full order back at the new price.
    let west = province_index(&definitions, "plains_west");
    let artisan_pop = &instance.map_instance().province_instance(west).unwrap().pops()[0];
    assert_eq!(
        artisan_pop.artisan().unwrap().stockpile_of(grain),
        Fixed::from_int(10)
    );
    assert!(artisan_pop.cash() < Fixed::from_int(50));
    assert!(artisan_pop.cash() > Fixed::ZERO);

    // The farm's revenue arrived and was fully distributed.
    let east = province_index(&definitions, "plains_east");
    let rgo = instance.map_instance().province_instance(east).unwrap().rgo();
    let expected_revenue = grain_market.total_supply_yesterday() * grain_market.price();
    assert_eq!(rgo.revenue_yesterday(), expected_revenue);
    assert!(rgo.total_owner_income() + rgo.total_employee_income() <= expected_revenue);

    // Next day the stocked artisan produces and sells tools into an empty
    // market, which drifts the tools price down.
    instance.tick(&definitions);
    let tools = definitions.goods().good_id("tools").unwrap();
    let tools_market = instance.market().good_instance(tools).unwrap();
    assert_eq!(tools_market.total_supply_yesterday(), Fixed::from_int(5));
    assert_eq!(tools_market.price(), Fixed::from_int(2) - Fixed::ONE_HUNDREDTH);
    let artisan_pop = &instance.map_instance().province_instance(west).unwrap().pops()[0];
    assert_eq!(
        artisan_pop.artisan_income_today(),
        Fixed::from_int(5) * (Fixed::from_int(2) - Fixed::ONE_HUNDREDTH)
    );
}

#[test]
fn country_sum_excludes_province_targets() {
    let mut definitions = WorldBuilder::definitions();
    let mut block = ValueTree::new();
    // farm_rgo_size resolves to the province-targeted local effect through
    // EVENT → BASE_PROVINCE; research_points_modifier falls through to the
    // country catalogue.
    block.push_scalar("farm_rgo_size", "0.5");
    block.push_scalar("research_points_modifier", "0.25");
    let mut root = ValueTree::new();
    root.push("harvest_boom", TreeValue::Tree(block));
    assert!(definitions.modifiers_mut().load_event_modifiers(&root));
    let harvest_boom = definitions.modifiers().modifier_id("harvest_boom").unwrap();

    let start = Date::from_ymd(1836, 1, 1).unwrap();
    let mut instance = InstanceManager::setup(&definitions, start).unwrap();
    let east = definitions.map().province_index("plains_east").unwrap();
    let ostmark = definitions.countries().country_id("ostmark").unwrap();
    assert!(instance.set_province_owner(east, Some(ostmark), ColonyStatus::State));
    assert!(instance.add_province_event_modifier(&definitions, east, harvest_boom, None));
    assert!(instance.start_new_game(&definitions));

    let farm_size = definitions.modifiers().effect_id("farm_rgo_size local").unwrap();
    let research = definitions
        .modifiers()
        .effect_id("research_points_modifier")
        .unwrap();

    let province_sum = instance
        .map_instance()
        .province_instance(east)
        .unwrap()
        .modifier_sum()
        .clone();
    assert_eq!(province_sum.effect(farm_size), Fixed::HALF);
    assert_eq!(province_sum.effect(research), Fixed::ONE / Fixed::from_int(4));

    // Climbing to the country drops the province-targeted effect but
    // keeps the country-targeted one.
    let country_sum = instance.country_instance(ostmark).unwrap().modifier_sum();
    assert!(!country_sum.has_effect(farm_size));
    assert_eq!(country_sum.effect(research), Fixed::ONE / Fixed::from_int(4));
}

#[test]
fn event_modifiers_expire() {
    let mut definitions = WorldBuilder::definitions();
    let mut block = ValueTree::new();
    block.push_scalar("local_rgo_output", "0.5");
    let mut root = ValueTree::new();
    root.push("good_weather", TreeValue::Tree(block));
    assert!(definitions.modifiers_mut().load_event_modifiers(&root));
    let good_weather = definitions.modifiers().modifier_id("good_weather").unwrap();

    let start = Date::from_ymd(1836, 1, 1).unwrap();
    let mut instance = InstanceManager::setup(&definitions, start).unwrap();
    let east = definitions.map().province_index("plains_east").unwrap();
    let expiry = Date::from_ymd(1836, 1, 2).unwrap();
    assert!(instance.add_province_event_modifier(&definitions, east, good_weather, Some(expiry)));
    assert!(instance.start_new_game(&definitions));

    let local_output = definitions.modifiers().effect_id("local_rgo_output").unwrap();
    let effect_value = |instance: &InstanceManager| {
        instance
            .map_instance()
            .province_instance(east)
            .unwrap()
            .modifier_sum()
            .effect(local_output)
    };
    assert_eq!(effect_value(&instance), Fixed::HALF);

    // The modifier lapses once the expiry date is reached.
    instance.tick(&definitions);
    assert_eq!(effect_value(&instance), Fixed::ZERO);
    assert!(instance
        .map_instance()
        .province_instance(east)
        .unwrap()
        .event_modifiers()
        .is_empty());
}

#[test]
fn research_accrues_from_national_modifiers() {
    let mut definitions = WorldBuilder::definitions();
    let mut value = crate::modifier::ModifierValue::new();
    value.set(
        definitions.modifiers().effect_id("research_points").unwrap(),
        Fixed::ONE,
    );
    value.set(
        definitions
            .modifiers()
            .effect_id("research_points_modifier")
            .unwrap(),
        Fixed::HALF,
    );
    assert!(definitions
        .modifiers_mut()
        .add_static_modifier("academy_system", value));
    let academy = definitions.modifiers().modifier_id("academy_system").unwrap();

    let start = Date::from_ymd(1836, 1, 1).unwrap();
    let mut instance = InstanceManager::setup(&definitions, start).unwrap();
    let ostmark = definitions.countries().country_id("ostmark").unwrap();
    assert!(instance.add_national_modifier(&definitions, ostmark, academy));
    assert!(instance.start_new_game(&definitions));

    instance.tick(&definitions);
    // Daily gain: 1 × (1 + 0.5).
    assert_eq!(
        instance.country_instance(ostmark).unwrap().research_points(),
        Fixed::ONE_POINT_FIVE
    );
    instance.tick(&definitions);
    assert_eq!(
        instance.country_instance(ostmark).unwrap().research_points(),
        Fixed::ONE_POINT_FIVE + Fixed::ONE_POINT_FIVE
    );
}
