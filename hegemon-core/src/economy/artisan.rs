//! Artisanal production: pop-attached producers buying inputs on the
//! market and selling their output.

use crate::economy::good::GoodId;
use crate::economy::market::MarketInstance;
use crate::economy::order::{BuyUpToOrder, MarketSellOrder, OrderRecipient};
use crate::economy::production_type::{ProductionTypeId, ProductionTypeManager};
use crate::fixed::Fixed;
use crate::map::province::ProvinceIndex;
use crate::pop::Pop;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A producer attached to one pop: an input stockpile and a production
/// type. Output scales with the pop's size against the type's base
/// workforce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtisanalProducer {
    production_type: ProductionTypeId,
    stockpile: BTreeMap<GoodId, Fixed>,
    current_production: Fixed,
}

impl ArtisanalProducer {
    pub fn new(production_type: ProductionTypeId) -> Self {
        Self {
            production_type,
            stockpile: BTreeMap::new(),
            current_production: Fixed::ZERO,
        }
    }

    pub fn production_type(&self) -> ProductionTypeId {
        self.production_type
    }

    pub fn current_production(&self) -> Fixed {
        self.current_production
    }

    pub fn stockpile_of(&self, good: GoodId) -> Fixed {
        self.stockpile.get(&good).copied().unwrap_or(Fixed::ZERO)
    }

    pub fn set_stockpile(&mut self, good: GoodId, quantity: Fixed) {
        self.stockpile.insert(good, quantity);
    }

    pub(crate) fn add_to_stockpile(&mut self, good: GoodId, quantity: Fixed) {
        let entry = self.stockpile.entry(good).or_insert(Fixed::ZERO);
        *entry += quantity;
    }
}

/// One artisanal day: consume stockpiled inputs, order what is missing
/// (bounded by the pop's cash), produce, and put the output up for sale.
///
/// The order's money is debited from the pop here; the buy settlement
/// refunds whatever the cleared price leaves over.
pub fn artisan_tick(
    pop: &mut Pop,
    province: ProvinceIndex,
    pop_index: usize,
    production_types: &ProductionTypeManager,
    market: &MarketInstance,
) {
    let Some(mut artisan) = pop.take_artisan() else {
        return;
    };
    let Some(production_type) = production_types.production_type(artisan.production_type) else {
        log::error!(
            "artisan pop references unknown production type #{}",
            artisan.production_type.0
        );
        pop.put_artisan(artisan);
        return;
    };

    let pop_size = Fixed::from_int(pop.size());
    let base_workforce = Fixed::from_int(production_type.base_workforce_size());
    let mut inputs_bought_scalar = Fixed::ONE;

    if !production_type.input_goods().is_empty() {
        let mut demand: BTreeMap<GoodId, Fixed> = BTreeMap::new();
        let mut goods_to_buy_and_max_price: BTreeMap<GoodId, Fixed> = BTreeMap::new();

        for (&good, &base_desired_quantity) in production_type.input_goods() {
            let desired_quantity = base_desired_quantity * pop_size / base_workforce;
            if desired_quantity <= Fixed::ZERO {
                continue;
            }
            demand.insert(good, desired_quantity);
            inputs_bought_scalar =
                Fixed::min(artisan.stockpile_of(good) / desired_quantity, inputs_bought_scalar);
            match market.good_instance(good) {
                Some(instance) => {
                    goods_to_buy_and_max_price.insert(good, instance.max_next_price());
                }
                None => log::error!("artisan input references unknown good #{}", good.0),
            }
        }

        if inputs_bought_scalar > Fixed::ZERO {
            for (&good, &desired_quantity) in &demand {
                let remaining = Fixed::max(
                    Fixed::ZERO,
                    artisan.stockpile_of(good) - desired_quantity * inputs_bought_scalar,
                );
                artisan.set_stockpile(good, remaining);
                if remaining >= desired_quantity {
                    goods_to_buy_and_max_price.remove(&good);
                }
            }
        }

        let total_cash_to_spend = pop.cash();
        if total_cash_to_spend > Fixed::ZERO && !goods_to_buy_and_max_price.is_empty() {
            // Find the satisfaction level the pop can afford, dropping any
            // input whose stockpile already meets it, until stable.
            let mut max_possible_satisfaction = Fixed::ONE;
            let mut at_or_below_optimum = false;
            while !at_or_below_optimum && !goods_to_buy_and_max_price.is_empty() {
                at_or_below_optimum = true;
                let mut total_demand_value = Fixed::ZERO;
                let mut total_stockpile_value = Fixed::ZERO;
                for (&good, &max_price) in &goods_to_buy_and_max_price {
                    total_demand_value += max_price * demand[&good];
                    total_stockpile_value += max_price * artisan.stockpile_of(good);
                }
                max_possible_satisfaction = Fixed::min(
                    Fixed::ONE,
                    (total_stockpile_value + total_cash_to_spend) / total_demand_value,
                );

                let stockpile = &artisan;
                goods_to_buy_and_max_price.retain(|&good, _| {
                    let optimal_quantity = demand[&good] * max_possible_satisfaction;
                    if stockpile.stockpile_of(good) >= optimal_quantity {
                        at_or_below_optimum = false;
                        false
                    } else {
                        true
                    }
                });
            }

            for (&good, &max_price) in &goods_to_buy_and_max_price {
                let optimal_quantity = demand[&good] * max_possible_satisfaction;
                let money_to_spend = optimal_quantity * max_price;
                pop.spend_cash(money_to_spend);
                market.place_buy_up_to_order(BuyUpToOrder {
                    good,
                    max_quantity: optimal_quantity,
                    money_to_spend,
                    recipient: OrderRecipient::ArtisanInput {
                        province,
                        pop: pop_index,
                        good,
                    },
                });
            }
        }
    }

    artisan.current_production =
        production_type.base_output_quantity() * inputs_bought_scalar * pop_size / base_workforce;

    if artisan.current_production > Fixed::ZERO {
        market.place_market_sell_order(MarketSellOrder {
            good: production_type.output_good(),
            quantity: artisan.current_production,
            recipient: OrderRecipient::ArtisanOutput {
                province,
                pop: pop_index,
            },
        });
    }

    pop.put_artisan(artisan);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::good::{GoodCategory, GoodDefinitionManager};
    use crate::economy::order::Settlement;
    use crate::economy::production_type::{Job, JobEffect, ProductionType};
    use crate::pop::{CultureId, PopTypeId, ReligionId};
    use crate::types::colour::Colour;

    const GRAIN: GoodId = GoodId(0);
    const BREAD: GoodId = GoodId(1);

    fn setup() -> (ProductionTypeManager, MarketInstance, ProductionTypeId) {
        let mut goods = GoodDefinitionManager::new();
        goods.add_good_definition(
            "grain",
            Colour::new(217, 170, 109),
            GoodCategory::RawMaterial,
            Fixed::ONE,
            true,
        );
        goods.add_good_definition(
            "bread",
            Colour::new(240, 200, 120),
            GoodCategory::Consumer,
            Fixed::from_int(2),
            true,
        );
        goods.lock();

        let mut market = MarketInstance::new();
        assert!(market.setup(&goods));

        let mut production_types = ProductionTypeManager::new();
        let mut inputs = BTreeMap::new();
        inputs.insert(GRAIN, Fixed::from_int(10));
        assert!(production_types.add_production_type(ProductionType::new(
            "artisan_bread",
            BREAD,
            Fixed::from_int(5),
            10_000,
            None,
            vec![Job {
                pop_type: PopTypeId(0),
                effect: JobEffect::Throughput,
                effect_multiplier: Fixed::ONE,
                amount: Fixed::ONE,
            }],
            inputs,
            false,
            false,
        )));
        production_types.lock();
        let id = production_types.production_type_id("artisan_bread").unwrap();
        (production_types, market, id)
    }

    fn artisan_pop(production_type: ProductionTypeId, size: i64, cash: Fixed) -> Pop {
        let mut pop = Pop::new(PopTypeId(0), size, CultureId(0), ReligionId(0));
        pop.set_cash(cash);
        pop.set_artisan(Some(ArtisanalProducer::new(production_type)));
        pop
    }

    #[test]
    fn full_stockpile_produces_without_buying() {
        let (production_types, mut market, id) = setup();
        // Pop of 10k needs exactly the base input of 10 grain.
        let mut pop = artisan_pop(id, 10_000, Fixed::from_int(100));
        let mut artisan = ArtisanalProducer::new(id);
        artisan.set_stockpile(GRAIN, Fixed::from_int(10));
        pop.set_artisan(Some(artisan));
        artisan_tick(&mut pop, ProvinceIndex(1), 0, &production_types, &market);

        // Inputs fully satisfied: full production, stockpile consumed.
        let artisan = pop.artisan().unwrap();
        assert_eq!(artisan.current_production(), Fixed::from_int(5));
        assert_eq!(artisan.stockpile_of(GRAIN), Fixed::ZERO);

        // No buy order was needed; one sell order was placed.
        let mut buys = 0;
        let mut sells = 0;
        market.execute_orders(&mut |settlement| match settlement {
            Settlement::Buy { .. } => buys += 1,
            Settlement::Sell { .. } => sells += 1,
        });
        assert_eq!((buys, sells), (0, 1));
        assert_eq!(
            market.good_instance(BREAD).unwrap().total_supply_yesterday(),
            Fixed::from_int(5)
        );
    }

    #[test]
    fn empty_stockpile_orders_inputs_and_idles() {
        let (production_types, mut market, id) = setup();
        let mut pop = artisan_pop(id, 10_000, Fixed::from_int(100));
        artisan_tick(&mut pop, ProvinceIndex(1), 0, &production_types, &market);

        // Nothing stocked: no production, a buy order for the full demand.
        assert_eq!(pop.artisan().unwrap().current_production(), Fixed::ZERO);
        let grain_max = Fixed::ONE + Fixed::ONE_HUNDREDTH;
        // Money was debited up front at the valuation price.
        assert_eq!(pop.cash(), Fixed::from_int(100) - Fixed::from_int(10) * grain_max);

        let mut buy = None;
        market.execute_orders(&mut |settlement| {
            if let Settlement::Buy { recipient, result } = settlement {
                buy = Some((recipient, result));
            }
        });
        let (recipient, result) = buy.unwrap();
        assert_eq!(
            recipient,
            OrderRecipient::ArtisanInput {
                province: ProvinceIndex(1),
                pop: 0,
                good: GRAIN,
            }
        );
        // Demand exceeded supply (none), price rose to max_next, and the
        // money sent buys back exactly the ordered quantity at that price.
        let money_sent = Fixed::from_int(10) * grain_max;
        assert_eq!(result.quantity_bought, money_sent / grain_max);
        assert_eq!(result.money_left, money_sent - result.quantity_bought * grain_max);
    }

    #[test]
    fn cash_limits_order_size() {
        let (production_types, mut market, id) = setup();
        // Pop can only afford half its demand value at the valuation price.
        let grain_max = Fixed::ONE + Fixed::ONE_HUNDREDTH;
        let half_value = Fixed::from_int(5) * grain_max;
        let mut pop = artisan_pop(id, 10_000, half_value);
        artisan_tick(&mut pop, ProvinceIndex(1), 0, &production_types, &market);

        // max_satisfaction = cash / (demand × price) = 0.5, so the order
        // asks for half the desired input and all the cash.
        assert_eq!(pop.cash(), Fixed::ZERO);
        market.execute_orders(&mut |_| {});
        assert_eq!(
            market.good_instance(GRAIN).unwrap().total_demand_yesterday(),
            Fixed::from_int(5)
        );
    }
}
