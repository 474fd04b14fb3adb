//! The market facade: order submission and the daily clearing pass.

use crate::economy::good::{GoodDefinitionManager, GoodId, GoodInstance, GoodInstanceManager};
use crate::economy::order::{BuyUpToOrder, MarketSellOrder, Settlement};

/// Routes orders to per-good instances and runs the clearing pass.
///
/// Submission methods take `&self` and are safe to call from the parallel
/// order-submission phase; the per-good queues carry their own locks.
/// [`execute_orders`](Self::execute_orders) requires `&mut self` and must
/// only run after the submission barrier.
#[derive(Debug, Default)]
pub struct MarketInstance {
    good_instance_manager: GoodInstanceManager,
}

impl MarketInstance {
    pub fn new() -> Self {
        Self {
            good_instance_manager: GoodInstanceManager::new(),
        }
    }

    pub fn setup(&mut self, definitions: &GoodDefinitionManager) -> bool {
        self.good_instance_manager.setup(definitions)
    }

    pub fn good_instance_manager(&self) -> &GoodInstanceManager {
        &self.good_instance_manager
    }

    pub fn good_instance(&self, good: GoodId) -> Option<&GoodInstance> {
        self.good_instance_manager.good_instance(good)
    }

    /// Thread safe during the submission phase.
    pub fn place_buy_up_to_order(&self, order: BuyUpToOrder) {
        match self.good_instance_manager.good_instance(order.good) {
            Some(instance) => instance.add_buy_up_to_order(order),
            None => log::error!("buy order for unknown good #{}", order.good.0),
        }
    }

    /// Thread safe during the submission phase.
    pub fn place_market_sell_order(&self, order: MarketSellOrder) {
        match self.good_instance_manager.good_instance(order.good) {
            Some(instance) => instance.add_market_sell_order(order),
            None => log::error!("sell order for unknown good #{}", order.good.0),
        }
    }

    /// Clear every good in turn, invoking `settle` for each executed order.
    ///
    /// Goods are processed sequentially: settlements mutate pops, which are
    /// shared across goods, so cross-good parallelism would race.
    pub fn execute_orders(&mut self, settle: &mut dyn FnMut(Settlement)) {
        for instance in self.good_instance_manager.good_instances_mut() {
            instance.execute_orders(settle);
        }
    }
}
