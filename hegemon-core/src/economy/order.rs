//! Market orders and their settlement results.
//!
//! Orders carry a typed recipient instead of a closure: clearing produces
//! [`Settlement`]s which the driver dispatches synchronously, mutating pop
//! cash and stockpiles from the single clearing thread. Equivalent to
//! continuation callbacks, but with one visible mutation site.

use crate::economy::good::GoodId;
use crate::fixed::Fixed;
use crate::map::province::ProvinceIndex;
use serde::{Deserialize, Serialize};

/// Who a settlement is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderRecipient {
    /// An artisanal pop's input purchase: bought goods go to its stockpile,
    /// leftover money back to its cash.
    ArtisanInput {
        province: ProvinceIndex,
        pop: usize,
        good: GoodId,
    },
    /// An artisanal pop's output sale: proceeds become artisan income.
    ArtisanOutput { province: ProvinceIndex, pop: usize },
    /// A province RGO's output sale: proceeds are distributed to owner and
    /// worker pops.
    RgoOutput { province: ProvinceIndex },
}

/// A bounded buy: up to `max_quantity`, spending at most `money_to_spend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyUpToOrder {
    pub good: GoodId,
    pub max_quantity: Fixed,
    pub money_to_spend: Fixed,
    pub recipient: OrderRecipient,
}

/// A fixed-quantity sale at whatever the cleared price turns out to be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSellOrder {
    pub good: GoodId,
    pub quantity: Fixed,
    pub recipient: OrderRecipient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyResult {
    pub quantity_bought: Fixed,
    pub money_left: Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellResult {
    pub quantity_sold: Fixed,
    pub money: Fixed,
}

/// One executed order, handed to the clearing dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Buy {
        recipient: OrderRecipient,
        result: BuyResult,
    },
    Sell {
        recipient: OrderRecipient,
        result: SellResult,
    },
}
