//! The economic engine: goods and the market, production types, RGOs and
//! artisanal producers.

pub mod artisan;
pub mod good;
pub mod market;
pub mod order;
pub mod production_type;
pub mod rgo;

pub use artisan::ArtisanalProducer;
pub use good::{GoodCategory, GoodDefinition, GoodDefinitionManager, GoodId, GoodInstance, GoodInstanceManager};
pub use market::MarketInstance;
pub use order::{BuyResult, BuyUpToOrder, MarketSellOrder, OrderRecipient, SellResult, Settlement};
pub use production_type::{Job, JobEffect, ProductionType, ProductionTypeId, ProductionTypeManager};
pub use rgo::{Employee, ResourceGatheringOperation};
