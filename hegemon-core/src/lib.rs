//! # Hegemon Simulation Core
//!
//! Deterministic simulation core for a grand-strategy historical
//! simulator: a world state advanced one day at a time.
//!
//! The daily tick computes artisanal and resource-gathering production,
//! clears goods markets by simultaneous supply/demand price-finding, and
//! folds stacked modifiers along the province → state → country hierarchy.
//! All game-visible arithmetic is fixed-point; results are bit-identical
//! across runs and platforms.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐    ┌───────────────────┐    ┌─────────────────┐
//! │ DefinitionManager│───▶│  InstanceManager  │───▶│ gamestate views │
//! │ (locked tables)  │    │  tick(): submit ∥ │    │ (prices, pops,  │
//! └──────────────────┘    │  clear, update    │    │  aggregates)    │
//!                         └───────────────────┘    └─────────────────┘
//! ```
//!
//! ## Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Fixed`] | 64-bit fixed-point with 16 fractional bits |
//! | [`Registry`] | Lockable, append-only keyed table with stable indices |
//! | [`MapDefinition`] | Provinces, adjacencies, regions, climates, raster import |
//! | [`ModifierManager`] | Effect catalog, scope mappings, block parsing |
//! | [`ModifierSum`] | Attributed modifier accumulation per scope |
//! | [`MarketInstance`] | Per-good order collection and daily clearing |
//! | [`InstanceManager`] | The world-state driver and daily tick |
//!
//! The loader front-end, rendering, and the condition-script interpreter
//! live with collaborators; the core consumes parsed records, value trees
//! and raw pixel buffers, and emits diagnostics through the `log` facade.

pub mod bookmark;
pub mod country;
pub mod economy;
pub mod fixed;
pub mod instance;
pub mod map;
pub mod modifier;
pub mod pop;
pub mod registry;
pub mod testing;
pub mod types;

pub use bookmark::{Bookmark, BookmarkManager};
pub use country::{CountryDefinition, CountryDefinitionManager, CountryId, CountryInstance};
pub use economy::{
    ArtisanalProducer, BuyResult, BuyUpToOrder, GoodCategory, GoodDefinition,
    GoodDefinitionManager, GoodId, GoodInstance, GoodInstanceManager, Job, JobEffect,
    MarketInstance, MarketSellOrder, OrderRecipient, ProductionType, ProductionTypeId,
    ProductionTypeManager, ResourceGatheringOperation, SellResult, Settlement,
};
pub use fixed::Fixed;
pub use instance::{DefinitionManager, InstanceManager};
pub use map::{
    Adjacency, AdjacencyKind, AdjacencyRecord, ColonyStatus, MapDefinition, MapInstance,
    ProvinceDefinition, ProvinceIndex, ProvinceInstance, ProvinceRecord, Region, RegionId, State,
    StateId, StateManager, TerrainType, TerrainTypeId, TerrainTypeManager,
};
pub use modifier::{
    Condition, MappingScope, Modifier, ModifierEffect, ModifierEffectId, ModifierId,
    ModifierManager, ModifierSource, ModifierSum, ModifierTarget, ModifierTargetMask,
    ModifierType, ModifierValue, ScopeContext,
};
pub use pop::{Pop, PopSize, PopType, PopTypeId, PopTypeManager};
pub use registry::{HasIdentifier, Registry};
pub use types::{Colour, Date, Timespan, TreeValue, ValueTree};
