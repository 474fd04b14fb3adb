//! Direct handles to the effects the daily tick reads.
//!
//! Looked up once during catalog setup so production code never does string
//! lookups. Slots are `Option` so a partially configured catalog degrades
//! to zero-valued effects instead of panicking.

use crate::modifier::effect::ModifierEffectId;
use serde::{Deserialize, Serialize};

/// Per-good effect handles, generated for every good definition.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GoodEffects {
    pub rgo_size: Option<ModifierEffectId>,
    pub rgo_output: Option<ModifierEffectId>,
    pub rgo_throughput: Option<ModifierEffectId>,
}

/// Cached effect ids for the hot paths of the production tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierEffectCache {
    pub rgo_output: Option<ModifierEffectId>,
    pub rgo_throughput: Option<ModifierEffectId>,
    pub local_rgo_output: Option<ModifierEffectId>,
    pub local_rgo_throughput: Option<ModifierEffectId>,

    pub farm_rgo_size_global: Option<ModifierEffectId>,
    pub farm_rgo_size_local: Option<ModifierEffectId>,
    pub farm_rgo_output_global: Option<ModifierEffectId>,
    pub farm_rgo_output_local: Option<ModifierEffectId>,
    pub farm_rgo_throughput_global: Option<ModifierEffectId>,

    pub mine_rgo_size_global: Option<ModifierEffectId>,
    pub mine_rgo_size_local: Option<ModifierEffectId>,
    pub mine_rgo_output_global: Option<ModifierEffectId>,
    pub mine_rgo_output_local: Option<ModifierEffectId>,
    pub mine_rgo_throughput_global: Option<ModifierEffectId>,

    pub research_points: Option<ModifierEffectId>,
    pub research_points_modifier: Option<ModifierEffectId>,
    pub supply_limit: Option<ModifierEffectId>,

    /// Indexed by [`crate::economy::good::GoodId`].
    good_effects: Vec<GoodEffects>,
}

impl ModifierEffectCache {
    pub fn good_effects(&self, good: crate::economy::good::GoodId) -> GoodEffects {
        self.good_effects
            .get(good.0 as usize)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn set_good_effects(&mut self, effects: Vec<GoodEffects>) {
        self.good_effects = effects;
    }
}
