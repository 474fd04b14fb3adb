//! The modifier engine: effect catalog, typed values, scope-mapped lookup
//! and attributed summation.
//!
//! Effects are catalogued once at startup and referenced everywhere by
//! index. Named modifiers bundle effect values with a provenance type; the
//! provenance decides which [`mapping::MappingScope`] resolves the string
//! keys of its source block. Sums accumulate attributed contributions per
//! country/province and keep a pre-reduced value for O(1) reads in the tick.

pub mod cache;
pub mod effect;
pub mod manager;
pub mod mapping;
pub mod sum;
pub mod value;

pub use cache::{GoodEffects, ModifierEffectCache};
pub use effect::{EffectFormat, ModifierEffect, ModifierEffectId, ModifierTarget, ModifierTargetMask};
pub use manager::ModifierManager;
pub use mapping::{MappingScope, MappingSet, ModifierEffectMapping};
pub use sum::{ModifierSource, ModifierSum, ModifierSumEntry};
pub use value::ModifierValue;

use crate::registry::HasIdentifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of a [`Modifier`] in the modifier registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub u32);

/// Provenance of a named modifier; decides its mapping scope during parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierType {
    Event,
    Static,
    Triggered,
    Crime,
    Terrain,
    Climate,
    Continent,
    Building,
    Leader,
    UnitTerrain,
    NationalValue,
    NationalFocus,
    Issue,
    Reform,
    Technology,
    Invention,
    InventionEffect,
    TechSchool,
}

impl ModifierType {
    pub const COUNT: usize = 18;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A named bundle of effect values with a provenance tag and optional icon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    identifier: String,
    value: ModifierValue,
    modifier_type: ModifierType,
    icon: u16,
}

impl Modifier {
    pub fn new(
        identifier: impl Into<String>,
        mut value: ModifierValue,
        modifier_type: ModifierType,
        icon: u16,
    ) -> Self {
        value.trim();
        Self {
            identifier: identifier.into(),
            value,
            modifier_type,
            icon,
        }
    }

    pub fn value(&self) -> &ModifierValue {
        &self.value
    }

    pub fn modifier_type(&self) -> ModifierType {
        self.modifier_type
    }

    pub fn icon(&self) -> u16 {
        self.icon
    }
}

impl HasIdentifier for Modifier {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Scopes handed to a triggered modifier's condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeContext {
    pub country: Option<crate::country::CountryId>,
    pub province: Option<crate::map::province::ProvinceIndex>,
}

/// An opaque condition script: the interpreter lives with the collaborator,
/// the core only ever calls `evaluate`.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&ScopeContext) -> bool + Send + Sync>);

impl Condition {
    pub fn new(evaluate: impl Fn(&ScopeContext) -> bool + Send + Sync + 'static) -> Self {
        Condition(Arc::new(evaluate))
    }

    pub fn always() -> Self {
        Condition(Arc::new(|_| true))
    }

    pub fn evaluate(&self, scopes: &ScopeContext) -> bool {
        (self.0)(scopes)
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Condition(..)")
    }
}
