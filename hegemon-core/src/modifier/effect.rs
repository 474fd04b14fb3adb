//! Typed numeric effect definitions.

use crate::registry::HasIdentifier;
use serde::{Deserialize, Serialize};

/// Index of a [`ModifierEffect`] in the effect registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ModifierEffectId(pub u16);

/// How a UI should render an effect's value. Not used by arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectFormat {
    Int,
    ProportionDecimal,
    PercentageDecimal,
    RawDecimal,
}

/// The single scope category an effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierTarget {
    Country,
    Province,
    Unit,
}

/// A set of [`ModifierTarget`]s, used as the exclusion mask in
/// [`crate::modifier::ModifierSum`] entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct ModifierTargetMask(u8);

impl ModifierTargetMask {
    pub const NONE: ModifierTargetMask = ModifierTargetMask(0);
    pub const COUNTRY: ModifierTargetMask = ModifierTargetMask(1);
    pub const PROVINCE: ModifierTargetMask = ModifierTargetMask(1 << 1);
    pub const UNIT: ModifierTargetMask = ModifierTargetMask(1 << 2);

    const fn bit(target: ModifierTarget) -> u8 {
        match target {
            ModifierTarget::Country => 1,
            ModifierTarget::Province => 1 << 1,
            ModifierTarget::Unit => 1 << 2,
        }
    }

    #[inline]
    pub const fn contains(self, target: ModifierTarget) -> bool {
        self.0 & Self::bit(target) != 0
    }

    #[inline]
    pub const fn union(self, other: ModifierTargetMask) -> ModifierTargetMask {
        ModifierTargetMask(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<ModifierTarget> for ModifierTargetMask {
    fn from(target: ModifierTarget) -> Self {
        ModifierTargetMask(Self::bit(target))
    }
}

/// A catalogued numeric effect: what a modifier entry can change.
///
/// `mapping_key` is the string modifier blocks use to refer to the effect;
/// it is often the identifier itself, but effects sharing a key are
/// disambiguated by which scope mapping resolves it (e.g. `combat_width`
/// reaches `combat_width add` through country-side mappings and
/// `combat_width percentage_change` through the terrain mapping).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierEffect {
    identifier: String,
    /// Whether a positive value is good for the player. UI sign colouring
    /// only, never arithmetic.
    positive_good: bool,
    format: EffectFormat,
    target: ModifierTarget,
    mapping_key: String,
}

impl ModifierEffect {
    pub fn new(
        identifier: impl Into<String>,
        positive_good: bool,
        format: EffectFormat,
        target: ModifierTarget,
        mapping_key: Option<&str>,
    ) -> Self {
        let identifier = identifier.into();
        let mapping_key = mapping_key.map(str::to_owned).unwrap_or_else(|| identifier.clone());
        Self {
            identifier,
            positive_good,
            format,
            target,
            mapping_key,
        }
    }

    pub fn positive_good(&self) -> bool {
        self.positive_good
    }

    pub fn format(&self) -> EffectFormat {
        self.format
    }

    pub fn target(&self) -> ModifierTarget {
        self.target
    }

    pub fn mapping_key(&self) -> &str {
        &self.mapping_key
    }
}

impl HasIdentifier for ModifierEffect {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}
