//! Attributed modifier accumulation.

use crate::fixed::Fixed;
use crate::modifier::effect::{ModifierEffect, ModifierEffectId, ModifierTargetMask};
use crate::modifier::{Modifier, ModifierId};
use crate::modifier::value::ModifierValue;
use crate::registry::{HasIdentifier, Registry};
use serde::{Deserialize, Serialize};

/// Where a modifier contribution came from: a country or a province.
///
/// Comparisons go through the string projection so tests are independent of
/// how the ids are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierSource {
    Country(crate::country::CountryId),
    Province(crate::map::province::ProvinceIndex),
}

impl std::fmt::Display for ModifierSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModifierSource::Country(id) => write!(f, "country #{}", id.0),
            ModifierSource::Province(index) => write!(f, "province #{}", index.0),
        }
    }
}

/// One attributed contribution inside a [`ModifierSum`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierSumEntry {
    pub modifier: ModifierId,
    pub multiplier: Fixed,
    pub source: ModifierSource,
    pub excluded_targets: ModifierTargetMask,
}

impl PartialEq for ModifierSumEntry {
    fn eq(&self, other: &Self) -> bool {
        self.modifier == other.modifier
            && self.multiplier == other.multiplier
            && self.source.to_string() == other.source.to_string()
            && self.excluded_targets == other.excluded_targets
    }
}

/// An accumulator of modifier contributions at one scope, keeping both the
/// attributed entry list and the pre-reduced [`ModifierValue`].
///
/// Folding skips any effect whose target category is excluded by the
/// entry's mask, so a province-targeted effect never leaks into a country
/// sum built with `excluded_targets = PROVINCE`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierSum {
    entries: Vec<ModifierSumEntry>,
    value_sum: ModifierValue,
}

impl ModifierSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.value_sum.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ModifierSumEntry] {
        &self.entries
    }

    pub fn value_sum(&self) -> &ModifierValue {
        &self.value_sum
    }

    /// Accumulated value for an effect, zero when absent.
    pub fn effect(&self, effect: ModifierEffectId) -> Fixed {
        self.value_sum.effect(effect)
    }

    /// Like [`effect`](Self::effect) but tolerating an unfilled cache slot.
    pub fn effect_nullcheck(&self, effect: Option<ModifierEffectId>) -> Fixed {
        effect.map_or(Fixed::ZERO, |e| self.value_sum.effect(e))
    }

    pub fn has_effect(&self, effect: ModifierEffectId) -> bool {
        self.value_sum.has_effect(effect)
    }

    /// Add one modifier, scaled by `multiplier`, skipping effects whose
    /// target category is in `excluded_targets`.
    pub fn add_modifier(
        &mut self,
        id: ModifierId,
        modifier: &Modifier,
        source: ModifierSource,
        multiplier: Fixed,
        excluded_targets: ModifierTargetMask,
        effects: &Registry<ModifierEffect>,
    ) {
        for (effect_id, value) in modifier.value().iter() {
            let Some(effect) = effects.by_index(effect_id.0 as usize) else {
                log::error!(
                    "modifier \"{}\" references unknown effect #{}",
                    modifier.identifier(),
                    effect_id.0
                );
                continue;
            };
            if excluded_targets.contains(effect.target()) {
                continue;
            }
            self.value_sum.accumulate(effect_id, value * multiplier);
        }
        self.entries.push(ModifierSumEntry {
            modifier: id,
            multiplier,
            source,
            excluded_targets,
        });
    }

    /// Fold another sum in wholesale.
    pub fn add_sum(
        &mut self,
        other: &ModifierSum,
        modifiers: &Registry<Modifier>,
        effects: &Registry<ModifierEffect>,
    ) {
        self.add_sum_filtered(other, ModifierTargetMask::NONE, None, modifiers, effects);
    }

    /// Fold another sum, additionally excluding the given target categories
    /// from every entry. Used when climbing from province to country to
    /// drop province-only effects.
    pub fn add_sum_exclude_targets(
        &mut self,
        other: &ModifierSum,
        excluded_targets: ModifierTargetMask,
        modifiers: &Registry<Modifier>,
        effects: &Registry<ModifierEffect>,
    ) {
        self.add_sum_filtered(other, excluded_targets, None, modifiers, effects);
    }

    /// Fold another sum, skipping entries attributed to `excluded_source`.
    /// Used so a country folding its states' sums does not re-apply its own
    /// country-level contributions.
    pub fn add_sum_exclude_source(
        &mut self,
        other: &ModifierSum,
        excluded_source: ModifierSource,
        modifiers: &Registry<Modifier>,
        effects: &Registry<ModifierEffect>,
    ) {
        self.add_sum_filtered(other, ModifierTargetMask::NONE, Some(excluded_source), modifiers, effects);
    }

    pub(crate) fn add_sum_filtered(
        &mut self,
        other: &ModifierSum,
        extra_excluded_targets: ModifierTargetMask,
        excluded_source: Option<ModifierSource>,
        modifiers: &Registry<Modifier>,
        effects: &Registry<ModifierEffect>,
    ) {
        for entry in &other.entries {
            if let Some(excluded) = excluded_source {
                if entry.source.to_string() == excluded.to_string() {
                    continue;
                }
            }
            let Some(modifier) = modifiers.by_index(entry.modifier.0 as usize) else {
                log::error!("modifier sum entry references unknown modifier #{}", entry.modifier.0);
                continue;
            };
            self.add_modifier(
                entry.modifier,
                modifier,
                entry.source,
                entry.multiplier,
                entry.excluded_targets.union(extra_excluded_targets),
                effects,
            );
        }
    }

    /// Entries whose modifier actually contributes to `effect`, honouring
    /// each entry's exclusion mask.
    pub fn contributing_entries<'a>(
        &'a self,
        effect: ModifierEffectId,
        modifiers: &'a Registry<Modifier>,
        effects: &'a Registry<ModifierEffect>,
    ) -> impl Iterator<Item = &'a ModifierSumEntry> {
        let target = effects.by_index(effect.0 as usize).map(ModifierEffect::target);
        self.entries.iter().filter(move |entry| {
            let excluded = target.is_some_and(|t| entry.excluded_targets.contains(t));
            !excluded
                && modifiers
                    .by_index(entry.modifier.0 as usize)
                    .is_some_and(|modifier| modifier.value().has_effect(effect))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::CountryId;
    use crate::map::province::ProvinceIndex;
    use crate::modifier::manager::tests::setup_manager;
    use crate::modifier::{ModifierType, ModifierValue};

    fn mixed_target_modifier(manager: &mut crate::modifier::ModifierManager) -> ModifierId {
        let farm = manager.effect_id("farm_rgo_size local").unwrap();
        let research = manager.effect_id("research_points_modifier").unwrap();
        let mut value = ModifierValue::new();
        value.set(farm, Fixed::HALF);
        value.set(research, Fixed::ONE);
        assert!(manager.add_modifier("estate_reform", value, ModifierType::Event, 0));
        manager.modifier_id("estate_reform").unwrap()
    }

    #[test]
    fn excluded_target_drops_province_effects() {
        let mut manager = setup_manager();
        let id = mixed_target_modifier(&mut manager);
        let modifier = manager.modifier_by_id(id).unwrap().clone();

        let mut sum = ModifierSum::new();
        sum.add_modifier(
            id,
            &modifier,
            ModifierSource::Country(CountryId(0)),
            Fixed::ONE,
            ModifierTargetMask::PROVINCE,
            manager.effects(),
        );

        let farm = manager.effect_id("farm_rgo_size local").unwrap();
        let research = manager.effect_id("research_points_modifier").unwrap();
        // The province-targeted effect is omitted from the reduced value;
        // the country-targeted one survives.
        assert!(!sum.has_effect(farm));
        assert_eq!(sum.effect(research), Fixed::ONE);
        assert_eq!(sum.entries().len(), 1);
    }

    #[test]
    fn multiplier_scales_contributions() {
        let mut manager = setup_manager();
        let id = mixed_target_modifier(&mut manager);
        let modifier = manager.modifier_by_id(id).unwrap().clone();

        let mut sum = ModifierSum::new();
        sum.add_modifier(
            id,
            &modifier,
            ModifierSource::Province(ProvinceIndex(3)),
            Fixed::TWO,
            ModifierTargetMask::NONE,
            manager.effects(),
        );
        let farm = manager.effect_id("farm_rgo_size local").unwrap();
        assert_eq!(sum.effect(farm), Fixed::ONE);
    }

    #[test]
    fn exclude_source_skips_matching_entries() {
        let mut manager = setup_manager();
        let id = mixed_target_modifier(&mut manager);
        let modifier = manager.modifier_by_id(id).unwrap().clone();
        let research = manager.effect_id("research_points_modifier").unwrap();

        let mut inner = ModifierSum::new();
        inner.add_modifier(
            id,
            &modifier,
            ModifierSource::Country(CountryId(0)),
            Fixed::ONE,
            ModifierTargetMask::NONE,
            manager.effects(),
        );
        inner.add_modifier(
            id,
            &modifier,
            ModifierSource::Province(ProvinceIndex(1)),
            Fixed::ONE,
            ModifierTargetMask::NONE,
            manager.effects(),
        );

        // Folding back while excluding the country keeps only the
        // province-sourced contribution.
        let mut outer = ModifierSum::new();
        outer.add_sum_exclude_source(
            &inner,
            ModifierSource::Country(CountryId(0)),
            manager.modifiers(),
            manager.effects(),
        );
        assert_eq!(outer.entries().len(), 1);
        assert_eq!(outer.effect(research), Fixed::ONE);
        assert_eq!(
            outer.entries()[0].source.to_string(),
            ModifierSource::Province(ProvinceIndex(1)).to_string()
        );
    }

    #[test]
    fn exclusion_masks_compose_across_folds() {
        let mut manager = setup_manager();
        let id = mixed_target_modifier(&mut manager);
        let modifier = manager.modifier_by_id(id).unwrap().clone();
        let farm = manager.effect_id("farm_rgo_size local").unwrap();
        let research = manager.effect_id("research_points_modifier").unwrap();

        let mut inner = ModifierSum::new();
        inner.add_modifier(
            id,
            &modifier,
            ModifierSource::Province(ProvinceIndex(1)),
            Fixed::ONE,
            ModifierTargetMask::NONE,
            manager.effects(),
        );
        let mut outer = ModifierSum::new();
        outer.add_sum_exclude_targets(
            &inner,
            ModifierTargetMask::PROVINCE,
            manager.modifiers(),
            manager.effects(),
        );
        assert!(!outer.has_effect(farm));
        assert_eq!(outer.effect(research), Fixed::ONE);
        // The entry remembers the widened mask.
        assert!(outer.entries()[0]
            .excluded_targets
            .contains(crate::modifier::ModifierTarget::Province));
    }

    #[test]
    fn clear_resets_everything() {
        let mut manager = setup_manager();
        let id = mixed_target_modifier(&mut manager);
        let modifier = manager.modifier_by_id(id).unwrap().clone();
        let mut sum = ModifierSum::new();
        sum.add_modifier(
            id,
            &modifier,
            ModifierSource::Country(CountryId(0)),
            Fixed::ONE,
            ModifierTargetMask::NONE,
            manager.effects(),
        );
        assert!(!sum.is_empty());
        sum.clear();
        assert!(sum.is_empty());
        assert_eq!(sum.effect(manager.effect_id("research_points_modifier").unwrap()), Fixed::ZERO);
    }
}
