//! Sparse effect → value mappings.

use crate::fixed::Fixed;
use crate::modifier::effect::ModifierEffectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A sparse mapping from modifier effects to fixed-point values.
///
/// Keys iterate in effect-id order so folds are deterministic. Zero entries
/// are dropped by [`trim`](Self::trim).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierValue {
    values: BTreeMap<ModifierEffectId, Fixed>,
}

impl ModifierValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, effect: ModifierEffectId, value: Fixed) {
        self.values.insert(effect, value);
    }

    /// Value for an effect, zero when absent.
    pub fn effect(&self, effect: ModifierEffectId) -> Fixed {
        self.values.get(&effect).copied().unwrap_or(Fixed::ZERO)
    }

    pub fn has_effect(&self, effect: ModifierEffectId) -> bool {
        self.values.contains_key(&effect)
    }

    pub fn effect_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModifierEffectId, Fixed)> + '_ {
        self.values.iter().map(|(&effect, &value)| (effect, value))
    }

    /// Drop zero entries.
    pub fn trim(&mut self) {
        self.values.retain(|_, value| *value != Fixed::ZERO);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Accumulate `value × multiplier` onto an effect.
    pub fn accumulate(&mut self, effect: ModifierEffectId, value: Fixed) {
        let entry = self.values.entry(effect).or_insert(Fixed::ZERO);
        *entry += value;
    }
}

impl AddAssign<&ModifierValue> for ModifierValue {
    fn add_assign(&mut self, right: &ModifierValue) {
        for (effect, value) in right.iter() {
            self.accumulate(effect, value);
        }
    }
}

impl Add<&ModifierValue> for ModifierValue {
    type Output = ModifierValue;
    fn add(mut self, right: &ModifierValue) -> ModifierValue {
        self += right;
        self
    }
}

impl SubAssign<&ModifierValue> for ModifierValue {
    fn sub_assign(&mut self, right: &ModifierValue) {
        for (effect, value) in right.iter() {
            self.accumulate(effect, -value);
        }
    }
}

impl Sub<&ModifierValue> for ModifierValue {
    type Output = ModifierValue;
    fn sub(mut self, right: &ModifierValue) -> ModifierValue {
        self -= right;
        self
    }
}

impl Neg for ModifierValue {
    type Output = ModifierValue;
    fn neg(mut self) -> ModifierValue {
        for value in self.values.values_mut() {
            *value = -*value;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(id: u16) -> ModifierEffectId {
        ModifierEffectId(id)
    }

    #[test]
    fn absent_effect_is_zero() {
        let value = ModifierValue::new();
        assert_eq!(value.effect(effect(3)), Fixed::ZERO);
        assert!(!value.has_effect(effect(3)));
    }

    #[test]
    fn add_and_subtract() {
        let mut a = ModifierValue::new();
        a.set(effect(0), Fixed::ONE);
        a.set(effect(1), Fixed::HALF);
        let mut b = ModifierValue::new();
        b.set(effect(1), Fixed::HALF);
        b.set(effect(2), Fixed::from_int(2));

        a += &b;
        assert_eq!(a.effect(effect(0)), Fixed::ONE);
        assert_eq!(a.effect(effect(1)), Fixed::ONE);
        assert_eq!(a.effect(effect(2)), Fixed::from_int(2));

        a -= &b;
        assert_eq!(a.effect(effect(1)), Fixed::HALF);
        assert_eq!(a.effect(effect(2)), Fixed::ZERO);
    }

    #[test]
    fn trim_drops_zeroes() {
        let mut value = ModifierValue::new();
        value.set(effect(0), Fixed::ONE);
        value.set(effect(1), Fixed::ZERO);
        value.trim();
        assert_eq!(value.effect_count(), 1);
        assert!(value.has_effect(effect(0)));
    }
}
