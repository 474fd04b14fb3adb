//! Scope-specific name resolution for modifier effects.

use crate::modifier::effect::{ModifierEffect, ModifierEffectId};
use crate::registry::{HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The seven named mapping scopes, in their fixed creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingScope {
    Leader,
    Technology,
    UnitTerrain,
    BaseCountry,
    BaseProvince,
    Event,
    Terrain,
}

impl MappingScope {
    pub const COUNT: usize = 7;

    pub const ALL: [MappingScope; Self::COUNT] = [
        MappingScope::Leader,
        MappingScope::Technology,
        MappingScope::UnitTerrain,
        MappingScope::BaseCountry,
        MappingScope::BaseProvince,
        MappingScope::Event,
        MappingScope::Terrain,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Fallback wiring: BASE_PROVINCE → BASE_COUNTRY; EVENT and TERRAIN →
    /// BASE_PROVINCE; the rest stand alone. Acyclic by construction.
    pub const fn fallback(self) -> Option<MappingScope> {
        match self {
            MappingScope::BaseProvince => Some(MappingScope::BaseCountry),
            MappingScope::Event | MappingScope::Terrain => Some(MappingScope::BaseProvince),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            MappingScope::Leader => "LEADER",
            MappingScope::Technology => "TECHNOLOGY",
            MappingScope::UnitTerrain => "UNIT_TERRAIN",
            MappingScope::BaseCountry => "BASE_COUNTRY",
            MappingScope::BaseProvince => "BASE_PROVINCE",
            MappingScope::Event => "EVENT",
            MappingScope::Terrain => "TERRAIN",
        }
    }
}

/// One scope's mapping-key → effect table, with an optional fallback scope
/// consulted on miss.
#[derive(Debug, Clone)]
pub struct ModifierEffectMapping {
    scope: MappingScope,
    locked: bool,
    map: HashMap<String, ModifierEffectId>,
}

impl ModifierEffectMapping {
    pub fn new(scope: MappingScope) -> Self {
        Self {
            scope,
            locked: false,
            map: HashMap::new(),
        }
    }

    pub fn scope(&self) -> MappingScope {
        self.scope
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Register an effect under its mapping key. Fails (logged) if the
    /// mapping is locked or the key is already taken in this scope.
    pub fn add_effect(
        &mut self,
        id: ModifierEffectId,
        effect: &ModifierEffect,
        effects: &Registry<ModifierEffect>,
    ) -> bool {
        if self.locked {
            log::error!(
                "cannot add modifier effect \"{}\" to locked {} mapping",
                effect.identifier(),
                self.scope.name()
            );
            return false;
        }
        if let Some(&existing) = self.map.get(effect.mapping_key()) {
            let existing_name = effects
                .by_index(existing.0 as usize)
                .map(HasIdentifier::identifier)
                .unwrap_or("?");
            log::error!(
                "cannot add modifier effect \"{}\" to {} mapping - key \"{}\" is already mapped to \"{}\"",
                effect.identifier(),
                self.scope.name(),
                effect.mapping_key(),
                existing_name
            );
            return false;
        }
        self.map.insert(effect.mapping_key().to_owned(), id);
        true
    }

    pub fn lock(&mut self) {
        if self.locked {
            log::error!("{} mapping is already locked", self.scope.name());
        } else {
            self.locked = true;
        }
    }

    /// Key lookup within this scope only; `None` on miss. Logs and misses
    /// if the mapping has not been locked yet.
    pub fn lookup_local(&self, key: &str) -> Option<ModifierEffectId> {
        if !self.locked {
            log::error!(
                "cannot look up \"{}\" in {} mapping - not locked",
                key,
                self.scope.name()
            );
            return None;
        }
        self.map.get(key).copied()
    }
}

/// All seven mappings plus the fallback walk.
#[derive(Debug, Clone)]
pub struct MappingSet {
    mappings: Vec<ModifierEffectMapping>,
}

impl MappingSet {
    /// Create the seven mappings in their fixed order.
    pub fn new() -> Self {
        Self {
            mappings: MappingScope::ALL.iter().map(|&s| ModifierEffectMapping::new(s)).collect(),
        }
    }

    pub fn get(&self, scope: MappingScope) -> &ModifierEffectMapping {
        &self.mappings[scope.index()]
    }

    pub fn get_mut(&mut self, scope: MappingScope) -> &mut ModifierEffectMapping {
        &mut self.mappings[scope.index()]
    }

    pub fn lock_all(&mut self) {
        for mapping in &mut self.mappings {
            mapping.lock();
        }
    }

    /// Descend the fallback chain from `scope` until a hit or the chain
    /// ends. Idempotent once the mappings are locked.
    pub fn lookup(&self, scope: MappingScope, key: &str) -> Option<ModifierEffectId> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            if let Some(id) = self.get(scope).lookup_local(key) {
                return Some(id);
            }
            current = scope.fallback();
        }
        None
    }
}

impl Default for MappingSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::effect::{EffectFormat, ModifierTarget};

    fn effect(identifier: &str, target: ModifierTarget, key: Option<&str>) -> ModifierEffect {
        ModifierEffect::new(identifier, true, EffectFormat::ProportionDecimal, target, key)
    }

    fn setup() -> (MappingSet, Registry<ModifierEffect>) {
        let mut effects = Registry::new("modifier effects");
        let mut mappings = MappingSet::new();

        let add = |effects: &mut Registry<ModifierEffect>,
                   mappings: &mut MappingSet,
                   scope: MappingScope,
                   e: ModifierEffect| {
            let id = ModifierEffectId(effects.next_index() as u16);
            assert!(mappings.get_mut(scope).add_effect(id, &e, effects));
            assert!(effects.add(e));
            id
        };

        add(
            &mut effects,
            &mut mappings,
            MappingScope::BaseCountry,
            effect("research_points_modifier", ModifierTarget::Country, None),
        );
        add(
            &mut effects,
            &mut mappings,
            MappingScope::BaseProvince,
            effect("local_rgo_output", ModifierTarget::Province, None),
        );
        add(
            &mut effects,
            &mut mappings,
            MappingScope::Terrain,
            effect(
                "combat_width percentage_change",
                ModifierTarget::Province,
                Some("combat_width"),
            ),
        );
        (mappings, effects)
    }

    #[test]
    fn lookup_descends_fallbacks() {
        let (mut mappings, _effects) = setup();
        mappings.lock_all();

        // TERRAIN falls back through BASE_PROVINCE to BASE_COUNTRY.
        assert!(mappings
            .lookup(MappingScope::Terrain, "research_points_modifier")
            .is_some());
        assert!(mappings
            .lookup(MappingScope::Event, "local_rgo_output")
            .is_some());
        // Standalone scopes do not fall back.
        assert!(mappings
            .lookup(MappingScope::Leader, "research_points_modifier")
            .is_none());
        // Terrain-local key is invisible from country scope.
        assert!(mappings
            .lookup(MappingScope::BaseCountry, "combat_width")
            .is_none());
        assert!(mappings.lookup(MappingScope::Terrain, "combat_width").is_some());
    }

    #[test]
    fn lookup_is_idempotent_once_locked() {
        let (mut mappings, _effects) = setup();
        mappings.lock_all();
        let first = mappings.lookup(MappingScope::Terrain, "combat_width");
        let second = mappings.lookup(MappingScope::Terrain, "combat_width");
        assert_eq!(first, second);
    }

    #[test]
    fn unlocked_lookup_misses() {
        let (mappings, _effects) = setup();
        assert!(mappings.lookup(MappingScope::BaseCountry, "research_points_modifier").is_none());
    }

    #[test]
    fn duplicate_mapping_key_rejected() {
        let (mut mappings, effects) = setup();
        let duplicate = effect("another", ModifierTarget::Country, Some("research_points_modifier"));
        let id = ModifierEffectId(effects.next_index() as u16);
        assert!(!mappings
            .get_mut(MappingScope::BaseCountry)
            .add_effect(id, &duplicate, &effects));
    }
}
