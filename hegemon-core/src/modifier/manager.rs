//! Modifier catalog, scope mappings and block parsing.

use crate::economy::good::GoodDefinition;
use crate::modifier::cache::{GoodEffects, ModifierEffectCache};
use crate::modifier::effect::{EffectFormat, ModifierEffect, ModifierEffectId, ModifierTarget};
use crate::modifier::mapping::{MappingScope, MappingSet};
use crate::modifier::value::ModifierValue;
use crate::modifier::{Condition, Modifier, ModifierId, ModifierType};
use crate::registry::{HasIdentifier, Registry};
use crate::types::tree::{TreeValue, ValueTree};
use std::collections::HashSet;

use EffectFormat::{Int, PercentageDecimal, ProportionDecimal, RawDecimal};
use MappingScope as Scope;
use ModifierTarget::{Country, Province, Unit};

/// The modifier-type → mapping-scope table.
///
/// Seeded with the fixed assignments; kept as data rather than a match so
/// the doubted rows (STATIC and TRIGGERED resolve through BASE_COUNTRY,
/// which may turn out wrong) can be corrected at setup time without
/// touching the engine.
#[derive(Debug, Clone)]
pub struct ModifierTypeMappings {
    table: [MappingScope; ModifierType::COUNT],
}

impl Default for ModifierTypeMappings {
    fn default() -> Self {
        use ModifierType::*;
        let mut table = [Scope::BaseCountry; ModifierType::COUNT];
        let assignments: [(ModifierType, MappingScope); ModifierType::COUNT] = [
            (Event, Scope::Event),
            (Static, Scope::BaseCountry),
            (Triggered, Scope::BaseCountry),
            (Crime, Scope::BaseProvince),
            (Terrain, Scope::Terrain),
            (Climate, Scope::BaseProvince),
            (Continent, Scope::BaseProvince),
            (Building, Scope::BaseProvince),
            (Leader, Scope::Leader),
            (UnitTerrain, Scope::UnitTerrain),
            (NationalValue, Scope::BaseCountry),
            (NationalFocus, Scope::BaseProvince),
            (Issue, Scope::BaseCountry),
            (Reform, Scope::BaseCountry),
            (Technology, Scope::Technology),
            (Invention, Scope::BaseCountry),
            (InventionEffect, Scope::Technology),
            (TechSchool, Scope::BaseCountry),
        ];
        for (modifier_type, scope) in assignments {
            table[modifier_type.index()] = scope;
        }
        Self { table }
    }
}

impl ModifierTypeMappings {
    pub fn scope_for(&self, modifier_type: ModifierType) -> MappingScope {
        self.table[modifier_type.index()]
    }

    pub fn set_scope_for(&mut self, modifier_type: ModifierType, scope: MappingScope) {
        self.table[modifier_type.index()] = scope;
    }
}

/// Owns the effect catalog, the named-modifier registry, the seven scope
/// mappings and the complex-modifier set.
pub struct ModifierManager {
    effects: Registry<ModifierEffect>,
    modifiers: Registry<Modifier>,
    triggers: Vec<(ModifierId, Condition)>,
    mappings: MappingSet,
    type_mappings: ModifierTypeMappings,
    complex_modifiers: HashSet<String>,
    effect_cache: ModifierEffectCache,
}

impl Default for ModifierManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModifierManager {
    pub fn new() -> Self {
        Self {
            effects: Registry::new("modifier effects"),
            modifiers: Registry::new("modifiers"),
            triggers: Vec::new(),
            mappings: MappingSet::new(),
            type_mappings: ModifierTypeMappings::default(),
            complex_modifiers: HashSet::new(),
            effect_cache: ModifierEffectCache::default(),
        }
    }

    pub fn effects(&self) -> &Registry<ModifierEffect> {
        &self.effects
    }

    pub fn modifiers(&self) -> &Registry<Modifier> {
        &self.modifiers
    }

    pub fn effect_cache(&self) -> &ModifierEffectCache {
        &self.effect_cache
    }

    pub fn mappings(&self) -> &MappingSet {
        &self.mappings
    }

    pub fn type_mappings(&self) -> &ModifierTypeMappings {
        &self.type_mappings
    }

    /// Reassign a modifier type's mapping scope. Only meaningful before the
    /// corresponding modifier files are loaded.
    pub fn set_type_mapping(&mut self, modifier_type: ModifierType, scope: MappingScope) {
        self.type_mappings.set_scope_for(modifier_type, scope);
    }

    pub fn effect_by_id(&self, id: ModifierEffectId) -> Option<&ModifierEffect> {
        self.effects.by_index(id.0 as usize)
    }

    pub fn effect_id(&self, identifier: &str) -> Option<ModifierEffectId> {
        self.effects.index_of(identifier).map(|i| ModifierEffectId(i as u16))
    }

    pub fn modifier_by_id(&self, id: ModifierId) -> Option<&Modifier> {
        self.modifiers.by_index(id.0 as usize)
    }

    pub fn modifier_id(&self, identifier: &str) -> Option<ModifierId> {
        self.modifiers.index_of(identifier).map(|i| ModifierId(i as u32))
    }

    pub fn triggered_modifiers(&self) -> &[(ModifierId, Condition)] {
        &self.triggers
    }

    /// Register one effect and enter it into the given scope mappings.
    /// Mapping-key collisions within a scope are logged by the mapping.
    pub fn add_modifier_effect(
        &mut self,
        identifier: &str,
        positive_good: bool,
        format: EffectFormat,
        target: ModifierTarget,
        mapping_key: Option<&str>,
        scopes: &[MappingScope],
    ) -> Option<ModifierEffectId> {
        if identifier.is_empty() {
            log::error!("invalid modifier effect identifier - empty");
            return None;
        }
        let effect = ModifierEffect::new(identifier, positive_good, format, target, mapping_key);
        let id = ModifierEffectId(self.effects.next_index() as u16);
        for &scope in scopes {
            self.mappings.get_mut(scope).add_effect(id, &effect, &self.effects);
        }
        self.effects.add(effect).then_some(id)
    }

    /// A complex modifier expects a nested dictionary and flattens each
    /// variant to `"<key> <subkey>"` before lookup.
    pub fn register_complex_modifier(&mut self, identifier: &str) -> bool {
        if self.complex_modifiers.insert(identifier.to_owned()) {
            true
        } else {
            log::error!("duplicate complex modifier: {}", identifier);
            false
        }
    }

    pub fn flat_identifier(key: &str, subkey: &str) -> String {
        format!("{} {}", key, subkey)
    }

    /// Register the built-in effect catalog plus per-good effects, then
    /// lock the effect registry and all seven mappings.
    pub fn setup_modifier_effects(&mut self, goods: &Registry<GoodDefinition>) -> bool {
        if self.effects.is_locked() {
            log::error!("modifier effects have already been set up");
            return false;
        }

        const COUNTRY_WIDE: &[MappingScope] = &[Scope::BaseCountry, Scope::Technology];
        const TECH_ONLY: &[MappingScope] = &[Scope::Technology];
        const PROVINCE_WIDE: &[MappingScope] = &[Scope::BaseProvince];
        const TERRAIN_ONLY: &[MappingScope] = &[Scope::Terrain];
        const UNIT_WIDE: &[MappingScope] = &[Scope::Leader, Scope::UnitTerrain];

        let mut ok = true;
        let mut cache = std::mem::take(&mut self.effect_cache);

        macro_rules! effect {
            ($slot:expr, $id:expr, $good:expr, $format:expr, $target:expr, $key:expr, $scopes:expr) => {{
                let id = self.add_modifier_effect($id, $good, $format, $target, $key, $scopes);
                ok &= id.is_some();
                $slot = id;
            }};
            ($id:expr, $good:expr, $format:expr, $target:expr, $key:expr, $scopes:expr) => {{
                ok &= self
                    .add_modifier_effect($id, $good, $format, $target, $key, $scopes)
                    .is_some();
            }};
        }

        // Technology-scope effects.
        effect!("cb_creation_speed", true, ProportionDecimal, Country, None, TECH_ONLY);
        effect!("combat_width add", false, Int, Country, Some("combat_width"), TECH_ONLY);
        effect!("plurality", true, PercentageDecimal, Country, None, TECH_ONLY);
        effect!("pop_growth", true, ProportionDecimal, Country, None, TECH_ONLY);
        effect!(
            "prestige gain_multiplier",
            true,
            ProportionDecimal,
            Country,
            Some("prestige"),
            TECH_ONLY
        );
        effect!("regular_experience_level", true, RawDecimal, Country, None, TECH_ONLY);
        effect!("reinforce_rate", true, ProportionDecimal, Country, None, TECH_ONLY);
        effect!("separatism", false, ProportionDecimal, Country, None, TECH_ONLY);
        effect!("tax_eff", true, PercentageDecimal, Country, None, TECH_ONLY);

        // Country effects, reachable from country-side scopes and techs.
        effect!(
            "administrative_efficiency_modifier",
            true,
            ProportionDecimal,
            Country,
            None,
            COUNTRY_WIDE
        );
        effect!("artisan_input", false, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!("artisan_output", true, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!("artisan_throughput", true, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!("factory_input", false, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!("factory_output", true, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!("factory_throughput", true, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!("goods_demand", false, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!(
            "global_population_growth",
            true,
            ProportionDecimal,
            Country,
            Some("population_growth"),
            COUNTRY_WIDE
        );
        effect!(
            "global_immigrant_attract",
            true,
            ProportionDecimal,
            Country,
            Some("immigrant_attract"),
            COUNTRY_WIDE
        );
        effect!(
            "global_pop_militancy_modifier",
            false,
            RawDecimal,
            Country,
            None,
            COUNTRY_WIDE
        );
        effect!(
            "global_pop_consciousness_modifier",
            false,
            RawDecimal,
            Country,
            None,
            COUNTRY_WIDE
        );
        effect!("loan_interest", false, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!(
            "prestige monthly_gain",
            true,
            RawDecimal,
            Country,
            Some("prestige"),
            &[Scope::BaseCountry]
        );
        effect!(
            cache.research_points,
            "research_points",
            true,
            RawDecimal,
            Country,
            None,
            COUNTRY_WIDE
        );
        effect!(
            cache.research_points_modifier,
            "research_points_modifier",
            true,
            ProportionDecimal,
            Country,
            None,
            COUNTRY_WIDE
        );
        effect!(cache.rgo_output, "rgo_output", true, ProportionDecimal, Country, None, COUNTRY_WIDE);
        effect!(
            cache.rgo_throughput,
            "rgo_throughput",
            true,
            ProportionDecimal,
            Country,
            None,
            COUNTRY_WIDE
        );
        effect!(
            cache.farm_rgo_size_global,
            "farm_rgo_size global",
            true,
            ProportionDecimal,
            Country,
            Some("farm_rgo_size"),
            COUNTRY_WIDE
        );
        effect!(
            cache.farm_rgo_output_global,
            "farm_rgo_output global",
            true,
            ProportionDecimal,
            Country,
            Some("farm_rgo_output"),
            COUNTRY_WIDE
        );
        effect!(
            cache.farm_rgo_throughput_global,
            "farm_rgo_throughput global",
            true,
            ProportionDecimal,
            Country,
            Some("farm_rgo_throughput"),
            COUNTRY_WIDE
        );
        effect!(
            cache.mine_rgo_size_global,
            "mine_rgo_size global",
            true,
            ProportionDecimal,
            Country,
            Some("mine_rgo_size"),
            COUNTRY_WIDE
        );
        effect!(
            cache.mine_rgo_output_global,
            "mine_rgo_output global",
            true,
            ProportionDecimal,
            Country,
            Some("mine_rgo_output"),
            COUNTRY_WIDE
        );
        effect!(
            cache.mine_rgo_throughput_global,
            "mine_rgo_throughput global",
            true,
            ProportionDecimal,
            Country,
            Some("mine_rgo_throughput"),
            COUNTRY_WIDE
        );
        effect!("war_exhaustion", false, ProportionDecimal, Country, None, COUNTRY_WIDE);

        // Province effects.
        effect!("assimilation_rate", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!(
            cache.farm_rgo_size_local,
            "farm_rgo_size local",
            true,
            ProportionDecimal,
            Province,
            Some("farm_rgo_size"),
            PROVINCE_WIDE
        );
        effect!(
            cache.farm_rgo_output_local,
            "farm_rgo_output local",
            true,
            ProportionDecimal,
            Province,
            Some("farm_rgo_output"),
            PROVINCE_WIDE
        );
        effect!(
            cache.mine_rgo_size_local,
            "mine_rgo_size local",
            true,
            ProportionDecimal,
            Province,
            Some("mine_rgo_size"),
            PROVINCE_WIDE
        );
        effect!(
            cache.mine_rgo_output_local,
            "mine_rgo_output local",
            true,
            ProportionDecimal,
            Province,
            Some("mine_rgo_output"),
            PROVINCE_WIDE
        );
        effect!("immigrant_attract", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("immigrant_push", false, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("life_rating", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("local_artisan_input", false, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("local_artisan_output", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!(
            "local_artisan_throughput",
            true,
            ProportionDecimal,
            Province,
            None,
            PROVINCE_WIDE
        );
        effect!("local_factory_input", false, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("local_factory_output", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!(
            "local_factory_throughput",
            true,
            ProportionDecimal,
            Province,
            None,
            PROVINCE_WIDE
        );
        effect!(
            cache.local_rgo_output,
            "local_rgo_output",
            true,
            ProportionDecimal,
            Province,
            None,
            PROVINCE_WIDE
        );
        effect!(
            cache.local_rgo_throughput,
            "local_rgo_throughput",
            true,
            ProportionDecimal,
            Province,
            None,
            PROVINCE_WIDE
        );
        effect!("local_repair", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("local_ship_build", false, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!("max_attrition", false, RawDecimal, Province, None, PROVINCE_WIDE);
        effect!("pop_consciousness_modifier", false, RawDecimal, Province, None, PROVINCE_WIDE);
        effect!("pop_militancy_modifier", false, RawDecimal, Province, None, PROVINCE_WIDE);
        effect!("population_growth", true, ProportionDecimal, Province, None, PROVINCE_WIDE);
        effect!(
            cache.supply_limit,
            "supply_limit",
            true,
            RawDecimal,
            Province,
            None,
            PROVINCE_WIDE
        );
        effect!(
            "movement_cost percentage_change",
            false,
            ProportionDecimal,
            Province,
            Some("movement_cost"),
            PROVINCE_WIDE
        );

        // Terrain-scope variants sharing mapping keys with the effects above.
        effect!(
            "movement_cost base",
            true,
            ProportionDecimal,
            Province,
            Some("movement_cost"),
            TERRAIN_ONLY
        );
        effect!(
            "combat_width percentage_change",
            false,
            ProportionDecimal,
            Province,
            Some("combat_width"),
            TERRAIN_ONLY
        );
        effect!("defence terrain", true, Int, Province, Some("defence"), TERRAIN_ONLY);

        // Unit effects.
        effect!("attack", true, Int, Unit, None, UNIT_WIDE);
        effect!("attrition", false, RawDecimal, Unit, None, UNIT_WIDE);
        effect!("defence leader", true, Int, Unit, Some("defence"), &[Scope::Leader]);
        effect!("experience", true, ProportionDecimal, Unit, None, UNIT_WIDE);
        effect!("morale", true, ProportionDecimal, Unit, None, UNIT_WIDE);
        effect!("organisation", true, ProportionDecimal, Unit, None, UNIT_WIDE);
        effect!("reconnaissance", true, ProportionDecimal, Unit, None, UNIT_WIDE);
        effect!("reliability", true, RawDecimal, Unit, None, UNIT_WIDE);
        effect!("speed", true, ProportionDecimal, Unit, None, UNIT_WIDE);

        // Per-good RGO effects, reached by flattening the rgo_* complex
        // modifiers to "<key> <good>".
        ok &= self.register_complex_modifier("rgo_size");
        ok &= self.register_complex_modifier("rgo_output");
        ok &= self.register_complex_modifier("rgo_throughput");
        let mut good_effects = Vec::with_capacity(goods.len());
        for good in goods.items() {
            let mut handles = GoodEffects::default();
            effect!(
                handles.rgo_size,
                &Self::flat_identifier("rgo_size", good.identifier()),
                true,
                ProportionDecimal,
                Province,
                None,
                PROVINCE_WIDE
            );
            effect!(
                handles.rgo_output,
                &Self::flat_identifier("rgo_output", good.identifier()),
                true,
                ProportionDecimal,
                Province,
                None,
                PROVINCE_WIDE
            );
            effect!(
                handles.rgo_throughput,
                &Self::flat_identifier("rgo_throughput", good.identifier()),
                true,
                ProportionDecimal,
                Province,
                None,
                PROVINCE_WIDE
            );
            good_effects.push(handles);
        }
        cache.set_good_effects(good_effects);
        self.effect_cache = cache;

        self.effects.lock();
        self.mappings.lock_all();
        ok
    }

    /// Parse a modifier block: a mapping key → value table.
    ///
    /// Scalar values resolve through the mapping chain for the modifier
    /// type's scope; dictionary values under a registered complex modifier
    /// flatten to `"<key> <subkey>"` first. Unknown keys fall through to
    /// `default`; duplicate resolved effects within one block are errors.
    /// Returns the parsed value and whether every entry succeeded.
    pub fn expect_modifier_value_and_default(
        &self,
        block: &ValueTree,
        modifier_type: ModifierType,
        default: &mut dyn FnMut(&str, &TreeValue) -> bool,
    ) -> (ModifierValue, bool) {
        let scope = self.type_mappings.scope_for(modifier_type);
        let mut value = ModifierValue::new();
        let mut ok = true;

        let mut add_effect =
            |value: &mut ModifierValue, effect: ModifierEffectId, raw: &TreeValue, key: &str| -> bool {
                if value.has_effect(effect) {
                    log::error!("duplicate modifier effect: {}", key);
                    return false;
                }
                match raw.as_fixed() {
                    Some(parsed) => {
                        value.set(effect, parsed);
                        true
                    }
                    None => {
                        log::error!("invalid fixed-point value for modifier effect {}", key);
                        false
                    }
                }
            };

        for (key, entry) in block.entries() {
            match entry {
                TreeValue::Scalar(_) => {
                    if let Some(effect) = self.mappings.lookup(scope, key) {
                        ok &= add_effect(&mut value, effect, entry, key);
                    } else {
                        ok &= default(key, entry);
                    }
                }
                TreeValue::Tree(subtree) if self.complex_modifiers.contains(key) => {
                    if key == "rebel_org_gain" {
                        // This one nests its variant under explicit
                        // faction/value keys instead of a plain dictionary.
                        let faction = subtree.get("faction").and_then(TreeValue::as_scalar);
                        let raw = subtree.get("value");
                        match (faction, raw) {
                            (Some(faction), Some(raw)) => {
                                let flat = Self::flat_identifier(key, faction);
                                if let Some(effect) = self.mappings.lookup(scope, &flat) {
                                    ok &= add_effect(&mut value, effect, raw, &flat);
                                } else {
                                    log::error!("could not find flattened modifier: {}", flat);
                                    ok = false;
                                }
                            }
                            _ => {
                                log::error!("rebel_org_gain requires faction and value keys");
                                ok = false;
                            }
                        }
                        continue;
                    }
                    for (subkey, raw) in subtree.entries() {
                        let flat = Self::flat_identifier(key, subkey);
                        if let Some(effect) = self.mappings.lookup(scope, &flat) {
                            ok &= add_effect(&mut value, effect, raw, &flat);
                        } else {
                            log::error!("could not find flattened modifier: {}", flat);
                            ok = false;
                        }
                    }
                }
                _ => {
                    ok &= default(key, entry);
                }
            }
        }

        value.trim();
        (value, ok)
    }

    /// [`expect_modifier_value_and_default`](Self::expect_modifier_value_and_default)
    /// with unknown keys treated as errors.
    pub fn expect_modifier_value(
        &self,
        block: &ValueTree,
        modifier_type: ModifierType,
    ) -> (ModifierValue, bool) {
        self.expect_modifier_value_and_default(block, modifier_type, &mut |key, _| {
            log::error!("unknown modifier effect key: {}", key);
            false
        })
    }

    pub fn add_modifier(
        &mut self,
        identifier: &str,
        value: ModifierValue,
        modifier_type: ModifierType,
        icon: u16,
    ) -> bool {
        if identifier.is_empty() {
            log::error!("invalid modifier identifier - empty");
            return false;
        }
        self.modifiers.add(Modifier::new(identifier, value, modifier_type, icon))
    }

    pub fn add_event_modifier(&mut self, identifier: &str, value: ModifierValue, icon: u16) -> bool {
        self.add_modifier(identifier, value, ModifierType::Event, icon)
    }

    pub fn add_static_modifier(&mut self, identifier: &str, value: ModifierValue) -> bool {
        self.add_modifier(identifier, value, ModifierType::Static, 0)
    }

    /// Triggered modifiers carry an opaque condition; the interpreter lives
    /// with the collaborator.
    pub fn add_triggered_modifier(
        &mut self,
        identifier: &str,
        value: ModifierValue,
        icon: u16,
        trigger: Condition,
    ) -> bool {
        if !self.add_modifier(identifier, value, ModifierType::Triggered, icon) {
            return false;
        }
        let id = ModifierId(self.modifiers.len() as u32 - 1);
        self.triggers.push((id, trigger));
        true
    }

    /// Load a tree of `identifier = { <effects…> icon = n }` event
    /// modifiers. Parse failures skip the entry but keep loading siblings.
    pub fn load_event_modifiers(&mut self, root: &ValueTree) -> bool {
        let mut ok = true;
        for (identifier, entry) in root.entries() {
            let Some(block) = entry.as_tree() else {
                log::error!("event modifier \"{}\" is not a block", identifier);
                ok = false;
                continue;
            };
            let mut icon: u16 = 0;
            let (value, parsed_ok) = self.expect_modifier_value_and_default(
                block,
                ModifierType::Event,
                &mut |key, raw| {
                    if key == "icon" {
                        if let Some(parsed) = raw.as_u32() {
                            icon = parsed as u16;
                            return true;
                        }
                    }
                    log::error!("unknown key in event modifier: {}", key);
                    false
                },
            );
            ok &= parsed_ok;
            ok &= self.add_event_modifier(identifier, value, icon);
        }
        ok
    }

    /// Load a tree of `identifier = { <effects…> }` static modifiers.
    pub fn load_static_modifiers(&mut self, root: &ValueTree) -> bool {
        let mut ok = true;
        for (identifier, entry) in root.entries() {
            let Some(block) = entry.as_tree() else {
                log::error!("static modifier \"{}\" is not a block", identifier);
                ok = false;
                continue;
            };
            let (value, parsed_ok) = self.expect_modifier_value(block, ModifierType::Static);
            ok &= parsed_ok;
            ok &= self.add_static_modifier(identifier, value);
        }
        ok
    }

    pub fn lock_modifiers(&mut self) {
        self.modifiers.lock();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::economy::good::tests::grain_and_iron;
    use crate::fixed::Fixed;

    pub(crate) fn setup_manager() -> ModifierManager {
        let goods = grain_and_iron();
        let mut manager = ModifierManager::new();
        assert!(manager.setup_modifier_effects(&goods));
        manager
    }

    #[test]
    fn catalog_sets_up_once() {
        let goods = grain_and_iron();
        let mut manager = ModifierManager::new();
        assert!(manager.setup_modifier_effects(&goods));
        assert!(!manager.setup_modifier_effects(&goods));
        assert!(manager.effects().is_locked());
    }

    #[test]
    fn shared_mapping_key_resolves_per_scope() {
        let manager = setup_manager();
        let country_side = manager
            .mappings()
            .lookup(Scope::Technology, "combat_width")
            .unwrap();
        let terrain_side = manager.mappings().lookup(Scope::Terrain, "combat_width").unwrap();
        assert_ne!(country_side, terrain_side);
        assert_eq!(
            manager.effect_by_id(country_side).unwrap().identifier(),
            "combat_width add"
        );
        assert_eq!(
            manager.effect_by_id(terrain_side).unwrap().identifier(),
            "combat_width percentage_change"
        );
    }

    #[test]
    fn parse_scalar_block() {
        let manager = setup_manager();
        let mut block = ValueTree::new();
        block.push_scalar("research_points_modifier", "0.25");
        block.push_scalar("local_rgo_output", "0.5");
        // STATIC resolves through BASE_COUNTRY, which does not see
        // province-mapping keys, so local_rgo_output must fall to default.
        let mut unknown = Vec::new();
        let (value, ok) = manager.expect_modifier_value_and_default(
            &block,
            ModifierType::Static,
            &mut |key, _| {
                unknown.push(key.to_owned());
                true
            },
        );
        assert!(ok);
        assert_eq!(unknown, vec!["local_rgo_output".to_owned()]);
        let effect = manager.effect_id("research_points_modifier").unwrap();
        assert_eq!(value.effect(effect), Fixed::ONE / Fixed::from_int(4));

        // EVENT falls back through BASE_PROVINCE, so the same key resolves.
        let (value, ok) = manager.expect_modifier_value(&block, ModifierType::Event);
        assert!(ok);
        let local = manager.effect_id("local_rgo_output").unwrap();
        assert_eq!(value.effect(local), Fixed::HALF);
    }

    #[test]
    fn duplicate_key_in_block_is_error() {
        let manager = setup_manager();
        let mut block = ValueTree::new();
        block.push_scalar("research_points_modifier", "0.25");
        block.push_scalar("research_points_modifier", "0.5");
        let (value, ok) = manager.expect_modifier_value(&block, ModifierType::Static);
        assert!(!ok);
        let effect = manager.effect_id("research_points_modifier").unwrap();
        // First occurrence wins; the duplicate is rejected.
        assert_eq!(value.effect(effect), Fixed::ONE / Fixed::from_int(4));
    }

    #[test]
    fn complex_modifier_flattens_by_good() {
        let manager = setup_manager();
        let mut by_good = ValueTree::new();
        by_good.push_scalar("grain", "0.2");
        let mut block = ValueTree::new();
        block.push("rgo_output", TreeValue::Tree(by_good));
        let (value, ok) = manager.expect_modifier_value(&block, ModifierType::Event);
        assert!(ok);
        let flat = manager.effect_id("rgo_output grain").unwrap();
        assert_eq!(value.effect(flat), Fixed::ONE / Fixed::from_int(5));
    }

    #[test]
    fn unknown_flattened_variant_is_error() {
        let manager = setup_manager();
        let mut by_good = ValueTree::new();
        by_good.push_scalar("unobtainium", "0.2");
        let mut block = ValueTree::new();
        block.push("rgo_output", TreeValue::Tree(by_good));
        let (_, ok) = manager.expect_modifier_value(&block, ModifierType::Event);
        assert!(!ok);
    }

    #[test]
    fn load_event_modifiers_with_icon() {
        let mut manager = setup_manager();
        let mut block = ValueTree::new();
        block.push_scalar("research_points_modifier", "0.1");
        block.push_scalar("icon", "4");
        let mut root = ValueTree::new();
        root.push("patent_office", TreeValue::Tree(block));
        assert!(manager.load_event_modifiers(&root));
        let id = manager.modifier_id("patent_office").unwrap();
        let modifier = manager.modifier_by_id(id).unwrap();
        assert_eq!(modifier.icon(), 4);
        assert_eq!(modifier.modifier_type(), ModifierType::Event);
    }

    #[test]
    fn triggered_modifier_keeps_condition() {
        let mut manager = setup_manager();
        let mut value = ModifierValue::new();
        value.set(manager.effect_id("war_exhaustion").unwrap(), Fixed::ONE);
        assert!(manager.add_triggered_modifier(
            "blockaded",
            value,
            2,
            Condition::new(|scopes| scopes.province.is_some()),
        ));
        let (id, condition) = &manager.triggered_modifiers()[0];
        assert_eq!(
            manager.modifier_by_id(*id).unwrap().modifier_type(),
            ModifierType::Triggered
        );
        assert!(!condition.evaluate(&crate::modifier::ScopeContext::default()));
    }
}
