//! Agent-independent item property memo.
//!
//! Everything here depends only on (definition, quality tier, material), so
//! one computation serves every agent that ever looks at an item of that
//! kind. The cache is an approximate LRU: hits only stamp `last_access`, and
//! when an insert pushes the map over capacity the coldest quarter is
//! removed in a single sort-and-drop pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::ItemCatalog;
use crate::config::{step_lookup, PropertyRules};
use crate::error::{GearzError, Result};
use crate::memo::{keys_by_recency, MemoEntry};
use crate::types::{CandidateItem, ItemCategory, ItemDefinition, MaterialVariant, QualityTier, Tick};

// ---------------------------------------------------------------------------
// Cache key
// ---------------------------------------------------------------------------

/// Identity of everything the agent-independent properties depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompositeCacheKey {
    /// Mixed hash of the definition id.
    pub definition_hash: u64,
    /// Quality tier.
    pub quality: QualityTier,
    /// Mixed hash of the material id, 0 without a material.
    pub material_hash: u64,
}

impl CompositeCacheKey {
    /// Build the key for an item instance.
    #[must_use]
    pub fn for_item(item: &CandidateItem) -> Self {
        Self {
            definition_hash: mix64(u64::from(item.definition.0)),
            quality: item.quality,
            material_hash: item.material.map_or(0, |m| mix64(u64::from(m.0) | (1 << 32))),
        }
    }
}

/// SplitMix64 finalizer. Deterministic across runs and platforms.
fn mix64(value: u64) -> u64 {
    let mut h = value.wrapping_add(0x9e37_79b9_7f4a_7c15);
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

// ---------------------------------------------------------------------------
// Derived properties
// ---------------------------------------------------------------------------

/// Agent-independent modifiers derived from an item's static data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    /// Broad category.
    pub category: ItemCategory,
    /// Range bucket multiplier.
    pub range_multiplier: f32,
    /// Warmup bucket multiplier.
    pub warmup_multiplier: f32,
    /// Diminishing, capped bonus for multi-shot bursts.
    pub burst_bonus: f32,
    /// Armor penetration bucket multiplier.
    pub armor_penetration_multiplier: f32,
    /// Explosive, status-effect or non-lethal.
    pub situational: bool,
    /// Multiplier below 1 when effective damage is low.
    pub low_damage_penalty: f32,
    /// Sidearm-sized item.
    pub compact: bool,
    /// Market value after quality and material factors.
    pub market_value: f32,
}

impl ItemProperties {
    /// Whether the item is a melee weapon.
    #[must_use]
    pub fn is_melee(&self) -> bool {
        self.category == ItemCategory::Melee
    }

    /// Whether the item is a ranged weapon.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.category == ItemCategory::Ranged
    }

    /// Conservative stand-in when item data is missing: neutral multipliers,
    /// not situational, fallback market value.
    #[must_use]
    pub fn fallback(category: ItemCategory, rules: &PropertyRules) -> Self {
        Self {
            category,
            range_multiplier: 1.0,
            warmup_multiplier: 1.0,
            burst_bonus: 0.0,
            armor_penetration_multiplier: 1.0,
            situational: false,
            low_damage_penalty: 1.0,
            compact: false,
            market_value: rules.fallback_market_value,
        }
    }

    /// Product of every multiplier, including the flag-driven ones.
    #[must_use]
    pub fn combined_multiplier(&self, rules: &PropertyRules) -> f32 {
        let situational = if self.situational { rules.situational_multiplier } else { 1.0 };
        let compact = if self.compact { rules.compact_multiplier } else { 1.0 };
        self.range_multiplier
            * self.warmup_multiplier
            * (1.0 + self.burst_bonus)
            * self.armor_penetration_multiplier
            * self.low_damage_penalty
            * situational
            * compact
    }
}

/// Derive properties from static data. Pure: same inputs, same output.
///
/// # Errors
/// Returns [`GearzError::InvalidItemData`] if the scaled stats are not
/// finite or negative.
pub fn compute_properties(
    definition: &ItemDefinition,
    quality: QualityTier,
    material: Option<&MaterialVariant>,
    rules: &PropertyRules,
) -> Result<ItemProperties> {
    let (damage_factor, ap_factor, value_factor) = material.map_or((1.0, 1.0, 1.0), |m| {
        (m.damage_factor, m.armor_penetration_factor, m.market_value_factor)
    });
    let damage = definition.damage * quality.damage_factor() * damage_factor;
    let armor_penetration = definition.armor_penetration * ap_factor;
    let market_value = definition.market_value * quality.value_factor() * value_factor;

    for (name, value) in [
        ("damage", damage),
        ("armor_penetration", armor_penetration),
        ("market_value", market_value),
        ("range", definition.range),
        ("warmup", definition.warmup),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(GearzError::InvalidItemData {
                definition: definition.id,
                reason: format!("{name} = {value}"),
            });
        }
    }

    let mut props = ItemProperties::fallback(definition.category, rules);
    props.market_value = market_value;
    props.situational = definition.traits.is_situational();
    props.compact = definition.traits.compact;

    match definition.category {
        ItemCategory::Ranged => {
            props.range_multiplier = step_lookup(&rules.range_buckets, definition.range);
            props.warmup_multiplier = step_lookup(&rules.warmup_buckets, definition.warmup);
            props.burst_bonus = burst_bonus(definition.burst, rules);
        }
        ItemCategory::Melee => {}
        ItemCategory::Other => return Ok(props),
    }
    props.armor_penetration_multiplier =
        step_lookup(&rules.armor_penetration_buckets, armor_penetration);
    if damage < rules.low_damage_threshold {
        props.low_damage_penalty = rules.low_damage_penalty;
    }
    Ok(props)
}

/// `per_shot × ln(burst)`, capped. Zero for single shots.
fn burst_bonus(burst: u32, rules: &PropertyRules) -> f32 {
    if burst <= 1 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let shots = burst as f32;
    (rules.burst_bonus_per_shot * shots.ln()).min(rules.burst_bonus_cap)
}

// ---------------------------------------------------------------------------
// Memo
// ---------------------------------------------------------------------------

/// Running hit / miss / eviction counts for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to compute.
    pub misses: u64,
    /// Entries removed by capacity pressure or the size safety valve.
    pub evictions: u64,
    /// Lookups that fell back to default data.
    pub fallbacks: u64,
}

/// Capacity-bounded memo of [`ItemProperties`].
#[derive(Debug)]
pub struct PropertyMemo {
    entries: HashMap<CompositeCacheKey, MemoEntry<ItemProperties>>,
    capacity: usize,
    stats: CacheStats,
}

impl PropertyMemo {
    /// Create an empty memo holding at most `capacity` keys.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity + 1),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Properties for `item`, computing and caching them on a miss.
    ///
    /// Missing or unusable catalog data never fails the call: it yields
    /// [`ItemProperties::fallback`], which is not cached.
    pub fn get(
        &mut self,
        item: &CandidateItem,
        catalog: &ItemCatalog,
        rules: &PropertyRules,
        now: Tick,
    ) -> ItemProperties {
        let key = CompositeCacheKey::for_item(item);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.touch(now);
            self.stats.hits += 1;
            return entry.value;
        }

        match Self::compute(item, catalog, rules) {
            Ok(props) => {
                self.stats.misses += 1;
                self.entries.insert(key, MemoEntry::new(props, now));
                if self.entries.len() > self.capacity {
                    self.evict_oldest(Some(key));
                }
                props
            }
            Err(e) => {
                self.stats.fallbacks += 1;
                warn!(item = %item.id, definition = %item.definition, error = %e, "Item data unusable; scoring with fallback properties");
                let category = catalog
                    .definition(item.definition)
                    .map_or(ItemCategory::Other, |d| d.category);
                ItemProperties::fallback(category, rules)
            }
        }
    }

    fn compute(
        item: &CandidateItem,
        catalog: &ItemCatalog,
        rules: &PropertyRules,
    ) -> Result<ItemProperties> {
        let definition = catalog.definition(item.definition)?;
        let material = item.material.map(|id| catalog.material(id)).transpose()?;
        compute_properties(definition, item.quality, material, rules)
    }

    /// Remove the coldest quarter of capacity in one pass.
    ///
    /// `protect` is never removed, so the entry that triggered eviction
    /// survives even when many entries share its access tick.
    pub fn evict_oldest(&mut self, protect: Option<CompositeCacheKey>) -> usize {
        let target = (self.capacity / 4).max(1);
        let victims: Vec<CompositeCacheKey> = keys_by_recency(&self.entries)
            .into_iter()
            .filter(|key| Some(*key) != protect)
            .take(target)
            .collect();
        for key in &victims {
            self.entries.remove(key);
        }
        self.stats.evictions += victims.len() as u64;
        debug!(evicted = victims.len(), remaining = self.entries.len(), "Property memo eviction pass");
        victims.len()
    }

    /// Drop every entry.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Cached value for `key` without touching recency.
    #[must_use]
    pub fn peek(&self, key: &CompositeCacheKey) -> Option<&ItemProperties> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Number of cached keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the memo is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hit / miss / eviction counts since creation.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DefinitionId, ItemId, ItemTraits, MaterialId};

    fn rifle(id: u32, range: f32) -> ItemDefinition {
        let mut def = ItemDefinition::new(DefinitionId(id), format!("rifle-{id}"), ItemCategory::Ranged);
        def.range = range;
        def.warmup = 1.5;
        def.damage = 12.0;
        def.market_value = 400.0;
        def
    }

    fn catalog_of(n: u32) -> ItemCatalog {
        let mut catalog = ItemCatalog::new();
        for i in 0..n {
            catalog.insert_definition(rifle(i, 10.0 + i as f32));
        }
        catalog.insert_material(MaterialVariant {
            id: MaterialId(1),
            damage_factor: 1.2,
            armor_penetration_factor: 1.5,
            market_value_factor: 2.0,
        });
        catalog
    }

    fn item(def: u32) -> CandidateItem {
        CandidateItem::new(ItemId(u64::from(def)), DefinitionId(def))
    }

    #[test]
    fn key_distinguishes_quality_and_material() {
        let base = item(1);
        let mut better = base.clone();
        better.quality = QualityTier::Excellent;
        let mut steel = base.clone();
        steel.material = Some(MaterialId(1));

        let keys = [
            CompositeCacheKey::for_item(&base),
            CompositeCacheKey::for_item(&better),
            CompositeCacheKey::for_item(&steel),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_eq!(keys[0], CompositeCacheKey::for_item(&item(1)));
    }

    #[test]
    fn hit_returns_same_value_as_miss() {
        let catalog = catalog_of(4);
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(16);

        let first = memo.get(&item(2), &catalog, &rules, 10);
        let second = memo.get(&item(2), &catalog, &rules, 20);
        assert_eq!(first, second);
        assert_eq!(memo.stats().hits, 1);
        assert_eq!(memo.stats().misses, 1);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let catalog = catalog_of(40);
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(16);
        for (tick, def) in (0..40).enumerate() {
            memo.get(&item(def), &catalog, &rules, tick as u64);
            assert!(memo.len() <= memo.capacity());
        }
        assert!(memo.stats().evictions > 0);
    }

    #[test]
    fn eviction_removes_coldest_in_one_batch() {
        let catalog = catalog_of(5);
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(4);
        for def in 0..4 {
            memo.get(&item(def), &catalog, &rules, 100 + u64::from(def));
        }
        // Refresh def 0 so def 1 becomes the coldest.
        memo.get(&item(0), &catalog, &rules, 200);
        memo.get(&item(4), &catalog, &rules, 300);

        assert_eq!(memo.len(), 4);
        assert!(memo.peek(&CompositeCacheKey::for_item(&item(0))).is_some());
        assert!(memo.peek(&CompositeCacheKey::for_item(&item(1))).is_none());
        assert!(memo.peek(&CompositeCacheKey::for_item(&item(4))).is_some());
    }

    #[test]
    fn newest_entry_survives_tie() {
        let catalog = catalog_of(3);
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(2);
        for def in 0..3 {
            memo.get(&item(def), &catalog, &rules, 7);
        }
        assert!(memo.peek(&CompositeCacheKey::for_item(&item(2))).is_some());
    }

    #[test]
    fn unknown_definition_falls_back_uncached() {
        let catalog = ItemCatalog::new();
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(4);
        let props = memo.get(&item(99), &catalog, &rules, 0);
        assert!((props.market_value - rules.fallback_market_value).abs() < f32::EPSILON);
        assert!(!props.situational);
        assert!(memo.is_empty());
        assert_eq!(memo.stats().fallbacks, 1);
    }

    #[test]
    fn unknown_material_falls_back() {
        let catalog = catalog_of(1);
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(4);
        let mut odd = item(0);
        odd.material = Some(MaterialId(77));
        let props = memo.get(&odd, &catalog, &rules, 0);
        assert_eq!(props.category, ItemCategory::Ranged);
        assert!((props.market_value - rules.fallback_market_value).abs() < f32::EPSILON);
    }

    #[test]
    fn negative_value_is_invalid_data() {
        let mut def = rifle(1, 20.0);
        def.market_value = -5.0;
        let result = compute_properties(&def, QualityTier::Normal, None, &PropertyRules::default());
        assert!(matches!(result, Err(GearzError::InvalidItemData { .. })));
    }

    #[test]
    fn material_scales_value_and_penetration() {
        let catalog = catalog_of(1);
        let rules = PropertyRules::default();
        let mut memo = PropertyMemo::new(4);
        let plain = memo.get(&item(0), &catalog, &rules, 0);
        let mut steel = item(0);
        steel.material = Some(MaterialId(1));
        let upgraded = memo.get(&steel, &catalog, &rules, 0);
        assert!(upgraded.market_value > plain.market_value);
        assert!(upgraded.armor_penetration_multiplier >= plain.armor_penetration_multiplier);
    }

    #[test]
    fn situational_and_compact_flags() {
        let mut def = rifle(3, 30.0);
        def.traits = ItemTraits { explosive: true, compact: true, ..ItemTraits::default() };
        let rules = PropertyRules::default();
        let props = compute_properties(&def, QualityTier::Normal, None, &rules).expect("valid");
        assert!(props.situational);
        assert!(props.compact);
        let plain = compute_properties(&rifle(3, 30.0), QualityTier::Normal, None, &rules).expect("valid");
        assert!(props.combined_multiplier(&rules) < plain.combined_multiplier(&rules));
    }

    #[test]
    fn buckets_are_monotonic_in_stats() {
        let rules = PropertyRules::default();
        let mut last_range = 0.0;
        let mut last_warmup = f32::MAX;
        for step in 0..60 {
            let mut def = rifle(1, step as f32);
            def.warmup = step as f32 * 0.1;
            let props = compute_properties(&def, QualityTier::Normal, None, &rules).expect("valid");
            assert!(props.range_multiplier >= last_range);
            assert!(props.warmup_multiplier <= last_warmup);
            last_range = props.range_multiplier;
            last_warmup = props.warmup_multiplier;
        }
    }

    #[test]
    fn burst_bonus_diminishes_and_caps() {
        let rules = PropertyRules::default();
        let b2 = burst_bonus(2, &rules);
        let b3 = burst_bonus(3, &rules);
        let b100 = burst_bonus(100, &rules);
        assert!((burst_bonus(1, &rules)).abs() < f32::EPSILON);
        assert!(b3 > b2);
        assert!(b3 - b2 < b2);
        assert!((b100 - rules.burst_bonus_cap).abs() < f32::EPSILON);
    }

    #[test]
    fn low_damage_melee_is_penalised() {
        let rules = PropertyRules::default();
        let mut knife = ItemDefinition::new(DefinitionId(5), "knife", ItemCategory::Melee);
        knife.damage = 4.0;
        let props = compute_properties(&knife, QualityTier::Normal, None, &rules).expect("valid");
        assert!((props.low_damage_penalty - rules.low_damage_penalty).abs() < f32::EPSILON);
        assert!((props.range_multiplier - 1.0).abs() < f32::EPSILON);
    }
}
