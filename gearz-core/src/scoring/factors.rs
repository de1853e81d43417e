//! Per-factor scoring functions.
//!
//! ```text
//! total = (policy + binding + role) × mismatch + skill + property
//! property = market_value^0.25 × constant × Π(multipliers)
//!            × preference(category) × durability × mismatch
//! ```
//!
//! Everything here is pure; the engine supplies memoized inputs.

use crate::config::{PropertyRules, ScoringConfig};
use crate::memo::{ItemProperties, SkillPair};
use crate::types::{Agent, CandidateItem, ItemCategory, ItemDefinition};

use super::SENTINEL_REJECT;

/// Precomputed skill bonus per capped gap.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillTable {
    bonuses: Vec<f32>,
}

impl SkillTable {
    /// Build the table: 0 at gap 0, then `base × growth^(gap−1)`, capped.
    #[must_use]
    pub fn new(config: &ScoringConfig) -> Self {
        let mut bonuses = Vec::with_capacity(config.skill_gap_cap as usize + 1);
        bonuses.push(0.0);
        let mut bonus = config.skill_bonus_base;
        for _ in 1..=config.skill_gap_cap {
            bonuses.push(bonus.min(config.skill_bonus_cap));
            bonus *= config.skill_bonus_growth;
        }
        Self { bonuses }
    }

    /// Bonus for `gap`; gaps beyond the cap read the last entry.
    #[must_use]
    pub fn bonus(&self, gap: u32) -> f32 {
        let last = self.bonuses.len().saturating_sub(1);
        self.bonuses
            .get((gap as usize).min(last))
            .copied()
            .unwrap_or_default()
    }

    /// Largest gap with its own entry.
    #[must_use]
    pub fn max_gap(&self) -> u32 {
        u32::try_from(self.bonuses.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }
}

/// 0 when the policy allows the item, [`SENTINEL_REJECT`] otherwise.
///
/// Without a catalog definition only the explicit deny list can be checked.
#[must_use]
pub fn policy_score(agent: &Agent, item: &CandidateItem, definition: Option<&ItemDefinition>) -> f32 {
    let allowed = match definition {
        Some(def) => agent.policy.allows(def),
        None => !agent.policy.denied.contains(&item.definition),
    };
    if allowed { 0.0 } else { SENTINEL_REJECT }
}

/// Flat bonus when one of the agent's roles benefits from `category`.
#[must_use]
pub fn role_score(agent: &Agent, category: ItemCategory, config: &ScoringConfig) -> f32 {
    if agent.roles.benefits_from(category) { config.role_bonus } else { 0.0 }
}

/// `(skill bonus, mismatch multiplier)` for an item of `category`.
///
/// Matching the stronger skill earns the table bonus; the weaker one earns
/// the mismatch dampener. Ties and non-weapon categories are neutral.
#[must_use]
pub fn skill_factor(
    skills: SkillPair,
    category: ItemCategory,
    table: &SkillTable,
    config: &ScoringConfig,
) -> (f32, f32) {
    if category == ItemCategory::Other {
        return (0.0, 1.0);
    }
    match skills.stronger() {
        Some(stronger) if stronger == category => (table.bonus(skills.gap(table.max_gap())), 1.0),
        Some(_) => (0.0, config.mismatch_multiplier),
        None => (0.0, 1.0),
    }
}

/// Linear preference scale for `category`. Ranged and melee move in
/// opposite directions with `preference`.
#[must_use]
pub fn preference_scale(category: ItemCategory, config: &ScoringConfig) -> f32 {
    let p = config.preference.clamp(-1.0, 1.0);
    match category {
        ItemCategory::Ranged => config.ranged_base * (1.0 + config.preference_slope * p),
        ItemCategory::Melee => config.melee_base * (1.0 - config.preference_slope * p),
        ItemCategory::Other => config.other_base,
    }
}

/// Linear in durability between `floor` (broken) and 1 (pristine).
#[must_use]
pub fn durability_scale(durability: f32, floor: f32) -> f32 {
    let d = if durability.is_finite() { durability.clamp(0.0, 1.0) } else { 1.0 };
    floor + (1.0 - floor) * d
}

/// Property score before the mismatch dampener.
#[must_use]
pub fn property_score(
    props: &ItemProperties,
    durability: f32,
    rules: &PropertyRules,
    config: &ScoringConfig,
) -> f32 {
    props.market_value.max(0.0).powf(0.25)
        * config.value_constant
        * props.combined_multiplier(rules)
        * preference_scale(props.category, config)
        * durability_scale(durability, config.durability_floor)
}
