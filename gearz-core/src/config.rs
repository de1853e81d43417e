//! Configuration for the GEARZ scoring engine.
//!
//! Maps directly to `gearz.toml`. Every literal the scoring pipeline uses is
//! tunable here; what must hold regardless of tuning is the ordering of the
//! step tables, which [`GearzConfig::validate`] enforces.

use serde::{Deserialize, Serialize};

use crate::error::{GearzError, Result};
use crate::types::SkillKind;

/// Top-level GEARZ configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GearzConfig {
    /// Property memo sizing.
    #[serde(default)]
    pub property_memo: PropertyMemoConfig,
    /// Skill memo TTLs and sizing.
    #[serde(default)]
    pub skill_memo: SkillMemoConfig,
    /// Agent-independent item rule tables.
    #[serde(default)]
    pub rules: PropertyRules,
    /// Score composition weights.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl GearzConfig {
    /// Load configuration from a TOML string and validate it.
    ///
    /// # Errors
    /// Returns `GearzError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| GearzError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to a TOML string.
    ///
    /// # Errors
    /// Returns `GearzError::Serialization` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GearzError::Serialization(e.to_string()))
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    /// Returns `GearzError::Config` naming the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.property_memo.capacity == 0 {
            return Err(GearzError::Config("property_memo.capacity must be > 0".into()));
        }
        let sm = &self.skill_memo;
        if sm.value_ttl_ticks == 0 || sm.index_ttl_ticks == 0 {
            return Err(GearzError::Config("skill_memo TTLs must be > 0".into()));
        }
        if sm.retain_after_cleanup >= sm.cleanup_threshold {
            return Err(GearzError::Config(
                "skill_memo.retain_after_cleanup must be below cleanup_threshold".into(),
            ));
        }
        if sm.ranged_skill == sm.melee_skill {
            return Err(GearzError::Config(
                "skill_memo ranged and melee skills must differ".into(),
            ));
        }

        let rules = &self.rules;
        check_steps("rules.range_buckets", &rules.range_buckets, Slope::NonDecreasing)?;
        check_steps("rules.warmup_buckets", &rules.warmup_buckets, Slope::NonIncreasing)?;
        check_steps(
            "rules.armor_penetration_buckets",
            &rules.armor_penetration_buckets,
            Slope::NonDecreasing,
        )?;
        for (name, value) in [
            ("rules.low_damage_penalty", rules.low_damage_penalty),
            ("rules.situational_multiplier", rules.situational_multiplier),
            ("rules.compact_multiplier", rules.compact_multiplier),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(GearzError::Config(format!("{name} must be in (0, 1]")));
            }
        }
        if rules.burst_bonus_per_shot < 0.0 || rules.burst_bonus_cap < 0.0 {
            return Err(GearzError::Config("burst bonus terms must be >= 0".into()));
        }

        let sc = &self.scoring;
        // The multiplier also scales a held item's reject sentinel, which
        // must stay below the half-sentinel threshold.
        if !(sc.mismatch_multiplier > 0.5 && sc.mismatch_multiplier < 1.0) {
            return Err(GearzError::Config(
                "scoring.mismatch_multiplier must be in (0.5, 1)".into(),
            ));
        }
        if sc.skill_bonus_growth < 1.0 {
            return Err(GearzError::Config(
                "scoring.skill_bonus_growth must be >= 1 to keep the curve monotonic".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&sc.preference) {
            return Err(GearzError::Config("scoring.preference must be in [-1, 1]".into()));
        }
        if !(0.0..=1.0).contains(&sc.durability_floor) {
            return Err(GearzError::Config("scoring.durability_floor must be in [0, 1]".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Step tables
// ---------------------------------------------------------------------------

/// One step of a bucket table: values at or above `min` get `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepBucket {
    /// Lower bound (inclusive) of the underlying stat.
    pub min: f32,
    /// Multiplier for stats in this bucket.
    pub multiplier: f32,
}

impl StepBucket {
    const fn new(min: f32, multiplier: f32) -> Self {
        Self { min, multiplier }
    }
}

/// Look up `value` in an ascending step table.
///
/// Values below the first bound take the first bucket's multiplier; an empty
/// table is neutral.
#[must_use]
pub fn step_lookup(buckets: &[StepBucket], value: f32) -> f32 {
    let Some(first) = buckets.first() else {
        return 1.0;
    };
    buckets
        .iter()
        .take_while(|b| b.min <= value)
        .last()
        .unwrap_or(first)
        .multiplier
}

#[derive(Clone, Copy)]
enum Slope {
    NonDecreasing,
    NonIncreasing,
}

fn check_steps(name: &str, buckets: &[StepBucket], slope: Slope) -> Result<()> {
    if buckets.iter().any(|b| !b.min.is_finite() || !(b.multiplier.is_finite() && b.multiplier > 0.0)) {
        return Err(GearzError::Config(format!("{name}: bounds and multipliers must be finite, multipliers > 0")));
    }
    for pair in buckets.windows(2) {
        if pair[1].min <= pair[0].min {
            return Err(GearzError::Config(format!("{name}: bounds must be strictly ascending")));
        }
        let ordered = match slope {
            Slope::NonDecreasing => pair[1].multiplier >= pair[0].multiplier,
            Slope::NonIncreasing => pair[1].multiplier <= pair[0].multiplier,
        };
        if !ordered {
            return Err(GearzError::Config(format!("{name}: multipliers break monotonic order")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Property memo sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyMemoConfig {
    /// Maximum number of cached keys.
    #[serde(default = "default_1000")]
    pub capacity: usize,
}

impl Default for PropertyMemoConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Skill memo TTLs and sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMemoConfig {
    /// Value tier lifetime in ticks.
    #[serde(default = "default_1000_u64")]
    pub value_ttl_ticks: u64,
    /// Index tier lifetime in ticks (skill order changes rarely).
    #[serde(default = "default_4000_u64")]
    pub index_ttl_ticks: u64,
    /// Tier size that triggers the safety cleanup.
    #[serde(default = "default_150")]
    pub cleanup_threshold: usize,
    /// Entries kept by the safety cleanup (most recent first).
    #[serde(default = "default_100")]
    pub retain_after_cleanup: usize,
    /// Skill whose level counts toward ranged items.
    #[serde(default = "default_ranged_skill")]
    pub ranged_skill: SkillKind,
    /// Skill whose level counts toward melee items.
    #[serde(default = "default_melee_skill")]
    pub melee_skill: SkillKind,
}

impl Default for SkillMemoConfig {
    fn default() -> Self {
        Self {
            value_ttl_ticks: 1000,
            index_ttl_ticks: 4000,
            cleanup_threshold: 150,
            retain_after_cleanup: 100,
            ranged_skill: SkillKind::Shooting,
            melee_skill: SkillKind::Melee,
        }
    }
}

/// Rule tables for agent-independent item modifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRules {
    /// Range in tiles → multiplier (non-decreasing, last bucket is the cap).
    #[serde(default = "default_range_buckets")]
    pub range_buckets: Vec<StepBucket>,
    /// Warmup in seconds → multiplier (non-increasing).
    #[serde(default = "default_warmup_buckets")]
    pub warmup_buckets: Vec<StepBucket>,
    /// Armor penetration fraction → multiplier (non-decreasing).
    #[serde(default = "default_ap_buckets")]
    pub armor_penetration_buckets: Vec<StepBucket>,
    /// Bonus per `ln(burst)`; diminishing with burst size.
    #[serde(default = "default_0_15")]
    pub burst_bonus_per_shot: f32,
    /// Upper bound for the burst bonus.
    #[serde(default = "default_0_5")]
    pub burst_bonus_cap: f32,
    /// Effective damage below this is penalised.
    #[serde(default = "default_8_0")]
    pub low_damage_threshold: f32,
    /// Multiplier applied to low-damage items.
    #[serde(default = "default_0_75")]
    pub low_damage_penalty: f32,
    /// Flat dampening for explosive / status / non-lethal items.
    #[serde(default = "default_0_5")]
    pub situational_multiplier: f32,
    /// Multiplier for compact sidearm items.
    #[serde(default = "default_0_85")]
    pub compact_multiplier: f32,
    /// Market value assumed when item data is missing or unusable.
    #[serde(default = "default_100_f32")]
    pub fallback_market_value: f32,
}

impl Default for PropertyRules {
    fn default() -> Self {
        Self {
            range_buckets: default_range_buckets(),
            warmup_buckets: default_warmup_buckets(),
            armor_penetration_buckets: default_ap_buckets(),
            burst_bonus_per_shot: 0.15,
            burst_bonus_cap: 0.5,
            low_damage_threshold: 8.0,
            low_damage_penalty: 0.75,
            situational_multiplier: 0.5,
            compact_multiplier: 0.85,
            fallback_market_value: 100.0,
        }
    }
}

/// Score composition weights and policy switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Global ranged (+1) vs melee (−1) preference.
    #[serde(default)]
    pub preference: f32,
    /// How strongly the preference moves each category's base.
    #[serde(default = "default_0_5")]
    pub preference_slope: f32,
    /// Base multiplier for ranged items at neutral preference.
    #[serde(default = "default_1_0")]
    pub ranged_base: f32,
    /// Base multiplier for melee items at neutral preference.
    #[serde(default = "default_1_0")]
    pub melee_base: f32,
    /// Base multiplier for other items (preference-independent).
    #[serde(default = "default_0_6")]
    pub other_base: f32,
    /// Constant in `market_value^0.25 × constant`.
    #[serde(default = "default_10_0")]
    pub value_constant: f32,
    /// Flat bonus for items bound to the scoring agent.
    #[serde(default = "default_30_0")]
    pub binding_bonus: f32,
    /// Flat bonus when the agent's role benefits from the category.
    #[serde(default = "default_15_0")]
    pub role_bonus: f32,
    /// Skill bonus at gap 1.
    #[serde(default = "default_5_0")]
    pub skill_bonus_base: f32,
    /// Growth factor per additional gap point.
    #[serde(default = "default_1_25")]
    pub skill_bonus_growth: f32,
    /// Upper bound for the skill bonus.
    #[serde(default = "default_60_0")]
    pub skill_bonus_cap: f32,
    /// Largest skill gap considered.
    #[serde(default = "default_20_u32")]
    pub skill_gap_cap: u32,
    /// Dampener for items of the agent's weaker category.
    #[serde(default = "default_0_6")]
    pub mismatch_multiplier: f32,
    /// Whether forced/bound held items may be replaced at all.
    #[serde(default)]
    pub allow_upgrading_forced: bool,
    /// Property score multiplier at zero durability.
    #[serde(default = "default_0_5")]
    pub durability_floor: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preference: 0.0,
            preference_slope: 0.5,
            ranged_base: 1.0,
            melee_base: 1.0,
            other_base: 0.6,
            value_constant: 10.0,
            binding_bonus: 30.0,
            role_bonus: 15.0,
            skill_bonus_base: 5.0,
            skill_bonus_growth: 1.25,
            skill_bonus_cap: 60.0,
            skill_gap_cap: 20,
            mismatch_multiplier: 0.6,
            allow_upgrading_forced: false,
            durability_floor: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_range_buckets() -> Vec<StepBucket> {
    vec![
        StepBucket::new(0.0, 0.8),
        StepBucket::new(15.0, 0.9),
        StepBucket::new(25.0, 1.0),
        StepBucket::new(35.0, 1.1),
        StepBucket::new(45.0, 1.2),
    ]
}

fn default_warmup_buckets() -> Vec<StepBucket> {
    vec![
        StepBucket::new(0.0, 1.15),
        StepBucket::new(1.0, 1.0),
        StepBucket::new(2.0, 0.9),
        StepBucket::new(3.0, 0.8),
    ]
}

fn default_ap_buckets() -> Vec<StepBucket> {
    vec![
        StepBucket::new(0.0, 0.9),
        StepBucket::new(0.15, 1.0),
        StepBucket::new(0.3, 1.1),
        StepBucket::new(0.5, 1.25),
    ]
}

fn default_ranged_skill() -> SkillKind { SkillKind::Shooting }
fn default_melee_skill() -> SkillKind { SkillKind::Melee }
fn default_0_15() -> f32 { 0.15 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_6() -> f32 { 0.6 }
fn default_0_75() -> f32 { 0.75 }
fn default_0_85() -> f32 { 0.85 }
fn default_1_0() -> f32 { 1.0 }
fn default_1_25() -> f32 { 1.25 }
fn default_5_0() -> f32 { 5.0 }
fn default_8_0() -> f32 { 8.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_15_0() -> f32 { 15.0 }
fn default_30_0() -> f32 { 30.0 }
fn default_60_0() -> f32 { 60.0 }
fn default_100_f32() -> f32 { 100.0 }
fn default_20_u32() -> u32 { 20 }
fn default_100() -> usize { 100 }
fn default_150() -> usize { 150 }
fn default_1000() -> usize { 1000 }
fn default_1000_u64() -> u64 { 1000 }
fn default_4000_u64() -> u64 { 4000 }
