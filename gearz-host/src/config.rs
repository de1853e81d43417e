//! Host-side configuration on top of [`gearz_core::GearzConfig`].
//!
//! Profiles size the caches for the expected population; the remaining
//! fields control how often the host asks the engine to look for gear.

use serde::{Deserialize, Serialize};

use gearz_core::GearzConfig;

// ---------------------------------------------------------------------------
// Population Profiles
// ---------------------------------------------------------------------------

/// Expected simulation size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostProfile {
    /// A handful of agents, small mod list.
    Small,
    /// Typical colony.
    #[default]
    Standard,
    /// Hundreds of agents, thousands of item definitions.
    Large,
}

impl HostProfile {
    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Small => "Small: under 20 agents, compact caches",
            Self::Standard => "Standard: up to 60 agents",
            Self::Large => "Large: hundreds of agents, big catalogs",
        }
    }

    /// Property memo capacity for this profile.
    #[must_use]
    pub fn property_capacity(self) -> usize {
        match self {
            Self::Small => 250,
            Self::Standard => 1000,
            Self::Large => 4000,
        }
    }

    /// Skill memo size at which the safety cleanup kicks in.
    #[must_use]
    pub fn skill_cleanup_threshold(self) -> usize {
        match self {
            Self::Small => 40,
            Self::Standard => 150,
            Self::Large => 600,
        }
    }

    /// Recommended maximum number of agents evaluated per tick.
    #[must_use]
    pub fn max_evaluations_per_tick(self) -> usize {
        match self {
            Self::Small => 5,
            Self::Standard => 10,
            Self::Large => 25,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

// ---------------------------------------------------------------------------
// Host Configuration
// ---------------------------------------------------------------------------

/// Configuration of the reference host integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Engine configuration.
    #[serde(default)]
    pub gearz: GearzConfig,
    /// Population profile.
    #[serde(default)]
    pub profile: HostProfile,
    /// Ticks between two gear evaluations of the same agent.
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_ticks: u64,
    /// Agents evaluated per tick at most.
    #[serde(default = "default_evaluations_per_tick")]
    pub max_evaluations_per_tick: usize,
    /// Minimum score improvement before an agent swaps gear.
    #[serde(default = "default_swap_margin")]
    pub swap_margin: f32,
    /// Log format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl HostConfig {
    /// Config tuned for `profile`.
    #[must_use]
    pub fn for_profile(profile: HostProfile) -> Self {
        let mut config = Self::default();
        config.profile = profile;
        config.apply_profile(&toml::Table::new());
        config
    }

    /// Size caches and the evaluation budget from `self.profile`, leaving
    /// alone every field that `explicit` sets.
    fn apply_profile(&mut self, explicit: &toml::Table) {
        let set = |path: &[&str]| {
            let mut node = explicit.get(path[0]);
            for key in &path[1..] {
                node = node.and_then(|v| v.get(*key));
            }
            node.is_some()
        };
        let profile = self.profile;
        let memo = &mut self.gearz.skill_memo;
        if !set(&["gearz", "property_memo", "capacity"]) {
            self.gearz.property_memo.capacity = profile.property_capacity();
        }
        if !set(&["gearz", "skill_memo", "cleanup_threshold"]) {
            memo.cleanup_threshold = profile.skill_cleanup_threshold();
        }
        if !set(&["gearz", "skill_memo", "retain_after_cleanup"]) {
            memo.retain_after_cleanup = memo.cleanup_threshold * 2 / 3;
        }
        if !set(&["max_evaluations_per_tick"]) {
            self.max_evaluations_per_tick = profile.max_evaluations_per_tick();
        }
    }

    /// Parse and validate from TOML.
    ///
    /// The profile sizes every capacity the file does not set itself.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or the engine section is invalid.
    pub fn from_toml(toml_str: &str) -> gearz_core::error::Result<Self> {
        let explicit: toml::Table = toml_str
            .parse()
            .map_err(|e: toml::de::Error| gearz_core::GearzError::Config(e.to_string()))?;
        let mut config: Self = toml::from_str(toml_str)
            .map_err(|e| gearz_core::GearzError::Config(e.to_string()))?;
        config.apply_profile(&explicit);
        config.gearz.validate()?;
        if config.evaluation_interval_ticks == 0 {
            return Err(gearz_core::GearzError::Config(
                "evaluation_interval_ticks must be > 0".into(),
            ));
        }
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> gearz_core::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            gearz: GearzConfig::default(),
            profile: HostProfile::Standard,
            evaluation_interval_ticks: default_evaluation_interval(),
            max_evaluations_per_tick: default_evaluations_per_tick(),
            swap_margin: default_swap_margin(),
            log_format: LogFormat::Pretty,
            log_filter: default_log_filter(),
        }
    }
}

fn default_evaluation_interval() -> u64 { 250 }
fn default_evaluations_per_tick() -> usize { 10 }
fn default_swap_margin() -> f32 { 5.0 }
fn default_log_filter() -> String { "info".into() }

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_standard() {
        let config = HostConfig::default();
        assert_eq!(config.profile, HostProfile::Standard);
        assert_eq!(config.gearz.property_memo.capacity, HostProfile::Standard.property_capacity());
    }

    #[test]
    fn profiles_produce_valid_engine_configs() {
        for profile in [HostProfile::Small, HostProfile::Standard, HostProfile::Large] {
            let config = HostConfig::for_profile(profile);
            assert!(config.gearz.validate().is_ok(), "{}", profile.description());
        }
    }

    #[test]
    fn large_profile_has_larger_caches() {
        let large = HostConfig::for_profile(HostProfile::Large);
        let small = HostConfig::for_profile(HostProfile::Small);
        assert!(large.gearz.property_memo.capacity > small.gearz.property_memo.capacity);
        assert!(large.max_evaluations_per_tick > small.max_evaluations_per_tick);
    }

    #[test]
    fn parses_nested_engine_section() {
        let config = HostConfig::from_toml(
            r#"
            profile = "Large"
            log_format = "json"
            evaluation_interval_ticks = 60

            [gearz.scoring]
            preference = 0.5
            "#,
        )
        .expect("valid host config");
        assert_eq!(config.profile, HostProfile::Large);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.evaluation_interval_ticks, 60);
        assert!((config.gearz.scoring.preference - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn toml_profile_sizes_unset_capacities() {
        let config = HostConfig::from_toml(
            r#"
            profile = "Large"

            [gearz.skill_memo]
            cleanup_threshold = 300
            "#,
        )
        .expect("valid host config");
        assert_eq!(config.gearz.property_memo.capacity, HostProfile::Large.property_capacity());
        assert_eq!(config.max_evaluations_per_tick, HostProfile::Large.max_evaluations_per_tick());
        assert_eq!(config.gearz.skill_memo.cleanup_threshold, 300);
        assert_eq!(config.gearz.skill_memo.retain_after_cleanup, 200);
    }

    #[test]
    fn explicit_values_beat_profile_sizing() {
        let config = HostConfig::from_toml(
            r#"
            profile = "Small"
            max_evaluations_per_tick = 12

            [gearz.property_memo]
            capacity = 77
            "#,
        )
        .expect("valid host config");
        assert_eq!(config.gearz.property_memo.capacity, 77);
        assert_eq!(config.max_evaluations_per_tick, 12);
        assert_eq!(
            config.gearz.skill_memo.cleanup_threshold,
            HostProfile::Small.skill_cleanup_threshold()
        );
    }

    #[test]
    fn rejects_zero_interval_and_bad_engine_values() {
        assert!(HostConfig::from_toml("evaluation_interval_ticks = 0").is_err());
        assert!(HostConfig::from_toml("[gearz.scoring]\npreference = 4.0").is_err());
    }
}
