//! Equipment utility scoring.
//!
//! The pipeline short-circuits on hard outcomes:
//!
//! 1. **Forced keep**: the agent holds a forced or bound item and upgrading
//!    those is disabled → [`SENTINEL_KEEP`]
//! 2. **Policy**: disallowed and not held → [`SENTINEL_REJECT`]
//! 3. **Binding**: bound to someone else → [`SENTINEL_REJECT`]; bound to
//!    this agent → flat bonus
//! 4. **Role**: flat bonus for a benefiting role
//! 5. **Skill**: exponential bonus for matching the stronger skill, or a
//!    dampener for the weaker one
//! 6. **Property**: memoized item modifiers, preference and durability
//! 7. **Ammo**: optional collaborator multiplier
//!
//! [`Engine`] owns the caches and the scheduler that expires them; nothing is
//! process-global, so independent engines can run side by side.

pub mod factors;

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::capability::{AlwaysEligible, AmmoModifier, Eligibility, NoAmmoModifier};
use crate::catalog::ItemCatalog;
use crate::config::GearzConfig;
use crate::error::{GearzError, Result};
use crate::memo::{AgentSkillMemo, CacheTimestamps, PropertyMemo, SkillTier};
use crate::metrics::EngineCounters;
use crate::scheduler::{EventHandler, EventKind, EventScheduler, ScheduledEvent};
use crate::types::{Agent, AgentId, CandidateItem, ScoreValue, Tick};

use factors::SkillTable;

/// Hard disqualification. Callers compare by threshold via
/// [`ScoreValue::is_rejected`].
pub const SENTINEL_REJECT: f32 = -1_000_000.0;

/// Hard retention ("never replace"). See [`ScoreValue::is_kept`].
pub const SENTINEL_KEEP: f32 = 1_000_000.0;

/// Both memo caches. This is the context handed to scheduled-event handlers.
#[derive(Debug)]
pub struct MemoCaches {
    /// Agent-independent item properties.
    pub property: PropertyMemo,
    /// Per-agent skill levels.
    pub skill: AgentSkillMemo,
}

/// How a score was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Ran the whole pipeline.
    Scored,
    /// Forced or bound held item that may not be upgraded.
    ForcedKeep,
    /// Policy forbids the item and the agent does not hold it.
    PolicyRejected,
    /// Bound to a different agent.
    BoundElsewhere,
}

/// Per-factor parts of one score, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Outcome of the pipeline.
    pub verdict: Verdict,
    /// Policy part (0 or sentinel).
    pub policy: f32,
    /// Binding bonus.
    pub binding: f32,
    /// Role bonus.
    pub role: f32,
    /// Skill bonus.
    pub skill: f32,
    /// Property score after preference, durability and mismatch.
    pub property: f32,
    /// Dampener applied for the agent's weaker category.
    pub mismatch_multiplier: f32,
    /// Collaborator multiplier actually applied (1 when none).
    pub ammo_multiplier: f32,
    /// Final score.
    pub total: f32,
}

impl ScoreBreakdown {
    fn sentinel(verdict: Verdict, total: f32) -> Self {
        Self {
            verdict,
            policy: 0.0,
            binding: 0.0,
            role: 0.0,
            skill: 0.0,
            property: 0.0,
            mismatch_multiplier: 1.0,
            ammo_multiplier: 1.0,
            total,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Constructs an [`Engine`] with its capabilities resolved up front.
pub struct EngineBuilder {
    config: GearzConfig,
    catalog: ItemCatalog,
    eligibility: Box<dyn Eligibility>,
    ammo: Box<dyn AmmoModifier>,
}

impl EngineBuilder {
    /// Start from default configuration and no optional capabilities.
    #[must_use]
    pub fn new(catalog: ItemCatalog) -> Self {
        Self {
            config: GearzConfig::default(),
            catalog,
            eligibility: Box::new(AlwaysEligible),
            ammo: Box::new(NoAmmoModifier),
        }
    }

    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: GearzConfig) -> Self {
        self.config = config;
        self
    }

    /// Install an eligibility gate for [`Engine::try_score`].
    #[must_use]
    pub fn eligibility(mut self, eligibility: impl Eligibility + 'static) -> Self {
        self.eligibility = Box::new(eligibility);
        self
    }

    /// Install an ammo / resource modifier.
    #[must_use]
    pub fn ammo_modifier(mut self, ammo: impl AmmoModifier + 'static) -> Self {
        self.ammo = Box::new(ammo);
        self
    }

    /// Validate the configuration and build the engine.
    ///
    /// # Errors
    /// Returns `GearzError::Config` if the configuration is invalid.
    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        let mut scheduler = EventScheduler::new();
        scheduler.register(EventKind::SkillCacheExpiry, skill_expiry_handler());
        info!(
            property_capacity = self.config.property_memo.capacity,
            skill_ttl = self.config.skill_memo.value_ttl_ticks,
            definitions = self.catalog.definition_count(),
            "GEARZ engine initialized"
        );
        Ok(Engine {
            skill_table: SkillTable::new(&self.config.scoring),
            caches: MemoCaches {
                property: PropertyMemo::new(self.config.property_memo.capacity),
                skill: AgentSkillMemo::new(self.config.skill_memo.clone()),
            },
            scheduler,
            config: self.config,
            catalog: self.catalog,
            eligibility: self.eligibility,
            ammo: self.ammo,
            counters: Arc::new(EngineCounters::new()),
        })
    }
}

fn skill_expiry_handler() -> EventHandler<MemoCaches> {
    Box::new(|caches: &mut MemoCaches, tick: Tick, event: &ScheduledEvent| {
        match SkillTier::from_code(event.secondary) {
            Some(tier) => {
                caches.skill.expire(AgentId(event.primary), tier, tick);
            }
            None => trace!(tick, tier = event.secondary, "Unknown skill tier in expiry event"),
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The scoring engine. Owns both memo caches and the expiry scheduler.
pub struct Engine {
    config: GearzConfig,
    catalog: ItemCatalog,
    caches: MemoCaches,
    scheduler: EventScheduler<MemoCaches>,
    skill_table: SkillTable,
    eligibility: Box<dyn Eligibility>,
    ammo: Box<dyn AmmoModifier>,
    counters: Arc<EngineCounters>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("preference", &self.config.scoring.preference)
            .field("definitions", &self.catalog.definition_count())
            .field("caches", &self.caches)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with `config`, `catalog` and no optional capabilities.
    ///
    /// # Errors
    /// Returns `GearzError::Config` if the configuration is invalid.
    pub fn new(config: GearzConfig, catalog: ItemCatalog) -> Result<Self> {
        EngineBuilder::new(catalog).config(config).build()
    }

    /// How much `agent` wants `item` at `now`.
    pub fn score(&mut self, agent: &Agent, item: &CandidateItem, now: Tick) -> f32 {
        self.score_breakdown(agent, item, now).total
    }

    /// [`Engine::score`] wrapped for total ordering.
    pub fn score_value(&mut self, agent: &Agent, item: &CandidateItem, now: Tick) -> ScoreValue {
        ScoreValue::new(self.score(agent, item, now))
    }

    /// Score only if the eligibility capability allows it.
    pub fn try_score(&mut self, agent: &Agent, item: &CandidateItem, now: Tick) -> Option<f32> {
        if !self.eligibility.is_eligible(agent, now) {
            EngineCounters::bump(&self.counters.ineligible, 1);
            trace!(agent = %agent.id, now, "Agent not eligible for scoring");
            return None;
        }
        Some(self.score(agent, item, now))
    }

    /// Full pipeline with every factor reported.
    pub fn score_breakdown(&mut self, agent: &Agent, item: &CandidateItem, now: Tick) -> ScoreBreakdown {
        let breakdown = self.run_pipeline(agent, item, now);
        EngineCounters::bump(&self.counters.scores_computed, 1);
        match breakdown.verdict {
            Verdict::ForcedKeep => EngineCounters::bump(&self.counters.keeps, 1),
            Verdict::PolicyRejected | Verdict::BoundElsewhere => {
                EngineCounters::bump(&self.counters.rejections, 1);
            }
            Verdict::Scored => {}
        }
        breakdown
    }

    fn run_pipeline(&mut self, agent: &Agent, item: &CandidateItem, now: Tick) -> ScoreBreakdown {
        let sc = &self.config.scoring;
        let held = agent.is_holding(item.id);

        if held && (item.forced_held || item.is_bound_to(agent.id)) && !sc.allow_upgrading_forced {
            return ScoreBreakdown::sentinel(Verdict::ForcedKeep, SENTINEL_KEEP);
        }

        let definition = self.catalog.definition(item.definition).ok();
        let policy = factors::policy_score(agent, item, definition);
        if policy < 0.0 && !held {
            trace!(agent = %agent.id, item = %item.id, "Rejected by policy");
            return ScoreBreakdown::sentinel(Verdict::PolicyRejected, SENTINEL_REJECT);
        }

        let binding = match item.bound_to {
            Some(owner) if owner != agent.id => {
                trace!(agent = %agent.id, item = %item.id, %owner, "Bound to another agent");
                return ScoreBreakdown::sentinel(Verdict::BoundElsewhere, SENTINEL_REJECT);
            }
            Some(_) => sc.binding_bonus,
            None => 0.0,
        };

        let props = self
            .caches
            .property
            .get(item, &self.catalog, &self.config.rules, now);
        let role = factors::role_score(agent, props.category, sc);

        let skills = self.caches.skill.skills(agent, now, &mut self.scheduler);
        let (skill, mismatch) = factors::skill_factor(skills, props.category, &self.skill_table, sc);

        let property =
            factors::property_score(&props, item.durability, &self.config.rules, sc) * mismatch;
        let mut total = (policy + binding + role) * mismatch + skill + property;

        let mut ammo_multiplier = 1.0;
        if !ScoreValue::new(total).is_rejected() {
            if let Some(m) = self.ammo.modifier(agent, item) {
                if m.is_finite() && m >= 0.0 {
                    ammo_multiplier = m;
                    total *= m;
                } else {
                    warn!(agent = %agent.id, item = %item.id, modifier = m, "Ignoring invalid ammo modifier");
                }
            }
        }

        ScoreBreakdown {
            verdict: Verdict::Scored,
            policy,
            binding,
            role,
            skill,
            property,
            mismatch_multiplier: mismatch,
            ammo_multiplier,
            total,
        }
    }

    // -----------------------------------------------------------------------
    // Tick & cache lifecycle
    // -----------------------------------------------------------------------

    /// Dispatch every event due at `now`. Call once per increasing tick.
    ///
    /// # Errors
    /// Returns the first error from a collaborator handler; events of other
    /// ticks are unaffected.
    pub fn process_tick(&mut self, now: Tick) -> Result<usize> {
        match self.scheduler.process_tick(now, &mut self.caches) {
            Ok(dispatched) => {
                EngineCounters::bump(&self.counters.events_dispatched, dispatched as u64);
                Ok(dispatched)
            }
            Err(e) => {
                EngineCounters::bump(&self.counters.handler_failures, 1);
                Err(e)
            }
        }
    }

    /// Drop both caches and their pending expiry events.
    pub fn clear_all_caches(&mut self) {
        self.caches.property.clear_all();
        self.caches.skill.reset_all();
        let cancelled = self.scheduler.cancel_kind(EventKind::SkillCacheExpiry);
        EngineCounters::bump(&self.counters.cache_clears, 1);
        debug!(cancelled, "All GEARZ caches cleared");
    }

    /// Change the global ranged/melee preference (clamped to [−1, 1]).
    /// Clears all caches.
    pub fn set_preference(&mut self, preference: f32) {
        let clamped = if preference.is_finite() { preference.clamp(-1.0, 1.0) } else { 0.0 };
        self.config.scoring.preference = clamped;
        self.clear_all_caches();
        info!(preference = clamped, "Scoring preference changed");
    }

    /// Current global preference.
    #[must_use]
    pub fn preference(&self) -> f32 {
        self.config.scoring.preference
    }

    /// Swap in a new definition snapshot. Clears the property memo.
    pub fn replace_catalog(&mut self, catalog: ItemCatalog) {
        self.catalog = catalog;
        self.caches.property.clear_all();
        EngineCounters::bump(&self.counters.cache_clears, 1);
        info!(definitions = self.catalog.definition_count(), "Item catalog replaced");
    }

    /// Forget an agent that left the simulation, including its pending
    /// expiry events.
    pub fn on_agent_destroyed(&mut self, agent: AgentId) {
        self.caches.skill.forget_agent(agent);
        for tier in [SkillTier::Value, SkillTier::Index] {
            self.scheduler
                .cancel(EventKind::SkillCacheExpiry, agent.0, tier.code());
        }
        trace!(%agent, "Agent caches dropped");
    }

    /// Persistable TTL origins of the skill memo.
    #[must_use]
    pub fn cache_timestamps(&self, now: Tick) -> CacheTimestamps {
        self.caches.skill.timestamps(now)
    }

    /// Re-create expiry events after resuming from saved state.
    ///
    /// Returns the number of events scheduled.
    pub fn rebuild_schedule_from_timestamps<'a>(
        &mut self,
        now: Tick,
        restored: Option<&CacheTimestamps>,
        live_agents: impl IntoIterator<Item = &'a Agent>,
    ) -> usize {
        let _span = tracing::debug_span!(crate::metrics::spans::REBUILD_SCHEDULE, now).entered();
        self.caches
            .skill
            .rebuild_schedule(now, restored, live_agents, &mut self.scheduler)
    }

    // -----------------------------------------------------------------------
    // Collaborator events
    // -----------------------------------------------------------------------

    /// Register a handler for a collaborator event kind.
    ///
    /// # Errors
    /// Returns `GearzError::Config` for [`EventKind::SkillCacheExpiry`],
    /// which the engine owns.
    pub fn register_handler(&mut self, kind: EventKind, handler: EventHandler<MemoCaches>) -> Result<()> {
        if kind == EventKind::SkillCacheExpiry {
            return Err(GearzError::Config(format!("{kind} handler is reserved")));
        }
        self.scheduler.register(kind, handler);
        Ok(())
    }

    /// Schedule a collaborator event.
    pub fn schedule(&mut self, tick: Tick, kind: EventKind, primary: u64, secondary: u64) {
        self.scheduler.schedule(tick, kind, primary, secondary);
    }

    /// Cancel matching pending events. Returns how many were removed.
    pub fn cancel(&mut self, kind: EventKind, primary: u64, secondary: u64) -> usize {
        self.scheduler.cancel(kind, primary, secondary)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Shared handle to the runtime counters.
    #[must_use]
    pub fn counters(&self) -> Arc<EngineCounters> {
        Arc::clone(&self.counters)
    }

    /// Both memo caches.
    #[must_use]
    pub fn caches(&self) -> &MemoCaches {
        &self.caches
    }

    /// The expiry scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &EventScheduler<MemoCaches> {
        &self.scheduler
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &GearzConfig {
        &self.config
    }

    /// Active definition snapshot.
    #[must_use]
    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Precomputed skill bonus table.
    #[must_use]
    pub fn skill_table(&self) -> &SkillTable {
        &self.skill_table
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::EligibleWhen;
    use crate::types::{
        DefinitionId, ItemCategory, ItemDefinition, ItemId, ItemTraits, RoleFlags, SkillKind,
    };

    const RIFLE: DefinitionId = DefinitionId(1);
    const SWORD: DefinitionId = DefinitionId(2);

    fn catalog() -> ItemCatalog {
        let mut rifle = ItemDefinition::new(RIFLE, "rifle", ItemCategory::Ranged);
        rifle.range = 25.0;
        rifle.warmup = 1.0;
        rifle.armor_penetration = 0.15;
        rifle.market_value = 500.0;
        let mut sword = ItemDefinition::new(SWORD, "sword", ItemCategory::Melee);
        sword.armor_penetration = 0.15;
        sword.market_value = 500.0;
        ItemCatalog::new().with_definition(rifle).with_definition(sword)
    }

    fn engine() -> Engine {
        Engine::new(GearzConfig::default(), catalog()).expect("default config is valid")
    }

    fn shooter() -> Agent {
        Agent::new(AgentId(1))
            .with_skill(SkillKind::Shooting, 10)
            .with_skill(SkillKind::Melee, 2)
    }

    fn rifle(id: u64) -> CandidateItem {
        CandidateItem::new(ItemId(id), RIFLE)
    }

    fn sword(id: u64) -> CandidateItem {
        CandidateItem::new(ItemId(id), SWORD)
    }

    #[test]
    fn scenario_ranged_match_adds_skill_and_property() {
        let mut engine = engine();
        let breakdown = engine.score_breakdown(&shooter(), &rifle(10), 0);

        let expected_property = 500f32.powf(0.25) * 10.0;
        let expected_skill = 5.0 * 1.25f32.powi(7);
        assert_eq!(breakdown.verdict, Verdict::Scored);
        assert!((breakdown.property - expected_property).abs() < 1e-3);
        assert!((breakdown.skill - expected_skill).abs() < 1e-3);
        assert!((breakdown.total - (expected_property + expected_skill)).abs() < 1e-3);
    }

    #[test]
    fn scenario_policy_rejects_unheld_item() {
        let mut engine = engine();
        let mut agent = shooter();
        agent.policy = agent.policy.deny(RIFLE);
        agent.roles = RoleFlags { ranged_focus: true, ..RoleFlags::default() };

        let mut shiny = rifle(10);
        shiny.quality = crate::types::QualityTier::Legendary;
        shiny.bound_to = Some(agent.id);
        assert!((engine.score(&agent, &shiny, 0) - SENTINEL_REJECT).abs() < f32::EPSILON);
        assert_eq!(engine.counters().snapshot().rejections, 1);
    }

    #[test]
    fn rejected_but_held_item_still_scores_as_rejected() {
        let mut engine = engine();
        let mut agent = shooter().holding(ItemId(10));
        agent.policy = agent.policy.deny(RIFLE);
        let breakdown = engine.score_breakdown(&agent, &rifle(10), 0);
        assert_eq!(breakdown.verdict, Verdict::Scored);
        assert!(ScoreValue::new(breakdown.total).is_rejected());
    }

    #[test]
    fn forced_held_item_is_kept() {
        let mut engine = engine();
        let agent = shooter().holding(ItemId(10));
        let mut item = rifle(10);
        item.forced_held = true;
        assert!(engine.score_value(&agent, &item, 0).is_kept());

        let mut config = GearzConfig::default();
        config.scoring.allow_upgrading_forced = true;
        let mut permissive = Engine::new(config, catalog()).expect("valid config");
        assert!(!permissive.score_value(&agent, &item, 0).is_kept());
    }

    #[test]
    fn binding_bonus_and_foreign_binding() {
        let mut engine = engine();
        let agent = shooter();
        let plain = engine.score(&agent, &rifle(10), 0);

        let mut mine = rifle(11);
        mine.bound_to = Some(agent.id);
        let bound = engine.score(&agent, &mine, 0);
        assert!((bound - plain - engine.config().scoring.binding_bonus).abs() < 1e-3);

        let mut theirs = rifle(12);
        theirs.bound_to = Some(AgentId(99));
        assert!(engine.score_value(&agent, &theirs, 0).is_rejected());
    }

    #[test]
    fn mismatch_dampens_weaker_category() {
        let mut engine = engine();
        let agent = shooter().with_skill(SkillKind::Melee, 2);
        let ranged = engine.score_breakdown(&agent, &rifle(10), 0);
        let melee = engine.score_breakdown(&agent, &sword(20), 0);

        assert!((melee.mismatch_multiplier - 0.6).abs() < f32::EPSILON);
        assert!(melee.skill.abs() < f32::EPSILON);
        assert!(melee.total < ranged.total);
    }

    #[test]
    fn role_bonus_scaled_by_mismatch() {
        let mut engine = engine();
        let mut agent = shooter();
        agent.roles = RoleFlags { melee_focus: true, ..RoleFlags::default() };
        let breakdown = engine.score_breakdown(&agent, &sword(20), 0);
        let expected = 15.0 * 0.6 + breakdown.property;
        assert!((breakdown.total - expected).abs() < 1e-3);
    }

    #[test]
    fn score_is_deterministic_with_warm_caches() {
        let mut engine = engine();
        let agent = shooter();
        let first = engine.score(&agent, &rifle(10), 5);
        let second = engine.score(&agent, &rifle(10), 5);
        assert!((first - second).abs() < f32::EPSILON);
        assert_eq!(engine.caches().property.stats().hits, 1);
        assert_eq!(engine.caches().skill.stats().value_hits, 1);
    }

    #[test]
    fn preference_change_clears_caches_and_shifts_scores() {
        let mut engine = engine();
        let agent = Agent::new(AgentId(2));
        let neutral = engine.score(&agent, &rifle(10), 0);
        assert_eq!(engine.caches().property.len(), 1);

        engine.set_preference(3.0);
        assert!((engine.preference() - 1.0).abs() < f32::EPSILON);
        assert!(engine.caches().property.is_empty());
        assert_eq!(engine.caches().skill.value_len(), 0);
        assert!(engine.scheduler().is_empty());
        assert!(engine.score(&agent, &rifle(10), 0) > neutral);
        assert!(engine.score(&agent, &sword(20), 0) < neutral);
    }

    #[test]
    fn unknown_definition_scores_with_fallback() {
        let mut engine = engine();
        let ghost = CandidateItem::new(ItemId(5), DefinitionId(404));
        let breakdown = engine.score_breakdown(&shooter(), &ghost, 0);
        assert_eq!(breakdown.verdict, Verdict::Scored);
        let expected = 100f32.powf(0.25) * 10.0 * 0.6;
        assert!((breakdown.total - expected).abs() < 1e-3);
        assert!(engine.caches().property.is_empty());
    }

    #[test]
    fn replace_catalog_invalidates_property_memo() {
        let mut engine = engine();
        let before = engine.score(&shooter(), &rifle(10), 0);

        let mut pricier = ItemDefinition::new(RIFLE, "rifle", ItemCategory::Ranged);
        pricier.range = 25.0;
        pricier.warmup = 1.0;
        pricier.armor_penetration = 0.15;
        pricier.market_value = 5000.0;
        engine.replace_catalog(ItemCatalog::new().with_definition(pricier));

        assert!(engine.score(&shooter(), &rifle(10), 0) > before);
    }

    #[test]
    fn situational_items_are_dampened() {
        let mut engine = engine();
        let mut grenade = ItemDefinition::new(DefinitionId(3), "grenade", ItemCategory::Ranged);
        grenade.range = 25.0;
        grenade.warmup = 1.0;
        grenade.armor_penetration = 0.15;
        grenade.market_value = 500.0;
        grenade.traits = ItemTraits { explosive: true, ..ItemTraits::default() };
        engine.replace_catalog(catalog().with_definition(grenade));

        let agent = Agent::new(AgentId(3));
        let rifle_score = engine.score(&agent, &rifle(1), 0);
        let grenade_score = engine.score(&agent, &CandidateItem::new(ItemId(2), DefinitionId(3)), 0);
        assert!((grenade_score - rifle_score * 0.5).abs() < 1e-3);
    }

    #[test]
    fn durability_lowers_property_score() {
        let mut engine = engine();
        let agent = Agent::new(AgentId(4));
        let mut worn = rifle(2);
        worn.durability = 0.0;
        let fresh = engine.score(&agent, &rifle(1), 0);
        let broken = engine.score(&agent, &worn, 0);
        assert!((broken - fresh * 0.5).abs() < 1e-3);
    }

    struct HalfAmmo;

    impl AmmoModifier for HalfAmmo {
        fn modifier(&self, _agent: &Agent, item: &CandidateItem) -> Option<f32> {
            (item.definition == RIFLE).then_some(0.5)
        }
    }

    #[test]
    fn ammo_modifier_scales_total() {
        let agent = shooter();
        let plain = engine().score(&agent, &rifle(1), 0);
        let mut engine = EngineBuilder::new(catalog())
            .ammo_modifier(HalfAmmo)
            .build()
            .expect("valid config");
        let breakdown = engine.score_breakdown(&agent, &rifle(1), 0);
        assert!((breakdown.total - plain * 0.5).abs() < 1e-3);
        assert!((breakdown.ammo_multiplier - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn try_score_respects_eligibility() {
        let mut engine = EngineBuilder::new(catalog())
            .eligibility(EligibleWhen(|_: &Agent, now: Tick| now >= 100))
            .build()
            .expect("valid config");
        assert_eq!(engine.try_score(&shooter(), &rifle(1), 50), None);
        assert!(engine.try_score(&shooter(), &rifle(1), 100).is_some());
        assert_eq!(engine.counters().snapshot().ineligible, 1);
    }

    #[test]
    fn skill_expiry_flows_through_process_tick() {
        let mut engine = engine();
        let mut agent = shooter();
        engine.score(&agent, &rifle(1), 0);
        for tick in 1..=1000 {
            engine.process_tick(tick).expect("no collaborator handlers");
        }
        assert!(engine.caches().skill.peek(agent.id).is_none());

        agent.skills[1].level = 30;
        let breakdown = engine.score_breakdown(&agent, &sword(2), 1001);
        assert_eq!(breakdown.mismatch_multiplier, 1.0);
        assert!(breakdown.skill > 0.0);
        assert_eq!(engine.counters().snapshot().events_dispatched, 1);
    }

    #[test]
    fn destroyed_agent_leaves_no_pending_events() {
        let mut engine = engine();
        let agent = shooter();
        engine.score(&agent, &rifle(1), 0);
        assert_eq!(engine.scheduler().pending(), 2);
        engine.on_agent_destroyed(agent.id);
        assert!(engine.scheduler().is_empty());
        assert!(engine.caches().skill.peek(agent.id).is_none());
    }

    #[test]
    fn collaborator_events_and_reserved_kind() {
        let mut engine = engine();
        let handler: EventHandler<MemoCaches> =
            Box::new(|caches: &mut MemoCaches, _tick: Tick, _event: &ScheduledEvent| {
                caches.property.clear_all();
                Ok(())
            });
        assert!(engine.register_handler(EventKind::SkillCacheExpiry, handler).is_err());

        let failing: EventHandler<MemoCaches> =
            Box::new(|_: &mut MemoCaches, tick: Tick, event: &ScheduledEvent| {
                Err(GearzError::Handler { kind: event.kind, tick, reason: "boom".into() })
            });
        engine
            .register_handler(EventKind::Custom(7), failing)
            .expect("custom kinds are allowed");
        engine.schedule(3, EventKind::Custom(7), 1, 0);
        engine.schedule(4, EventKind::Custom(7), 2, 0);
        assert_eq!(engine.cancel(EventKind::Custom(7), 2, 0), 1);

        assert!(engine.process_tick(3).is_err());
        assert_eq!(engine.process_tick(4).ok(), Some(0));
        assert_eq!(engine.counters().snapshot().handler_failures, 1);
    }

    #[test]
    fn timestamps_rebuild_round_trip() {
        let mut engine = engine();
        let agent = shooter();
        engine.score(&agent, &rifle(1), 10);
        let saved = engine.cache_timestamps(20);

        let mut resumed = self::engine();
        let scheduled = resumed.rebuild_schedule_from_timestamps(20, Some(&saved), [&agent]);
        assert_eq!(scheduled, 2);
        assert_eq!(resumed.scheduler().pending_at(1010), 1);
        assert_eq!(resumed.scheduler().pending_at(4010), 1);
    }

    #[test]
    fn invalid_config_fails_build() {
        let mut config = GearzConfig::default();
        config.scoring.mismatch_multiplier = 1.5;
        assert!(Engine::new(config, catalog()).is_err());
    }

    struct NoAmmo;

    impl AmmoModifier for NoAmmo {
        fn modifier(&self, _agent: &Agent, _item: &CandidateItem) -> Option<f32> {
            Some(0.0)
        }
    }

    #[test]
    fn heavy_mismatch_cannot_hide_held_rejection() {
        let mut config = GearzConfig::default();
        config.scoring.mismatch_multiplier = 0.4;
        assert!(Engine::new(config.clone(), catalog()).is_err());

        config.scoring.mismatch_multiplier = 0.51;
        let mut engine = EngineBuilder::new(catalog())
            .config(config)
            .ammo_modifier(NoAmmo)
            .build()
            .expect("valid config");
        let mut agent = shooter().holding(ItemId(3));
        agent.policy = agent.policy.deny(SWORD);

        let breakdown = engine.score_breakdown(&agent, &sword(3), 0);
        assert!((breakdown.mismatch_multiplier - 0.51).abs() < f32::EPSILON);
        assert!(ScoreValue::new(breakdown.total).is_rejected());
        assert!((breakdown.ammo_multiplier - 1.0).abs() < f32::EPSILON);
    }
}
