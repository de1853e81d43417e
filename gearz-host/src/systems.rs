//! Per-tick systems of the reference host.
//!
//! One [`TickDriver::step`] runs, in order:
//!
//! | Stage        | What                                           |
//! |--------------|------------------------------------------------|
//! | Events       | apply queued [`HostEvent`]s                    |
//! | Scheduler    | dispatch engine events due at this tick        |
//! | Evaluation   | re-score gear for agents whose interval passed |
//!
//! A failing scheduled-event handler is logged and the tick carries on, so
//! one broken collaborator cannot stall gear evaluation.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use gearz_core::error::Result;
use gearz_core::metrics::spans;
use gearz_core::{
    Agent, AgentId, CandidateItem, Engine, EngineBuilder, ItemCatalog, ItemId, ScoreValue, Tick,
};

use crate::components::GearComponent;
use crate::config::HostConfig;
use crate::events::HostEvent;
use crate::world::WorldSnapshot;

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Apply one host event to the engine, the world and the agent components.
///
/// Returns `false` when the event referenced an agent or item the world
/// does not know; the event is then a no-op apart from cache invalidation.
pub fn apply_event(
    engine: &mut Engine,
    world: &mut WorldSnapshot,
    components: &mut BTreeMap<AgentId, GearComponent>,
    event: HostEvent,
    now: Tick,
) -> bool {
    debug!(event = event.label(), now, "Applying host event");
    match event {
        HostEvent::AgentSpawned { agent } => {
            components.entry(agent.id).or_insert_with(GearComponent::new);
            world.spawn_agent(agent);
            true
        }
        HostEvent::AgentDestroyed { agent } => {
            engine.on_agent_destroyed(agent);
            components.remove(&agent);
            world.remove_agent(agent).is_some()
        }
        HostEvent::SkillChanged { agent, kind, level } => world.set_skill(agent, kind, level),
        HostEvent::ItemEquipped { agent, item } => {
            let equipped = world.equip(agent, item);
            if equipped {
                if let Some(component) = components.get_mut(&agent) {
                    component.last_choice = None;
                }
            }
            equipped
        }
        HostEvent::CatalogReplaced { catalog } => {
            world.catalog = catalog.clone();
            engine.replace_catalog(catalog);
            true
        }
        HostEvent::PreferenceChanged { preference } => {
            engine.set_preference(preference);
            for component in components.values_mut() {
                component.last_evaluated = None;
            }
            true
        }
        HostEvent::GameLoaded { timestamps } => {
            let scheduled =
                engine.rebuild_schedule_from_timestamps(now, timestamps.as_ref(), world.agents.values());
            info!(scheduled, restored = timestamps.is_some(), "Skill cache schedule rebuilt");
            true
        }
        HostEvent::NewRun => {
            engine.clear_all_caches();
            for component in components.values_mut() {
                *component = GearComponent::new();
            }
            true
        }
    }
}

/// Dispatch the engine's events due at `now`.
///
/// Returns `None` if a handler failed. The failure is logged here and does
/// not propagate.
pub fn run_scheduler(engine: &mut Engine, now: Tick) -> Option<usize> {
    let _span = tracing::debug_span!(spans::PROCESS_TICK, now).entered();
    match engine.process_tick(now) {
        Ok(dispatched) => Some(dispatched),
        Err(e) => {
            error!(now, error = %e, "Scheduled event dispatch failed");
            None
        }
    }
}

/// Pick a better item for `agent` among `candidates`.
///
/// Returns the best candidate if it beats the held item by at least
/// `swap_margin`. Never suggests replacing a hard-kept item, and returns
/// `None` when the agent is not eligible for scoring.
pub fn evaluate_agent<'a>(
    engine: &mut Engine,
    agent: &Agent,
    held: Option<&CandidateItem>,
    candidates: impl IntoIterator<Item = &'a CandidateItem>,
    now: Tick,
    swap_margin: f32,
) -> Option<(ItemId, ScoreValue)> {
    let current = match held {
        Some(item) => Some(ScoreValue::new(engine.try_score(agent, item, now)?)),
        None => None,
    };
    if current.is_some_and(ScoreValue::is_kept) {
        return None;
    }

    let mut best: Option<(ItemId, ScoreValue)> = None;
    for item in candidates {
        if agent.is_holding(item.id) {
            continue;
        }
        let score = ScoreValue::new(engine.try_score(agent, item, now)?);
        if score.is_rejected() {
            continue;
        }
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((item.id, score));
        }
    }

    let (item, score) = best?;
    match current {
        Some(cur) if !cur.is_rejected() && score.value() < cur.value() + swap_margin => None,
        _ => Some((item, score)),
    }
}

// ---------------------------------------------------------------------------
// Tick Driver
// ---------------------------------------------------------------------------

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Host events applied successfully.
    pub events_applied: usize,
    /// Scheduler events dispatched.
    pub dispatched: usize,
    /// Agents evaluated.
    pub evaluated: usize,
    /// Gear swaps performed.
    pub swaps: usize,
}

/// Totals over the driver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Ticks stepped.
    pub ticks: u64,
    /// Host events applied.
    pub events_applied: u64,
    /// Host events that referenced unknown subjects.
    pub events_ignored: u64,
    /// Scheduler events dispatched.
    pub dispatched: u64,
    /// Ticks whose scheduler dispatch failed.
    pub scheduler_failures: u64,
    /// Ticks that did not advance past the previous one.
    pub out_of_order_ticks: u64,
    /// Agent evaluations.
    pub evaluations: u64,
    /// Gear swaps.
    pub swaps: u64,
}

impl DriverStats {
    fn absorb(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.events_applied += report.events_applied as u64;
        self.dispatched += report.dispatched as u64;
        self.evaluations += report.evaluated as u64;
        self.swaps += report.swaps as u64;
    }
}

/// Drives an [`Engine`] from the host's tick loop.
#[derive(Debug)]
pub struct TickDriver {
    engine: Engine,
    config: HostConfig,
    components: BTreeMap<AgentId, GearComponent>,
    pending: Vec<HostEvent>,
    last_tick: Option<Tick>,
    stats: DriverStats,
}

impl TickDriver {
    /// Build the engine from `config` over `catalog`.
    ///
    /// # Errors
    /// Returns an error if the engine configuration is invalid.
    pub fn new(config: HostConfig, catalog: ItemCatalog) -> Result<Self> {
        Self::with_engine(
            EngineBuilder::new(catalog).config(config.gearz.clone()).build()?,
            config,
        )
    }

    /// Drive an engine the caller built (custom capabilities).
    ///
    /// # Errors
    /// Returns an error if the host settings are invalid.
    pub fn with_engine(engine: Engine, config: HostConfig) -> Result<Self> {
        if config.evaluation_interval_ticks == 0 {
            return Err(gearz_core::GearzError::Config(
                "evaluation_interval_ticks must be > 0".into(),
            ));
        }
        info!(
            profile = ?config.profile,
            interval = config.evaluation_interval_ticks,
            per_tick = config.max_evaluations_per_tick,
            "Tick driver ready"
        );
        Ok(Self {
            engine,
            config,
            components: BTreeMap::new(),
            pending: Vec::new(),
            last_tick: None,
            stats: DriverStats::default(),
        })
    }

    /// Start tracking every agent already in `world`.
    pub fn track_agents(&mut self, world: &WorldSnapshot) {
        for id in world.agents.keys() {
            self.components.entry(*id).or_insert_with(GearComponent::new);
        }
    }

    /// Queue an event for the next [`TickDriver::step`].
    pub fn push_event(&mut self, event: HostEvent) {
        self.pending.push(event);
    }

    /// Run one tick.
    pub fn step(&mut self, world: &mut WorldSnapshot, tick: Tick) -> TickReport {
        let _span = tracing::debug_span!(spans::TICK, tick).entered();
        if let Some(last) = self.last_tick {
            if tick <= last {
                warn!(tick, last, "Tick did not advance");
                self.stats.out_of_order_ticks += 1;
            }
        }
        self.last_tick = Some(tick);

        let mut report = TickReport::default();
        for event in std::mem::take(&mut self.pending) {
            let label = event.label();
            if apply_event(&mut self.engine, world, &mut self.components, event, tick) {
                report.events_applied += 1;
            } else {
                warn!(event = label, tick, "Host event referenced an unknown agent or item");
                self.stats.events_ignored += 1;
            }
        }

        match run_scheduler(&mut self.engine, tick) {
            Some(dispatched) => report.dispatched = dispatched,
            None => self.stats.scheduler_failures += 1,
        }

        self.evaluate_due(world, tick, &mut report);
        self.stats.absorb(&report);
        report
    }

    fn evaluate_due(&mut self, world: &mut WorldSnapshot, tick: Tick, report: &mut TickReport) {
        let interval = self.config.evaluation_interval_ticks;
        let due: Vec<AgentId> = self
            .components
            .iter()
            .filter(|(_, c)| c.is_due(tick, interval))
            .map(|(id, _)| *id)
            .take(self.config.max_evaluations_per_tick)
            .collect();
        if due.is_empty() {
            return;
        }

        let _span = tracing::debug_span!(spans::SCORE_BATCH, tick, agents = due.len()).entered();
        for id in due {
            let Some(agent) = world.agent(id) else {
                self.components.remove(&id);
                continue;
            };
            let held = agent.held_item.and_then(|item| world.item(item));
            let choice = evaluate_agent(
                &mut self.engine,
                agent,
                held,
                world.loose_items(),
                tick,
                self.config.swap_margin,
            );
            report.evaluated += 1;

            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            component.last_evaluated = Some(tick);
            if let Some((item, score)) = choice {
                if world.equip(id, item) {
                    component.record_swap(item, score);
                    report.swaps += 1;
                    debug!(agent = %id, %item, score = score.value(), "Agent swapped gear");
                }
            }
        }
    }

    /// The driven engine.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access, e.g. to register collaborator handlers.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Host configuration.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Component of one agent.
    #[must_use]
    pub fn component(&self, agent: AgentId) -> Option<&GearComponent> {
        self.components.get(&agent)
    }

    /// Number of tracked agents.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.components.len()
    }

    /// Events waiting for the next step.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// Last tick stepped.
    #[must_use]
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    /// Lifetime totals.
    #[must_use]
    pub fn stats(&self) -> DriverStats {
        self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
