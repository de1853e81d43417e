//! Two-tier per-agent skill memo.
//!
//! ```text
//! skills(agent)
//!   ├─ value tier hit (TTL v)        → cached (ranged, melee) levels
//!   ├─ index tier hit (TTL 4v)       → read agent.skills[i], agent.skills[j]   O(1)
//!   └─ full scan                     → record levels + positions               O(k)
//! ```
//!
//! Every insertion schedules a `SkillCacheExpiry` event at its expiry tick;
//! the engine routes the event back to [`AgentSkillMemo::expire`]. An event
//! for an entry that was recomputed in the meantime, or for an agent that is
//! gone, finds nothing to remove. A size-triggered cleanup keeps each tier
//! bounded even if expiry events are lost.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SkillMemoConfig;
use crate::error::{GearzError, Result};
use crate::memo::{retain_most_recent, MemoEntry};
use crate::scheduler::{EventKind, EventScheduler};
use crate::types::{Agent, AgentId, ItemCategory, SkillKind, Tick};

/// The two tracked skill levels of an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillPair {
    /// Level of the ranged-tracked skill (primary).
    pub ranged: i32,
    /// Level of the melee-tracked skill (secondary).
    pub melee: i32,
}

impl SkillPair {
    /// Absolute level difference, capped at `cap`.
    #[must_use]
    pub fn gap(self, cap: u32) -> u32 {
        self.ranged.abs_diff(self.melee).min(cap)
    }

    /// Category of the stronger skill; `None` on a tie.
    #[must_use]
    pub fn stronger(self) -> Option<ItemCategory> {
        match self.ranged.cmp(&self.melee) {
            std::cmp::Ordering::Greater => Some(ItemCategory::Ranged),
            std::cmp::Ordering::Less => Some(ItemCategory::Melee),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Positions of the tracked skills inside an agent's skill list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SkillSlots {
    ranged: usize,
    melee: usize,
}

/// Which tier an expiry event refers to. Encoded in the event's secondary id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillTier {
    /// Cached levels.
    Value,
    /// Cached list positions.
    Index,
}

impl SkillTier {
    /// Secondary id used in scheduled events.
    #[must_use]
    pub fn code(self) -> u64 {
        match self {
            Self::Value => 0,
            Self::Index => 1,
        }
    }

    /// Inverse of [`SkillTier::code`].
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Value),
            1 => Some(Self::Index),
            _ => None,
        }
    }
}

/// Per-tier lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkillMemoStats {
    /// Served from the value tier.
    pub value_hits: u64,
    /// Served through the index tier.
    pub index_hits: u64,
    /// Needed a linear scan.
    pub full_scans: u64,
    /// Entries removed by expiry events.
    pub expirations: u64,
    /// Entries removed by the size safety valve.
    pub cleanup_evictions: u64,
}

/// Persistable TTL origins of both tiers. Values themselves are never
/// persisted; they are re-derived from live agents on rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTimestamps {
    /// Tick the snapshot was taken at.
    pub saved_at: Tick,
    /// `(agent, stamped_at)` for the value tier, sorted by agent.
    pub value: Vec<(AgentId, Tick)>,
    /// `(agent, stamped_at)` for the index tier, sorted by agent.
    pub index: Vec<(AgentId, Tick)>,
}

impl CacheTimestamps {
    /// Encode as JSON.
    ///
    /// # Errors
    /// Returns `GearzError::Serialization` on encoder failure.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GearzError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    ///
    /// # Errors
    /// Returns `GearzError::Serialization` on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GearzError::Serialization(e.to_string()))
    }

    /// Encode as compact binary.
    ///
    /// # Errors
    /// Returns `GearzError::Serialization` on encoder failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GearzError::Serialization(e.to_string()))
    }

    /// Decode from compact binary.
    ///
    /// # Errors
    /// Returns `GearzError::Serialization` on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| GearzError::Serialization(e.to_string()))
    }
}

/// Two-tier skill memo. See the module docs.
#[derive(Debug)]
pub struct AgentSkillMemo {
    values: HashMap<AgentId, MemoEntry<SkillPair>>,
    slots: HashMap<AgentId, MemoEntry<SkillSlots>>,
    config: SkillMemoConfig,
    stats: SkillMemoStats,
}

impl AgentSkillMemo {
    /// Create an empty memo.
    #[must_use]
    pub fn new(config: SkillMemoConfig) -> Self {
        Self {
            values: HashMap::new(),
            slots: HashMap::new(),
            config,
            stats: SkillMemoStats::default(),
        }
    }

    fn ttl(&self, tier: SkillTier) -> u64 {
        match tier {
            SkillTier::Value => self.config.value_ttl_ticks,
            SkillTier::Index => self.config.index_ttl_ticks,
        }
    }

    /// Tracked skill levels of `agent`, memoized.
    ///
    /// A skill the agent does not have counts as level 0.
    pub fn skills<C>(
        &mut self,
        agent: &Agent,
        now: Tick,
        scheduler: &mut EventScheduler<C>,
    ) -> SkillPair {
        let value_ttl = self.config.value_ttl_ticks;
        if let Some(entry) = self.values.get_mut(&agent.id) {
            if entry.is_fresh(now, value_ttl) {
                entry.touch(now);
                self.stats.value_hits += 1;
                return entry.value;
            }
            self.values.remove(&agent.id);
        }

        if let Some(pair) = self.read_through_index(agent, now) {
            self.stats.index_hits += 1;
            self.insert_value(agent.id, pair, now, now, scheduler);
            return pair;
        }

        self.stats.full_scans += 1;
        let (pair, slots) = self.scan(agent);
        self.insert_value(agent.id, pair, now, now, scheduler);
        match slots {
            Some(slots) => self.insert_slots(agent.id, slots, now, now, scheduler),
            None => {
                self.slots.remove(&agent.id);
            }
        }
        pair
    }

    fn read_through_index(&mut self, agent: &Agent, now: Tick) -> Option<SkillPair> {
        let index_ttl = self.config.index_ttl_ticks;
        let (ranged_kind, melee_kind) = (self.config.ranged_skill, self.config.melee_skill);
        let entry = self.slots.get_mut(&agent.id)?;
        if !entry.is_fresh(now, index_ttl) {
            self.slots.remove(&agent.id);
            return None;
        }
        let level_at = |pos: usize, kind: SkillKind| {
            agent.skills.get(pos).filter(|s| s.kind == kind).map(|s| s.level)
        };
        let pair = SkillPair {
            ranged: level_at(entry.value.ranged, ranged_kind)?,
            melee: level_at(entry.value.melee, melee_kind)?,
        };
        entry.touch(now);
        Some(pair)
    }

    /// Linear scan. Positions are only returned when both skills exist, so
    /// an agent that lacks one never gets an index that could go stale.
    fn scan(&self, agent: &Agent) -> (SkillPair, Option<SkillSlots>) {
        let mut ranged = None;
        let mut melee = None;
        for (pos, skill) in agent.skills.iter().enumerate() {
            if ranged.is_none() && skill.kind == self.config.ranged_skill {
                ranged = Some((pos, skill.level));
            } else if melee.is_none() && skill.kind == self.config.melee_skill {
                melee = Some((pos, skill.level));
            }
        }
        let pair = SkillPair {
            ranged: ranged.map_or(0, |(_, level)| level),
            melee: melee.map_or(0, |(_, level)| level),
        };
        let slots = ranged
            .zip(melee)
            .map(|((r, _), (m, _))| SkillSlots { ranged: r, melee: m });
        (pair, slots)
    }

    fn insert_value<C>(
        &mut self,
        agent: AgentId,
        pair: SkillPair,
        stamped_at: Tick,
        now: Tick,
        scheduler: &mut EventScheduler<C>,
    ) {
        let mut entry = MemoEntry::new(pair, stamped_at);
        entry.touch(now);
        let due = entry.expires_at(self.config.value_ttl_ticks);
        self.values.insert(agent, entry);
        scheduler.schedule(due, EventKind::SkillCacheExpiry, agent.0, SkillTier::Value.code());
        if self.values.len() > self.config.cleanup_threshold {
            let removed =
                retain_most_recent(&mut self.values, self.config.retain_after_cleanup, Some(agent));
            self.stats.cleanup_evictions += removed as u64;
            debug!(removed, tier = "value", "Skill memo safety cleanup");
        }
    }

    fn insert_slots<C>(
        &mut self,
        agent: AgentId,
        slots: SkillSlots,
        stamped_at: Tick,
        now: Tick,
        scheduler: &mut EventScheduler<C>,
    ) {
        let mut entry = MemoEntry::new(slots, stamped_at);
        entry.touch(now);
        let due = entry.expires_at(self.config.index_ttl_ticks);
        self.slots.insert(agent, entry);
        scheduler.schedule(due, EventKind::SkillCacheExpiry, agent.0, SkillTier::Index.code());
        if self.slots.len() > self.config.cleanup_threshold {
            let removed =
                retain_most_recent(&mut self.slots, self.config.retain_after_cleanup, Some(agent));
            self.stats.cleanup_evictions += removed as u64;
            debug!(removed, tier = "index", "Skill memo safety cleanup");
        }
    }

    /// Expiry callback: remove the entry if it has really expired by `tick`.
    ///
    /// Returns whether something was removed. Entries recomputed since the
    /// event was scheduled, and agents no longer cached, are left alone.
    pub fn expire(&mut self, agent: AgentId, tier: SkillTier, tick: Tick) -> bool {
        let ttl = self.ttl(tier);
        let removed = match tier {
            SkillTier::Value => remove_if_stale(&mut self.values, agent, tick, ttl),
            SkillTier::Index => remove_if_stale(&mut self.slots, agent, tick, ttl),
        };
        if removed {
            self.stats.expirations += 1;
        } else {
            trace!(%agent, ?tier, tick, "Stale skill expiry ignored");
        }
        removed
    }

    /// Drop both tiers for one agent (entity destruction).
    pub fn forget_agent(&mut self, agent: AgentId) {
        self.values.remove(&agent);
        self.slots.remove(&agent);
    }

    /// Drop everything (new simulation run).
    pub fn reset_all(&mut self) {
        self.values.clear();
        self.slots.clear();
    }

    /// TTL origins of every entry, for persisting alongside a save.
    #[must_use]
    pub fn timestamps(&self, now: Tick) -> CacheTimestamps {
        fn collect<V>(map: &HashMap<AgentId, MemoEntry<V>>) -> Vec<(AgentId, Tick)> {
            let mut out: Vec<_> = map.iter().map(|(id, e)| (*id, e.stamped_at)).collect();
            out.sort_unstable();
            out
        }
        CacheTimestamps {
            saved_at: now,
            value: collect(&self.values),
            index: collect(&self.slots),
        }
    }

    /// Rebuild expiry buckets after a reload.
    ///
    /// All pending `SkillCacheExpiry` events are cancelled. Surviving
    /// entries (still fresh at `now`, agent still live) are kept; entries
    /// from `restored` are re-derived from the live agent with their
    /// persisted TTL origin. Everything else is discarded. Each surviving
    /// entry gets exactly one expiry event. Returns the number scheduled.
    pub fn rebuild_schedule<'a, C>(
        &mut self,
        now: Tick,
        restored: Option<&CacheTimestamps>,
        live_agents: impl IntoIterator<Item = &'a Agent>,
        scheduler: &mut EventScheduler<C>,
    ) -> usize {
        scheduler.cancel_kind(EventKind::SkillCacheExpiry);
        let live: HashMap<AgentId, &Agent> = live_agents.into_iter().map(|a| (a.id, a)).collect();
        let (value_ttl, index_ttl) = (self.config.value_ttl_ticks, self.config.index_ttl_ticks);

        self.values
            .retain(|id, e| live.contains_key(id) && e.is_fresh(now, value_ttl));
        self.slots
            .retain(|id, e| live.contains_key(id) && e.is_fresh(now, index_ttl));

        if let Some(snapshot) = restored {
            for &(id, stamped_at) in &snapshot.value {
                let Some(agent) = live.get(&id) else { continue };
                if self.values.contains_key(&id) || now.saturating_sub(stamped_at) >= value_ttl {
                    continue;
                }
                let (pair, _) = self.scan(agent);
                let mut entry = MemoEntry::new(pair, stamped_at);
                entry.touch(now);
                self.values.insert(id, entry);
            }
            for &(id, stamped_at) in &snapshot.index {
                let Some(agent) = live.get(&id) else { continue };
                if self.slots.contains_key(&id) || now.saturating_sub(stamped_at) >= index_ttl {
                    continue;
                }
                if let (_, Some(slots)) = self.scan(agent) {
                    let mut entry = MemoEntry::new(slots, stamped_at);
                    entry.touch(now);
                    self.slots.insert(id, entry);
                }
            }
        }

        for (id, entry) in &self.values {
            scheduler.schedule(entry.expires_at(value_ttl), EventKind::SkillCacheExpiry, id.0, SkillTier::Value.code());
        }
        for (id, entry) in &self.slots {
            scheduler.schedule(entry.expires_at(index_ttl), EventKind::SkillCacheExpiry, id.0, SkillTier::Index.code());
        }
        let scheduled = self.values.len() + self.slots.len();
        debug!(scheduled, now, "Skill memo expiry schedule rebuilt");
        scheduled
    }

    /// Cached levels for `agent` without touching recency or TTL.
    #[must_use]
    pub fn peek(&self, agent: AgentId) -> Option<SkillPair> {
        self.values.get(&agent).map(|e| e.value)
    }

    /// Whether the index tier holds positions for `agent`.
    #[must_use]
    pub fn has_index(&self, agent: AgentId) -> bool {
        self.slots.contains_key(&agent)
    }

    /// Entries in the value tier.
    #[must_use]
    pub fn value_len(&self) -> usize {
        self.values.len()
    }

    /// Entries in the index tier.
    #[must_use]
    pub fn index_len(&self) -> usize {
        self.slots.len()
    }

    /// Lookup counters since creation.
    #[must_use]
    pub fn stats(&self) -> SkillMemoStats {
        self.stats
    }
}

fn remove_if_stale<V>(map: &mut HashMap<AgentId, MemoEntry<V>>, agent: AgentId, tick: Tick, ttl: u64) -> bool {
    match map.get(&agent) {
        Some(entry) if !entry.is_fresh(tick, ttl) => {
            map.remove(&agent);
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkillEntry;

    /// Scheduler context that routes expiry events back into the memo.
    fn scheduler() -> EventScheduler<AgentSkillMemo> {
        let mut scheduler = EventScheduler::new();
        scheduler.register(
            EventKind::SkillCacheExpiry,
            Box::new(|memo: &mut AgentSkillMemo, tick: Tick, event: &crate::scheduler::ScheduledEvent| {
                if let Some(tier) = SkillTier::from_code(event.secondary) {
                    memo.expire(AgentId(event.primary), tier, tick);
                }
                Ok(())
            }),
        );
        scheduler
    }

    fn shooter(id: u64) -> Agent {
        Agent::new(AgentId(id))
            .with_skill(SkillKind::Medicine, 4)
            .with_skill(SkillKind::Shooting, 10)
            .with_skill(SkillKind::Melee, 2)
    }

    fn memo() -> AgentSkillMemo {
        AgentSkillMemo::new(SkillMemoConfig::default())
    }

    fn run_ticks(sched: &mut EventScheduler<AgentSkillMemo>, memo: &mut AgentSkillMemo, range: std::ops::RangeInclusive<Tick>) {
        for tick in range {
            sched.process_tick(tick, memo).expect("expiry handler never fails");
        }
    }

    #[test]
    fn first_lookup_scans_then_hits() {
        let mut sched = scheduler();
        let mut memo = memo();
        let agent = shooter(1);

        let pair = memo.skills(&agent, 0, &mut sched);
        assert_eq!(pair, SkillPair { ranged: 10, melee: 2 });
        memo.skills(&agent, 5, &mut sched);

        let stats = memo.stats();
        assert_eq!(stats.full_scans, 1);
        assert_eq!(stats.value_hits, 1);
        assert!(memo.has_index(agent.id));
        assert_eq!(sched.pending(), 2);
    }

    #[test]
    fn missing_skill_reads_as_zero_without_index() {
        let mut sched = scheduler();
        let mut memo = memo();
        let agent = Agent::new(AgentId(3)).with_skill(SkillKind::Melee, 7);
        assert_eq!(memo.skills(&agent, 0, &mut sched), SkillPair { ranged: 0, melee: 7 });
        assert!(!memo.has_index(agent.id));
    }

    #[test]
    fn value_tier_expires_via_scheduler() {
        let mut sched = scheduler();
        let mut memo = memo();
        let agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);

        run_ticks(&mut sched, &mut memo, 1..=999);
        assert!(memo.peek(agent.id).is_some());
        run_ticks(&mut sched, &mut memo, 1000..=1000);
        assert!(memo.peek(agent.id).is_none());
        assert!(memo.has_index(agent.id));
        assert_eq!(memo.stats().expirations, 1);
    }

    #[test]
    fn index_tier_serves_after_value_expiry() {
        let mut sched = scheduler();
        let mut memo = memo();
        let mut agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);
        run_ticks(&mut sched, &mut memo, 1..=1000);

        agent.skills[1].level = 12;
        let pair = memo.skills(&agent, 1001, &mut sched);
        assert_eq!(pair.ranged, 12);
        assert_eq!(memo.stats().index_hits, 1);
        assert_eq!(memo.stats().full_scans, 1);
    }

    #[test]
    fn reordered_skill_list_forces_rescan() {
        let mut sched = scheduler();
        let mut memo = memo();
        let mut agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);
        run_ticks(&mut sched, &mut memo, 1..=1000);

        agent.skills.swap(1, 2);
        let pair = memo.skills(&agent, 1001, &mut sched);
        assert_eq!(pair, SkillPair { ranged: 10, melee: 2 });
        assert_eq!(memo.stats().index_hits, 0);
        assert_eq!(memo.stats().full_scans, 2);
    }

    #[test]
    fn index_tier_expires_at_four_times_value_ttl() {
        let mut sched = scheduler();
        let mut memo = memo();
        let agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);
        run_ticks(&mut sched, &mut memo, 1..=3999);
        assert!(memo.has_index(agent.id));
        run_ticks(&mut sched, &mut memo, 4000..=4000);
        assert!(!memo.has_index(agent.id));
    }

    #[test]
    fn stale_entry_is_not_served_when_expiry_was_missed() {
        let mut sched = scheduler();
        let mut memo = memo();
        let mut agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);
        agent.skills[1].level = 15;
        // No ticks processed: the lookup itself must notice the TTL.
        let pair = memo.skills(&agent, 1500, &mut sched);
        assert_eq!(pair.ranged, 15);
    }

    #[test]
    fn expiry_for_recomputed_entry_is_noop() {
        let mut sched = scheduler();
        let mut memo = memo();
        let agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);
        // Recomputed at 1200 (old value stale) before tick 1000 was processed.
        memo.skills(&agent, 1200, &mut sched);
        assert!(!memo.expire(agent.id, SkillTier::Value, 1000));
        assert!(memo.peek(agent.id).is_some());
    }

    #[test]
    fn expiry_for_unknown_agent_is_noop() {
        let mut memo = memo();
        assert!(!memo.expire(AgentId(404), SkillTier::Value, 10));
        assert!(!memo.expire(AgentId(404), SkillTier::Index, 10));
    }

    #[test]
    fn safety_cleanup_bounds_tiers() {
        let mut sched = scheduler();
        let mut memo = memo();
        for id in 0..200 {
            memo.skills(&shooter(id), id, &mut sched);
            assert!(memo.value_len() <= 150);
            assert!(memo.index_len() <= 150);
        }
        // The most recent agent always survives the cleanup.
        assert!(memo.peek(AgentId(199)).is_some());
        assert!(memo.stats().cleanup_evictions > 0);
    }

    #[test]
    fn same_tick_cleanup_keeps_the_new_entry() {
        let mut sched = scheduler();
        let mut memo = AgentSkillMemo::new(SkillMemoConfig {
            cleanup_threshold: 4,
            retain_after_cleanup: 2,
            ..SkillMemoConfig::default()
        });
        // Lowest id last: it ties with every other entry and sorts first.
        for id in (1..=5).rev() {
            memo.skills(&shooter(id), 7, &mut sched);
        }
        assert!(memo.peek(AgentId(1)).is_some());
        assert!(memo.has_index(AgentId(1)));
        assert_eq!(memo.value_len(), 2);

        let scans = memo.stats().full_scans;
        let pending = sched.pending();
        memo.skills(&shooter(1), 7, &mut sched);
        assert_eq!(memo.stats().full_scans, scans);
        assert_eq!(sched.pending(), pending);
    }

    #[test]
    fn timestamps_round_trip_json_and_binary() {
        let mut sched = scheduler();
        let mut memo = memo();
        memo.skills(&shooter(2), 10, &mut sched);
        memo.skills(&shooter(1), 20, &mut sched);
        let ts = memo.timestamps(30);
        assert_eq!(ts.value, vec![(AgentId(1), 20), (AgentId(2), 10)]);

        let json = ts.to_json().expect("json");
        assert_eq!(CacheTimestamps::from_json(&json).expect("json back"), ts);
        let bytes = ts.to_bytes().expect("bytes");
        assert_eq!(CacheTimestamps::from_bytes(&bytes).expect("bytes back"), ts);
        assert!(CacheTimestamps::from_json("{not json").is_err());
    }

    #[test]
    fn rebuild_restores_live_fresh_entries_only() {
        let mut sched = scheduler();
        let mut old = memo();
        let agents = [shooter(1), shooter(2), shooter(3)];
        old.skills(&agents[0], 100, &mut sched);
        old.skills(&agents[1], 900, &mut sched);
        old.skills(&agents[2], 900, &mut sched);
        let saved = old.timestamps(950);

        // Fresh process after a reload: empty memo, empty schedule.
        let mut sched = scheduler();
        let mut memo = memo();
        let live = [agents[0].clone(), agents[1].clone()];
        let scheduled = memo.rebuild_schedule(1200, Some(&saved), &live, &mut sched);

        // Agent 1's value expired at 1100; agent 3 is gone.
        assert!(memo.peek(AgentId(1)).is_none());
        assert_eq!(memo.peek(AgentId(2)), Some(SkillPair { ranged: 10, melee: 2 }));
        assert!(memo.peek(AgentId(3)).is_none());
        assert!(memo.has_index(AgentId(1)));
        assert_eq!(scheduled, 3);
        assert_eq!(sched.pending(), 3);
        assert_eq!(sched.pending_at(1900), 1);

        run_ticks(&mut sched, &mut memo, 1201..=1900);
        assert!(memo.peek(AgentId(2)).is_none());
    }

    #[test]
    fn rebuild_replaces_existing_schedule() {
        let mut sched = scheduler();
        let mut memo = memo();
        let agent = shooter(1);
        memo.skills(&agent, 0, &mut sched);
        memo.skills(&agent, 500, &mut sched);
        sched.schedule(777, EventKind::Custom(1), 1, 0);

        memo.rebuild_schedule(600, None, [&agent], &mut sched);
        assert_eq!(sched.pending(), 3);
        assert_eq!(sched.pending_at(777), 1);
    }

    #[test]
    fn skill_entry_order_does_not_change_levels() {
        let mut sched = scheduler();
        let mut memo = memo();
        let mut agent = Agent::new(AgentId(9));
        agent.skills = vec![SkillEntry::new(SkillKind::Melee, 6), SkillEntry::new(SkillKind::Shooting, 3)];
        assert_eq!(memo.skills(&agent, 0, &mut sched), SkillPair { ranged: 3, melee: 6 });
    }

    #[test]
    fn pair_gap_and_stronger() {
        let pair = SkillPair { ranged: 30, melee: 2 };
        assert_eq!(pair.gap(20), 20);
        assert_eq!(pair.stronger(), Some(ItemCategory::Ranged));
        assert_eq!(SkillPair { ranged: 4, melee: 4 }.stronger(), None);
    }
}
