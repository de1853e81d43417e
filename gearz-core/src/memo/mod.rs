//! Memoization caches for the scoring engine.
//!
//! Both caches store [`MemoEntry`] values: the memoized value plus two tick
//! stamps. `stamped_at` is when the value was computed (TTL origin);
//! `last_access` is the recency hint used by batched eviction and the size
//! safety valve. A hit updates only `last_access`.

pub mod property;
pub mod skill;

pub use property::{CompositeCacheKey, ItemProperties, PropertyMemo};
pub use skill::{AgentSkillMemo, CacheTimestamps, SkillPair, SkillTier};

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::Tick;

/// A memoized value with a recency hint.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoEntry<V> {
    /// The cached value.
    pub value: V,
    /// Tick the value was computed at.
    pub stamped_at: Tick,
    /// Tick of the most recent hit (or insertion).
    pub last_access: Tick,
}

impl<V> MemoEntry<V> {
    /// A freshly computed entry.
    #[must_use]
    pub fn new(value: V, now: Tick) -> Self {
        Self {
            value,
            stamped_at: now,
            last_access: now,
        }
    }

    /// Whether the value is still within `ttl` ticks of being computed.
    ///
    /// A `now` earlier than `stamped_at` (out-of-order ticks) counts as fresh.
    #[must_use]
    pub fn is_fresh(&self, now: Tick, ttl: u64) -> bool {
        now.saturating_sub(self.stamped_at) < ttl
    }

    /// Tick at which this entry stops being fresh.
    #[must_use]
    pub fn expires_at(&self, ttl: u64) -> Tick {
        self.stamped_at.saturating_add(ttl)
    }

    /// Record a hit.
    pub fn touch(&mut self, now: Tick) {
        self.last_access = self.last_access.max(now);
    }
}

/// Keys of `entries` ordered coldest first (oldest `last_access`).
///
/// Ties break on key order so eviction is deterministic across runs.
pub(crate) fn keys_by_recency<K, V>(entries: &HashMap<K, MemoEntry<V>>) -> Vec<K>
where
    K: Copy + Eq + Hash + Ord,
{
    let mut stamped: Vec<(Tick, K)> = entries
        .iter()
        .map(|(key, entry)| (entry.last_access, *key))
        .collect();
    stamped.sort_unstable();
    stamped.into_iter().map(|(_, key)| key).collect()
}

/// Keep only the `keep` most recently accessed entries. Returns how many
/// were removed.
///
/// `protect` always survives, even when it ties with older keys on
/// `last_access`.
pub(crate) fn retain_most_recent<K, V>(
    entries: &mut HashMap<K, MemoEntry<V>>,
    keep: usize,
    protect: Option<K>,
) -> usize
where
    K: Copy + Eq + Hash + Ord,
{
    if entries.len() <= keep {
        return 0;
    }
    let excess = entries.len() - keep;
    let victims: Vec<K> = keys_by_recency(entries)
        .into_iter()
        .filter(|key| Some(*key) != protect)
        .take(excess)
        .collect();
    for key in &victims {
        entries.remove(key);
    }
    victims.len()
}
