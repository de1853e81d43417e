//! Tick-indexed event scheduler.
//!
//! Events live in buckets keyed by the absolute tick they are due at, so
//! processing a tick touches only the events due on that tick:
//!
//! ```text
//!   buckets: { 1200 → [expiry(a7), expiry(a9)],  1310 → [custom(3, i42)] }
//!                 │
//!   process_tick(1200) ── remove bucket ── dispatch a7, a9 ── recycle Vec
//! ```
//!
//! Emptied bucket vectors go back to a pool and are reused by the next
//! `schedule` that needs a fresh bucket, so steady-state scheduling does not
//! allocate.
//!
//! Handlers receive a mutable context `C` (the engine passes its caches), so
//! expiry callbacks can mutate cache state without shared ownership.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::error::Result;
use crate::types::Tick;

/// Upper bound on recycled bucket vectors kept around.
const MAX_POOLED_BUCKETS: usize = 64;

/// What a scheduled event means. Handlers are registered per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A skill memo entry reached its TTL. `secondary` carries the tier.
    SkillCacheExpiry,
    /// Collaborator-defined event.
    Custom(u16),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkillCacheExpiry => write!(f, "SkillCacheExpiry"),
            Self::Custom(code) => write!(f, "Custom({code})"),
        }
    }
}

/// A pending notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Primary subject (usually an agent id).
    pub primary: u64,
    /// Secondary subject, 0 when unused.
    pub secondary: u64,
}

impl ScheduledEvent {
    fn matches(&self, kind: EventKind, primary: u64, secondary: u64) -> bool {
        self.kind == kind && self.primary == primary && self.secondary == secondary
    }
}

/// Callback invoked for each due event of a registered kind.
pub type EventHandler<C> = Box<dyn FnMut(&mut C, Tick, &ScheduledEvent) -> Result<()>>;

/// Bucket-per-tick scheduler.
///
/// The owning loop calls [`EventScheduler::process_tick`] once per distinct,
/// increasing tick. Nothing breaks if it does not: events for a tick that is
/// never processed simply stay pending, and processing a tick twice finds
/// the bucket already gone.
pub struct EventScheduler<C> {
    buckets: HashMap<Tick, Vec<ScheduledEvent>>,
    pool: Vec<Vec<ScheduledEvent>>,
    handlers: HashMap<EventKind, EventHandler<C>>,
    pending: usize,
}

impl<C> fmt::Debug for EventScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventScheduler")
            .field("buckets", &self.buckets.len())
            .field("pending", &self.pending)
            .field("pooled", &self.pool.len())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C> Default for EventScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventScheduler<C> {
    /// Create an empty scheduler with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            pool: Vec::new(),
            handlers: HashMap::new(),
            pending: 0,
        }
    }

    /// Register the handler for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: EventKind, handler: EventHandler<C>) {
        self.handlers.insert(kind, handler);
    }

    /// Remove the handler for `kind`; its events become no-ops.
    pub fn unregister(&mut self, kind: EventKind) {
        self.handlers.remove(&kind);
    }

    /// Queue an event for `tick`.
    ///
    /// Past ticks are accepted (they fire only if that tick is processed
    /// again) and duplicates are kept.
    pub fn schedule(&mut self, tick: Tick, kind: EventKind, primary: u64, secondary: u64) {
        let pool = &mut self.pool;
        self.buckets
            .entry(tick)
            .or_insert_with(|| pool.pop().unwrap_or_default())
            .push(ScheduledEvent { kind, primary, secondary });
        self.pending += 1;
    }

    /// Dispatch every event due at `tick` in insertion order.
    ///
    /// The bucket is detached before the first handler runs. If a handler
    /// fails, the remaining events of this bucket are dropped, the vector is
    /// still recycled, and the error is returned.
    ///
    /// # Errors
    /// Returns the first handler error.
    pub fn process_tick(&mut self, tick: Tick, ctx: &mut C) -> Result<usize> {
        let Some(mut bucket) = self.buckets.remove(&tick) else {
            return Ok(0);
        };
        self.pending -= bucket.len();

        let mut failure = None;
        let mut dispatched = 0;
        for event in &bucket {
            dispatched += 1;
            match self.handlers.get_mut(&event.kind) {
                Some(handler) => {
                    if let Err(e) = handler(ctx, tick, event) {
                        failure = Some(e);
                        break;
                    }
                }
                None => trace!(tick, kind = %event.kind, "No handler registered; event ignored"),
            }
        }

        bucket.clear();
        self.recycle(bucket);
        match failure {
            Some(e) => Err(e),
            None => Ok(dispatched),
        }
    }

    /// Remove every pending event matching `(kind, primary, secondary)`.
    ///
    /// Scans all buckets: O(total pending events). Meant for rare
    /// invalidation such as entity destruction, not the hot path.
    pub fn cancel(&mut self, kind: EventKind, primary: u64, secondary: u64) -> usize {
        self.remove_where(|e| e.matches(kind, primary, secondary))
    }

    /// Remove every pending event of `kind`. Same cost as [`Self::cancel`].
    pub fn cancel_kind(&mut self, kind: EventKind) -> usize {
        self.remove_where(|e| e.kind == kind)
    }

    /// Drop all pending events. Handlers stay registered.
    pub fn reset(&mut self) {
        let drained: Vec<_> = self.buckets.drain().map(|(_, bucket)| bucket).collect();
        for mut bucket in drained {
            bucket.clear();
            self.recycle(bucket);
        }
        self.pending = 0;
    }

    /// Total number of pending events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Number of events pending for `tick`.
    #[must_use]
    pub fn pending_at(&self, tick: Tick) -> usize {
        self.buckets.get(&tick).map_or(0, Vec::len)
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&ScheduledEvent) -> bool) -> usize {
        let mut removed = 0;
        let mut emptied = Vec::new();
        for (tick, bucket) in &mut self.buckets {
            let before = bucket.len();
            bucket.retain(|e| !predicate(e));
            removed += before - bucket.len();
            if bucket.is_empty() {
                emptied.push(*tick);
            }
        }
        for tick in emptied {
            if let Some(bucket) = self.buckets.remove(&tick) {
                self.recycle(bucket);
            }
        }
        self.pending -= removed;
        removed
    }

    fn recycle(&mut self, bucket: Vec<ScheduledEvent>) {
        if self.pool.len() < MAX_POOLED_BUCKETS {
            self.pool.push(bucket);
        }
    }
}
