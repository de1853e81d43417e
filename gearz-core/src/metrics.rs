//! Runtime counters and span names.
//!
//! The engine itself is single-threaded; the counters are atomics so a
//! diagnostic reader holding the `Arc` from [`crate::Engine::counters`] can
//! snapshot them from another thread without coordinating with the tick loop.

use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// Engine Counters (lock-free)
// ---------------------------------------------------------------------------

/// Atomic counters for hot-path events.
pub struct EngineCounters {
    /// Scores computed (every `score` call, including sentinel results).
    pub scores_computed: AtomicU64,
    /// Scores that ended in `SENTINEL_REJECT`.
    pub rejections: AtomicU64,
    /// Scores that ended in `SENTINEL_KEEP`.
    pub keeps: AtomicU64,
    /// `try_score` calls skipped by the eligibility capability.
    pub ineligible: AtomicU64,
    /// Scheduled events dispatched by `process_tick`.
    pub events_dispatched: AtomicU64,
    /// `process_tick` calls that returned a handler error.
    pub handler_failures: AtomicU64,
    /// Full cache clears (preference change, catalog swap, explicit clear).
    pub cache_clears: AtomicU64,
}

impl EngineCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scores_computed: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            keeps: AtomicU64::new(0),
            ineligible: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
            handler_failures: AtomicU64::new(0),
            cache_clears: AtomicU64::new(0),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            scores_computed: self.scores_computed.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            keeps: self.keeps.load(Ordering::Relaxed),
            ineligible: self.ineligible.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            cache_clears: self.cache_clears.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.snapshot().fmt(f)
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Scores computed.
    pub scores_computed: u64,
    /// Rejections.
    pub rejections: u64,
    /// Hard keeps.
    pub keeps: u64,
    /// Ineligible `try_score` calls.
    pub ineligible: u64,
    /// Dispatched events.
    pub events_dispatched: u64,
    /// Failed `process_tick` calls.
    pub handler_failures: u64,
    /// Full cache clears.
    pub cache_clears: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP gearz_scores_computed_total Scores computed\n\
             # TYPE gearz_scores_computed_total counter\n\
             gearz_scores_computed_total {}\n\
             # HELP gearz_score_sentinels_total Scores ending in a sentinel\n\
             # TYPE gearz_score_sentinels_total counter\n\
             gearz_score_sentinels_total{{kind=\"reject\"}} {}\n\
             gearz_score_sentinels_total{{kind=\"keep\"}} {}\n\
             # HELP gearz_ineligible_total Scoring attempts skipped as ineligible\n\
             # TYPE gearz_ineligible_total counter\n\
             gearz_ineligible_total {}\n\
             # HELP gearz_events_dispatched_total Scheduled events dispatched\n\
             # TYPE gearz_events_dispatched_total counter\n\
             gearz_events_dispatched_total {}\n\
             # HELP gearz_handler_failures_total Ticks whose dispatch hit a handler error\n\
             # TYPE gearz_handler_failures_total counter\n\
             gearz_handler_failures_total {}\n\
             # HELP gearz_cache_clears_total Full cache clears\n\
             # TYPE gearz_cache_clears_total counter\n\
             gearz_cache_clears_total {}\n",
            self.scores_computed,
            self.rejections,
            self.keeps,
            self.ineligible,
            self.events_dispatched,
            self.handler_failures,
            self.cache_clears,
        )
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// Host per-tick span.
    pub const TICK: &str = "gearz::tick";
    /// Scheduler dispatch for one tick.
    pub const PROCESS_TICK: &str = "gearz::scheduler::process_tick";
    /// Batch of scores for one agent.
    pub const SCORE_BATCH: &str = "gearz::score::batch";
    /// Expiry schedule rebuild after a reload.
    pub const REBUILD_SCHEDULE: &str = "gearz::memo::rebuild";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
