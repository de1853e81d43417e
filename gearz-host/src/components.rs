//! Per-agent state the host keeps next to each agent.
//!
//! In an ECS integration this would be a component on the agent entity.

use gearz_core::{ItemId, ScoreValue, Tick};

/// Gear-evaluation bookkeeping for one agent.
#[derive(Debug, Clone, Default)]
pub struct GearComponent {
    /// Whether the agent takes part in gear evaluation at all.
    pub active: bool,
    /// Tick of the last evaluation.
    pub last_evaluated: Option<Tick>,
    /// Item picked at the last swap and the score it had then.
    pub last_choice: Option<(ItemId, ScoreValue)>,
    /// Number of swaps performed.
    pub swaps: u32,
}

impl GearComponent {
    /// Active component, never evaluated.
    #[must_use]
    pub fn new() -> Self {
        Self { active: true, ..Self::default() }
    }

    /// Whether the agent should be evaluated at `now`.
    ///
    /// Ticks that go backwards (host time reset) count as due.
    #[must_use]
    pub fn is_due(&self, now: Tick, interval: u64) -> bool {
        if !self.active {
            return false;
        }
        match self.last_evaluated {
            None => true,
            Some(last) => now < last || now - last >= interval,
        }
    }

    /// Record a swap to `item`.
    pub fn record_swap(&mut self, item: ItemId, score: ScoreValue) {
        self.last_choice = Some((item, score));
        self.swaps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_after_interval() {
        let mut component = GearComponent::new();
        assert!(component.is_due(0, 100));
        component.last_evaluated = Some(50);
        assert!(!component.is_due(149, 100));
        assert!(component.is_due(150, 100));
        assert!(component.is_due(10, 100));
    }

    #[test]
    fn inactive_is_never_due() {
        let component = GearComponent::default();
        assert!(!component.is_due(1_000, 1));
    }
}
