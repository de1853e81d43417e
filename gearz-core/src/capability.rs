//! Optional collaborator capabilities.
//!
//! Hosts inject these once through [`crate::EngineBuilder`]. The engine never
//! probes for them per call: a missing capability is simply the default
//! implementation below.

use crate::types::{Agent, CandidateItem, Tick};

/// Gate deciding whether scoring should be attempted for an agent at all.
pub trait Eligibility {
    /// Whether `agent` may consider new equipment at `now`.
    fn is_eligible(&self, agent: &Agent, now: Tick) -> bool;
}

/// External ammunition / resource availability affecting usability.
pub trait AmmoModifier {
    /// Multiplier for the final score, or `None` when the collaborator has
    /// nothing to say about this item.
    fn modifier(&self, agent: &Agent, item: &CandidateItem) -> Option<f32>;
}

/// Every agent is eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEligible;

impl Eligibility for AlwaysEligible {
    fn is_eligible(&self, _agent: &Agent, _now: Tick) -> bool {
        true
    }
}

/// No ammo system installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAmmoModifier;

impl AmmoModifier for NoAmmoModifier {
    fn modifier(&self, _agent: &Agent, _item: &CandidateItem) -> Option<f32> {
        None
    }
}

/// Eligibility from a plain predicate.
pub struct EligibleWhen<F>(pub F);

impl<F> Eligibility for EligibleWhen<F>
where
    F: Fn(&Agent, Tick) -> bool,
{
    fn is_eligible(&self, agent: &Agent, now: Tick) -> bool {
        (self.0)(agent, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentId, DefinitionId, ItemId};

    #[test]
    fn defaults_are_permissive_and_silent() {
        let agent = Agent::new(AgentId(1));
        let item = CandidateItem::new(ItemId(1), DefinitionId(1));
        assert!(AlwaysEligible.is_eligible(&agent, 0));
        assert_eq!(NoAmmoModifier.modifier(&agent, &item), None);
    }

    #[test]
    fn closures_act_as_eligibility() {
        let only_even = EligibleWhen(|agent: &Agent, _now: Tick| agent.id.0 % 2 == 0);
        assert!(only_even.is_eligible(&Agent::new(AgentId(2)), 0));
        assert!(!only_even.is_eligible(&Agent::new(AgentId(3)), 0));
    }
}
