//! Host events that affect GEARZ caches.
//!
//! These are applied by [`crate::systems::TickDriver`] before the tick's
//! scheduler dispatch.

use gearz_core::memo::CacheTimestamps;
use gearz_core::{Agent, AgentId, ItemCatalog, ItemId, SkillKind};

/// Something happened in the host world.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A new agent joined the simulation.
    AgentSpawned {
        /// The agent.
        agent: Agent,
    },

    /// An agent left the simulation (death, despawn, map unload).
    AgentDestroyed {
        /// Who left.
        agent: AgentId,
    },

    /// An agent's skill level changed.
    SkillChanged {
        /// Whose skill.
        agent: AgentId,
        /// Which skill.
        kind: SkillKind,
        /// New level.
        level: i32,
    },

    /// An agent picked up an item.
    ItemEquipped {
        /// Who picked it up.
        agent: AgentId,
        /// What.
        item: ItemId,
    },

    /// Definitions were reloaded (mod list change).
    CatalogReplaced {
        /// New catalog.
        catalog: ItemCatalog,
    },

    /// The player moved the ranged/melee preference slider.
    PreferenceChanged {
        /// New preference in [−1, 1].
        preference: f32,
    },

    /// A saved game finished loading.
    GameLoaded {
        /// Persisted cache timestamps, if the save had any.
        timestamps: Option<CacheTimestamps>,
    },

    /// A fresh simulation run started.
    NewRun,
}

impl HostEvent {
    /// The agent this event is about, if any.
    #[must_use]
    pub fn subject(&self) -> Option<AgentId> {
        match self {
            Self::AgentSpawned { agent } => Some(agent.id),
            Self::AgentDestroyed { agent }
            | Self::SkillChanged { agent, .. }
            | Self::ItemEquipped { agent, .. } => Some(*agent),
            Self::CatalogReplaced { .. }
            | Self::PreferenceChanged { .. }
            | Self::GameLoaded { .. }
            | Self::NewRun => None,
        }
    }

    /// Whether applying this event invalidates every cache.
    #[must_use]
    pub fn clears_caches(&self) -> bool {
        matches!(self, Self::PreferenceChanged { .. } | Self::NewRun)
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AgentSpawned { .. } => "agent_spawned",
            Self::AgentDestroyed { .. } => "agent_destroyed",
            Self::SkillChanged { .. } => "skill_changed",
            Self::ItemEquipped { .. } => "item_equipped",
            Self::CatalogReplaced { .. } => "catalog_replaced",
            Self::PreferenceChanged { .. } => "preference_changed",
            Self::GameLoaded { .. } => "game_loaded",
            Self::NewRun => "new_run",
        }
    }
}
