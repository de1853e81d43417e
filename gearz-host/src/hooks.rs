//! Integration hooks.
//!
//! Call these from the host's own systems (spawn, death, skill gain, mod
//! reload, save/load) to produce the [`HostEvent`]s the tick driver applies.

use gearz_core::memo::CacheTimestamps;
use gearz_core::{Agent, AgentId, ItemCatalog, ItemId, SkillKind};

use crate::events::HostEvent;

/// An agent entered the world.
#[must_use]
pub fn on_spawn(agent: Agent) -> HostEvent {
    HostEvent::AgentSpawned { agent }
}

/// An agent was destroyed or despawned.
#[must_use]
pub fn on_destroyed(agent: AgentId) -> HostEvent {
    HostEvent::AgentDestroyed { agent }
}

/// An agent gained or lost skill.
#[must_use]
pub fn on_skill_change(agent: AgentId, kind: SkillKind, level: i32) -> HostEvent {
    HostEvent::SkillChanged { agent, kind, level }
}

/// An agent picked up an item.
#[must_use]
pub fn on_equip(agent: AgentId, item: ItemId) -> HostEvent {
    HostEvent::ItemEquipped { agent, item }
}

/// The definition snapshot changed.
#[must_use]
pub fn on_catalog_reload(catalog: ItemCatalog) -> HostEvent {
    HostEvent::CatalogReplaced { catalog }
}

/// The preference setting changed.
#[must_use]
pub fn on_preference_change(preference: f32) -> HostEvent {
    HostEvent::PreferenceChanged { preference }
}

/// A save finished loading. `persisted` is the JSON the host stored next to
/// the save; unreadable data is dropped and the caches start cold.
#[must_use]
pub fn on_game_loaded(persisted: Option<&str>) -> HostEvent {
    let timestamps = persisted.and_then(|json| match CacheTimestamps::from_json(json) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cache timestamps");
            None
        }
    });
    HostEvent::GameLoaded { timestamps }
}

/// A new simulation run started.
#[must_use]
pub fn on_new_run() -> HostEvent {
    HostEvent::NewRun
}
