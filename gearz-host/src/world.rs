//! Read-only world state the engine scores against.
//!
//! A real host keeps this in its ECS; the reference host keeps plain maps
//! and can generate a deterministic synthetic world from a seed.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use gearz_core::{
    Agent, AgentId, CandidateItem, DefinitionId, ItemCatalog, ItemCategory, ItemDefinition,
    ItemId, ItemTraits, MaterialId, MaterialVariant, QualityTier, RoleFlags, SkillKind,
};

/// Agents, loose items and the definition catalog.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    /// Live agents by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// Item instances by id (held or lying around).
    pub items: BTreeMap<ItemId, CandidateItem>,
    /// Definition snapshot.
    pub catalog: ItemCatalog,
}

impl WorldSnapshot {
    /// Empty world over `catalog`.
    #[must_use]
    pub fn new(catalog: ItemCatalog) -> Self {
        Self {
            agents: BTreeMap::new(),
            items: BTreeMap::new(),
            catalog,
        }
    }

    /// Add or replace an agent.
    pub fn spawn_agent(&mut self, agent: Agent) {
        self.agents.insert(agent.id, agent);
    }

    /// Remove an agent; its held item drops to the ground.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    /// Add or replace an item instance.
    pub fn add_item(&mut self, item: CandidateItem) {
        self.items.insert(item.id, item);
    }

    /// Agent by id.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Item by id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&CandidateItem> {
        self.items.get(&id)
    }

    /// Items nobody is holding.
    pub fn loose_items(&self) -> impl Iterator<Item = &CandidateItem> {
        self.items
            .values()
            .filter(|item| !self.agents.values().any(|a| a.is_holding(item.id)))
    }

    /// Make `agent` hold `item`. Returns `false` if either is unknown or the
    /// item is already held by someone else.
    pub fn equip(&mut self, agent: AgentId, item: ItemId) -> bool {
        if !self.items.contains_key(&item) {
            return false;
        }
        if self.agents.values().any(|a| a.id != agent && a.is_holding(item)) {
            return false;
        }
        match self.agents.get_mut(&agent) {
            Some(a) => {
                a.held_item = Some(item);
                true
            }
            None => false,
        }
    }

    /// Set a skill level. Returns `false` for an unknown agent.
    pub fn set_skill(&mut self, agent: AgentId, kind: SkillKind, level: i32) -> bool {
        match self.agents.get_mut(&agent) {
            Some(a) => {
                if let Some(entry) = a.skills.iter_mut().find(|s| s.kind == kind) {
                    entry.level = level;
                } else {
                    a.skills.push(gearz_core::SkillEntry::new(kind, level));
                }
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic worlds
// ---------------------------------------------------------------------------

/// Size of a generated world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldGen {
    /// Number of agents.
    pub agents: usize,
    /// Number of item definitions.
    pub definitions: usize,
    /// Number of materials.
    pub materials: usize,
    /// Number of item instances.
    pub items: usize,
}

impl Default for WorldGen {
    fn default() -> Self {
        Self {
            agents: 30,
            definitions: 40,
            materials: 4,
            items: 120,
        }
    }
}

const TRACKED_AND_FILLER: [SkillKind; 6] = [
    SkillKind::Shooting,
    SkillKind::Melee,
    SkillKind::Construction,
    SkillKind::Medicine,
    SkillKind::Crafting,
    SkillKind::Social,
];

const QUALITIES: [QualityTier; 7] = [
    QualityTier::Awful,
    QualityTier::Poor,
    QualityTier::Normal,
    QualityTier::Good,
    QualityTier::Excellent,
    QualityTier::Masterwork,
    QualityTier::Legendary,
];

impl WorldGen {
    /// Generate a world. Same seed, same world.
    #[must_use]
    pub fn generate(&self, seed: u64) -> WorldSnapshot {
        let mut rng = StdRng::seed_from_u64(seed);
        let catalog = self.catalog(&mut rng);
        let mut world = WorldSnapshot::new(catalog);

        for i in 0..self.agents {
            world.spawn_agent(random_agent(&mut rng, AgentId(i as u64 + 1)));
        }
        for i in 0..self.items {
            let def = DefinitionId(rng.gen_range(0..self.definitions.max(1)) as u32);
            let mut item = CandidateItem::new(ItemId(i as u64 + 1), def);
            item.quality = QUALITIES[rng.gen_range(0..QUALITIES.len())];
            item.durability = rng.gen_range(0.2..=1.0);
            if self.materials > 0 && rng.gen_bool(0.5) {
                item.material = Some(MaterialId(rng.gen_range(0..self.materials) as u32));
            }
            if self.agents > 0 && rng.gen_bool(0.05) {
                item.bound_to = Some(AgentId(rng.gen_range(1..=self.agents) as u64));
            }
            world.add_item(item);
        }
        world
    }

    fn catalog(&self, rng: &mut StdRng) -> ItemCatalog {
        let mut catalog = ItemCatalog::new();
        for i in 0..self.definitions {
            let id = DefinitionId(i as u32);
            let category = match rng.gen_range(0..10) {
                0..=4 => ItemCategory::Ranged,
                5..=8 => ItemCategory::Melee,
                _ => ItemCategory::Other,
            };
            let mut def = ItemDefinition::new(id, format!("{category}-{i}"), category);
            def.damage = rng.gen_range(4.0..30.0);
            def.market_value = rng.gen_range(20.0..2000.0);
            def.armor_penetration = rng.gen_range(0.0..0.7);
            if category == ItemCategory::Ranged {
                def.range = rng.gen_range(5.0..55.0);
                def.warmup = rng.gen_range(0.0..4.0);
                def.burst = rng.gen_range(1..8);
            }
            def.traits = ItemTraits {
                explosive: rng.gen_bool(0.05),
                applies_status: rng.gen_bool(0.05),
                non_lethal: rng.gen_bool(0.03),
                compact: rng.gen_bool(0.2),
            };
            catalog.insert_definition(def);
        }
        for i in 0..self.materials {
            catalog.insert_material(MaterialVariant {
                id: MaterialId(i as u32),
                damage_factor: rng.gen_range(0.8..1.3),
                armor_penetration_factor: rng.gen_range(0.8..1.5),
                market_value_factor: rng.gen_range(0.5..3.0),
            });
        }
        catalog
    }
}

fn random_agent(rng: &mut StdRng, id: AgentId) -> Agent {
    let mut kinds = TRACKED_AND_FILLER;
    kinds.shuffle(rng);
    let mut agent = Agent::new(id);
    for kind in kinds.into_iter().take(rng.gen_range(2..=kinds.len())) {
        agent = agent.with_skill(kind, rng.gen_range(0..=20));
    }
    agent.roles = RoleFlags {
        combat_specialist: rng.gen_bool(0.1),
        ranged_focus: rng.gen_bool(0.15),
        melee_focus: rng.gen_bool(0.15),
    };
    agent.policy.allow_melee = rng.gen_bool(0.95);
    agent.policy.allow_ranged = rng.gen_bool(0.95);
    agent
}
