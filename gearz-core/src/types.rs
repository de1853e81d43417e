//! Core type definitions for the GEARZ scoring engine.
//!
//! Agents and items are identified by stable integer ids so that every cache
//! can key on plain `Copy` values and a destroyed id simply stops matching.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Discrete simulation time. Every TTL in the engine is expressed in ticks.
pub type Tick = u64;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Stable identifier of an agent in the host simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// Stable identifier of a concrete item instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Identifier of a static item definition (template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefinitionId(pub u32);

/// Identifier of a material variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def#{}", self.0)
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mat#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// A kind of skill an agent can hold a level in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// Ranged weapon handling.
    Shooting,
    /// Close-quarters weapon handling.
    Melee,
    /// Building and repair.
    Construction,
    /// Treating the wounded.
    Medicine,
    /// Item production.
    Crafting,
    /// Trade and negotiation.
    Social,
    /// Host-specific skill the engine does not know by name.
    Other(u16),
}

/// One entry of an agent's skill list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Which skill.
    pub kind: SkillKind,
    /// Current level (0–20 in typical hosts, not enforced).
    pub level: i32,
}

impl SkillEntry {
    /// Create a skill entry.
    #[must_use]
    pub fn new(kind: SkillKind, level: i32) -> Self {
        Self { kind, level }
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Role flags that make certain item categories more attractive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    /// Benefits from any weapon (melee or ranged).
    pub combat_specialist: bool,
    /// Benefits from ranged items.
    pub ranged_focus: bool,
    /// Benefits from melee items.
    pub melee_focus: bool,
}

impl RoleFlags {
    /// Whether any of these roles benefits from `category`.
    #[must_use]
    pub fn benefits_from(self, category: ItemCategory) -> bool {
        match category {
            ItemCategory::Ranged => self.combat_specialist || self.ranged_focus,
            ItemCategory::Melee => self.combat_specialist || self.melee_focus,
            ItemCategory::Other => false,
        }
    }
}

/// Predicate over item definitions deciding what an agent may pick up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFilter {
    /// Melee definitions are allowed.
    pub allow_melee: bool,
    /// Ranged definitions are allowed.
    pub allow_ranged: bool,
    /// Definitions of any other category are allowed.
    pub allow_other: bool,
    /// Definitions explicitly forbidden regardless of category.
    pub denied: BTreeSet<DefinitionId>,
    /// Items whose base market value exceeds this are forbidden.
    pub max_market_value: Option<f32>,
}

impl PolicyFilter {
    /// A filter that allows everything.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            allow_melee: true,
            allow_ranged: true,
            allow_other: true,
            denied: BTreeSet::new(),
            max_market_value: None,
        }
    }

    /// Add a definition to the deny list.
    #[must_use]
    pub fn deny(mut self, definition: DefinitionId) -> Self {
        self.denied.insert(definition);
        self
    }

    /// Whether the filter allows `definition`.
    #[must_use]
    pub fn allows(&self, definition: &ItemDefinition) -> bool {
        if self.denied.contains(&definition.id) {
            return false;
        }
        if self
            .max_market_value
            .is_some_and(|ceiling| definition.market_value > ceiling)
        {
            return false;
        }
        match definition.category {
            ItemCategory::Melee => self.allow_melee,
            ItemCategory::Ranged => self.allow_ranged,
            ItemCategory::Other => self.allow_other,
        }
    }
}

impl Default for PolicyFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Read-only snapshot of an agent as seen by the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Stable id.
    pub id: AgentId,
    /// Skill list. Order carries no meaning but positions are memoized.
    pub skills: Vec<SkillEntry>,
    /// Item currently held, if any.
    pub held_item: Option<ItemId>,
    /// Role flags.
    pub roles: RoleFlags,
    /// What the agent is permitted to pick up.
    pub policy: PolicyFilter,
}

impl Agent {
    /// Create an agent with no skills, no held item and an allow-all policy.
    #[must_use]
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            skills: Vec::new(),
            held_item: None,
            roles: RoleFlags::default(),
            policy: PolicyFilter::allow_all(),
        }
    }

    /// Builder-style skill assignment (replaces an existing entry of that kind).
    #[must_use]
    pub fn with_skill(mut self, kind: SkillKind, level: i32) -> Self {
        if let Some(entry) = self.skills.iter_mut().find(|s| s.kind == kind) {
            entry.level = level;
        } else {
            self.skills.push(SkillEntry::new(kind, level));
        }
        self
    }

    /// Builder-style held item assignment.
    #[must_use]
    pub fn holding(mut self, item: ItemId) -> Self {
        self.held_item = Some(item);
        self
    }

    /// Linear lookup of a skill level; `None` when the agent lacks the skill.
    #[must_use]
    pub fn skill_level(&self, kind: SkillKind) -> Option<i32> {
        self.skills.iter().find(|s| s.kind == kind).map(|s| s.level)
    }

    /// Whether the agent currently holds `item`.
    #[must_use]
    pub fn is_holding(&self, item: ItemId) -> bool {
        self.held_item == Some(item)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Broad item category used by role, skill and preference scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Close-quarters weapon.
    Melee,
    /// Ranged weapon.
    Ranged,
    /// Anything else that can be equipped.
    Other,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Melee => write!(f, "Melee"),
            Self::Ranged => write!(f, "Ranged"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Ordinal quality tier of an item instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// Barely usable.
    Awful,
    /// Below average.
    Poor,
    /// Baseline.
    #[default]
    Normal,
    /// Above average.
    Good,
    /// Well above average.
    Excellent,
    /// Exceptional craftsmanship.
    Masterwork,
    /// Best possible.
    Legendary,
}

impl QualityTier {
    /// Ordinal index, 0 for [`QualityTier::Awful`].
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Multiplier applied to base damage.
    #[must_use]
    pub fn damage_factor(self) -> f32 {
        match self {
            Self::Awful => 0.8,
            Self::Poor => 0.9,
            Self::Normal => 1.0,
            Self::Good => 1.1,
            Self::Excellent => 1.2,
            Self::Masterwork => 1.35,
            Self::Legendary => 1.5,
        }
    }

    /// Multiplier applied to base market value.
    #[must_use]
    pub fn value_factor(self) -> f32 {
        match self {
            Self::Awful => 0.5,
            Self::Poor => 0.75,
            Self::Normal => 1.0,
            Self::Good => 1.25,
            Self::Excellent => 1.5,
            Self::Masterwork => 2.5,
            Self::Legendary => 5.0,
        }
    }
}

/// Static traits of a definition that affect how it is valued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTraits {
    /// Area damage (grenades, launchers).
    pub explosive: bool,
    /// Primarily applies a status effect rather than damage.
    pub applies_status: bool,
    /// Designed not to kill.
    pub non_lethal: bool,
    /// Sidearm-sized item.
    pub compact: bool,
}

impl ItemTraits {
    /// Situational items only shine in specific circumstances.
    #[must_use]
    pub fn is_situational(self) -> bool {
        self.explosive || self.applies_status || self.non_lethal
    }
}

/// Static item template shared by every instance of the same kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Stable id.
    pub id: DefinitionId,
    /// Display name (diagnostics only).
    pub name: String,
    /// Broad category.
    pub category: ItemCategory,
    /// Base damage per hit.
    pub damage: f32,
    /// Effective range in tiles (0 for melee).
    pub range: f32,
    /// Warmup before firing, in seconds.
    pub warmup: f32,
    /// Shots per burst (1 for single shot and melee).
    pub burst: u32,
    /// Base armor penetration fraction.
    pub armor_penetration: f32,
    /// Base market value.
    pub market_value: f32,
    /// Valuation traits.
    pub traits: ItemTraits,
}

impl ItemDefinition {
    /// Create a definition with neutral stats; callers fill in the rest.
    #[must_use]
    pub fn new(id: DefinitionId, name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            damage: 10.0,
            range: 0.0,
            warmup: 0.0,
            burst: 1,
            armor_penetration: 0.0,
            market_value: 100.0,
            traits: ItemTraits::default(),
        }
    }
}

/// Material variant modifying a definition's base stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialVariant {
    /// Stable id.
    pub id: MaterialId,
    /// Multiplier on base damage.
    pub damage_factor: f32,
    /// Multiplier on base armor penetration.
    pub armor_penetration_factor: f32,
    /// Multiplier on base market value.
    pub market_value_factor: f32,
}

impl MaterialVariant {
    /// A material that changes nothing.
    #[must_use]
    pub fn neutral(id: MaterialId) -> Self {
        Self {
            id,
            damage_factor: 1.0,
            armor_penetration_factor: 1.0,
            market_value_factor: 1.0,
        }
    }
}

/// A concrete item instance being considered for acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Stable id of this instance.
    pub id: ItemId,
    /// Template it was made from.
    pub definition: DefinitionId,
    /// Quality tier.
    pub quality: QualityTier,
    /// Material variant, if the definition is made from stuff.
    pub material: Option<MaterialId>,
    /// Remaining durability, 0.0–1.0.
    pub durability: f32,
    /// Agent this item is specially bound to.
    pub bound_to: Option<AgentId>,
    /// Holder is forced to keep it (e.g. assigned by the host).
    pub forced_held: bool,
}

impl CandidateItem {
    /// Create a full-durability, unbound, normal-quality instance.
    #[must_use]
    pub fn new(id: ItemId, definition: DefinitionId) -> Self {
        Self {
            id,
            definition,
            quality: QualityTier::Normal,
            material: None,
            durability: 1.0,
            bound_to: None,
            forced_held: false,
        }
    }

    /// Whether the item is bound to `agent`.
    #[must_use]
    pub fn is_bound_to(&self, agent: AgentId) -> bool {
        self.bound_to == Some(agent)
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// A final score with total ordering, so callers can sort candidates.
///
/// Sentinel scores are recognised by threshold, not equality: anything at or
/// below half of [`crate::scoring::SENTINEL_REJECT`] is a rejection, anything
/// at or above half of [`crate::scoring::SENTINEL_KEEP`] is a hard keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScoreValue(pub OrderedFloat<f32>);

impl ScoreValue {
    /// Wrap a raw score.
    #[must_use]
    pub fn new(score: f32) -> Self {
        Self(OrderedFloat(score))
    }

    /// Raw score.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0.into_inner()
    }

    /// Whether this score signals hard disqualification.
    #[must_use]
    pub fn is_rejected(self) -> bool {
        self.value() <= crate::scoring::SENTINEL_REJECT * 0.5
    }

    /// Whether this score signals "never replace".
    #[must_use]
    pub fn is_kept(self) -> bool {
        self.value() >= crate::scoring::SENTINEL_KEEP * 0.5
    }
}
