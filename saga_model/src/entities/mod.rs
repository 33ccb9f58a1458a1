//! Entity definitions for the game world.
//!
//! Every entity is keyed by a stable string id. Templates are immutable
//! definitions; runtime state (NPC mood, companion obedience) is mutated only
//! by the session's orchestration logic.

mod companion;
mod item;
mod location;
mod npc;
mod skill;

pub use companion::*;
pub use item::*;
pub use location::*;
pub use npc::*;
pub use skill::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new random id.
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::new_v4()))
            }

            /// Borrow the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for inventory items.
    ItemId,
    "item"
);
string_id!(
    /// Unique identifier for skills.
    SkillId,
    "skill"
);
string_id!(
    /// Unique identifier for NPCs.
    NpcId,
    "npc"
);
string_id!(
    /// Unique identifier for yêu thú (spirit beasts).
    BeastId,
    "beast"
);
string_id!(
    /// Unique identifier for locations.
    LocationId,
    "loc"
);
string_id!(RegionId, "region");
string_id!(
    /// Unique identifier for factions.
    FactionId,
    "faction"
);
string_id!(
    /// Unique identifier for quests.
    QuestId,
    "quest"
);
string_id!(
    /// Unique identifier for wives, slaves, prisoners and the master.
    CompanionId,
    "companion"
);
string_id!(LoreId, "lore");
string_id!(EventId, "event");
string_id!(MailId, "mail");
string_id!(RuleId, "rule");
string_id!(
    /// Unique identifier for narrative log entries.
    MessageId,
    "msg"
);
string_id!(
    /// Unique identifier for persisted save games.
    SaveId,
    "save"
);

/// Types of entities that can be inspected or indexed for retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Item,
    Skill,
    Quest,
    Npc,
    Location,
    Lore,
    Faction,
    YeuThu,
    Wife,
    Slave,
    Prisoner,
    Master,
}

/// Reference to a concrete entity, e.g. the one shown in a detail modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: String,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
        }
    }
}

/// Gender as recorded on people in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}
