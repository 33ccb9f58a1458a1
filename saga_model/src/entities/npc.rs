//! NPC and yêu thú definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BeastId, FactionId, Gender, LocationId, NpcId};
use crate::mechanics::TalentTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NpcAlignment {
    Selfish,
    Altruistic,
    Chaotic,
    Principled,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mood {
    Joyful,
    Content,
    #[default]
    Calm,
    Irritated,
    Furious,
    Suspicious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcRelationshipType {
    Friend,
    Enemy,
    Rival,
    Lover,
    Family,
    Acquaintance,
    Master,
    Slave,
}

/// Directed relationship from one NPC to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcRelationship {
    pub relationship_type: NpcRelationshipType,
    /// From -100 (hatred) to 100 (devotion).
    pub intensity: i32,
}

/// Needs driving NPC behaviour, each 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NpcNeeds {
    pub desire: u8,
    pub ambition: u8,
    pub safety: u8,
    pub leisure: u8,
}

/// Mutable simulation state attached to an NPC.
///
/// Owned by the world-tick/orchestration logic; rendering code only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NpcDynamicState {
    pub alignment: NpcAlignment,
    pub mood: Mood,
    pub relationships: BTreeMap<NpcId, NpcRelationship>,
    pub needs: NpcNeeds,
    pub current_goal: String,
    pub secret: String,
    pub current_location_id: Option<LocationId>,
}

/// An NPC the player has discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcTemplate {
    pub id: NpcId,
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    pub race: Option<String>,
    pub description: String,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    /// Affinity towards the player, -100 to 100.
    pub affinity: i32,
    pub faction_id: Option<FactionId>,
    pub realm: Option<String>,
    pub talent: Option<TalentTier>,
    pub avatar_url: Option<String>,
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub is_essential: bool,
    pub dynamic_state: Option<NpcDynamicState>,
}

impl NpcTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NpcId::new(),
            name: name.into(),
            title: None,
            gender: Gender::Unknown,
            race: None,
            description: String::new(),
            personality_traits: Vec::new(),
            affinity: 0,
            faction_id: None,
            realm: None,
            talent: None,
            avatar_url: None,
            location_id: None,
            is_essential: false,
            dynamic_state: None,
        }
    }

    /// Adjust affinity, keeping it within -100..=100.
    pub fn adjust_affinity(&mut self, delta: i32) {
        self.affinity = (self.affinity + delta).clamp(-100, 100);
    }
}

/// A yêu thú (spirit beast) template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beast {
    pub id: BeastId,
    pub name: String,
    pub species: String,
    pub description: String,
    pub is_hostile: bool,
    pub realm: Option<String>,
    pub location_id: Option<LocationId>,
}
