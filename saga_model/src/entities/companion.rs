//! Companions: wives, slaves, prisoners and the player's master.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CompanionId, Gender, ItemId, Mood, NpcTemplate, Skill};
use crate::mechanics::{empty_equipment, EquipmentSlot, TalentTier};

/// Data shared by every person-like companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonBase {
    pub id: CompanionId,
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    pub race: Option<String>,
    pub description: String,
    pub affinity: i32,
    pub avatar_url: Option<String>,
    pub realm: Option<String>,
    pub talent: Option<TalentTier>,
}

impl PersonBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CompanionId::new(),
            name: name.into(),
            title: None,
            gender: Gender::Unknown,
            race: None,
            description: String::new(),
            affinity: 0,
            avatar_url: None,
            realm: None,
            talent: None,
        }
    }

    /// Build a person from a discovered NPC, keeping the NPC's id string.
    pub fn from_npc(npc: &NpcTemplate) -> Self {
        Self {
            id: CompanionId::from(npc.id.as_str()),
            name: npc.name.clone(),
            title: npc.title.clone(),
            gender: npc.gender,
            race: npc.race.clone(),
            description: npc.description.clone(),
            affinity: npc.affinity,
            avatar_url: npc.avatar_url.clone(),
            realm: npc.realm.clone(),
            talent: npc.talent,
        }
    }
}

/// Companion that fights alongside the player and carries equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexCompanion {
    pub person: PersonBase,
    pub willpower: u32,
    pub obedience: u32,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default = "empty_equipment")]
    pub equipped_items: BTreeMap<EquipmentSlot, Option<ItemId>>,
}

impl ComplexCompanion {
    pub fn new(person: PersonBase) -> Self {
        Self {
            person,
            willpower: 50,
            obedience: 50,
            skills: Vec::new(),
            equipped_items: empty_equipment(),
        }
    }
}

/// A captured enemy held by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrisonerState {
    pub person: PersonBase,
    pub willpower: u32,
    pub resistance: u32,
    pub obedience: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanionKind {
    Wife,
    Slave,
    Prisoner,
}

/// A companion bound to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum Companion {
    Wife(ComplexCompanion),
    Slave {
        companion: ComplexCompanion,
        /// Market value when resold.
        value: Option<u64>,
    },
    Prisoner(PrisonerState),
}

impl Companion {
    pub fn kind(&self) -> CompanionKind {
        match self {
            Companion::Wife(_) => CompanionKind::Wife,
            Companion::Slave { .. } => CompanionKind::Slave,
            Companion::Prisoner(_) => CompanionKind::Prisoner,
        }
    }

    pub fn person(&self) -> &PersonBase {
        match self {
            Companion::Wife(c) => &c.person,
            Companion::Slave { companion, .. } => &companion.person,
            Companion::Prisoner(p) => &p.person,
        }
    }

    pub fn person_mut(&mut self) -> &mut PersonBase {
        match self {
            Companion::Wife(c) => &mut c.person,
            Companion::Slave { companion, .. } => &mut companion.person,
            Companion::Prisoner(p) => &mut p.person,
        }
    }

    pub fn id(&self) -> &CompanionId {
        &self.person().id
    }

    /// Equipment slots, for companions that can wear gear.
    pub fn equipped_items(&self) -> Option<&BTreeMap<EquipmentSlot, Option<ItemId>>> {
        match self {
            Companion::Wife(c) => Some(&c.equipped_items),
            Companion::Slave { companion, .. } => Some(&companion.equipped_items),
            Companion::Prisoner(_) => None,
        }
    }

    /// Capture an NPC as a prisoner with fresh resistance.
    pub fn prisoner_from_npc(npc: &NpcTemplate) -> Self {
        Companion::Prisoner(PrisonerState {
            person: PersonBase::from_npc(npc),
            willpower: 70,
            resistance: 80,
            obedience: 10,
        })
    }
}

/// The player's master, if the player has been enslaved or apprenticed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Master {
    pub person: PersonBase,
    pub mood: Mood,
    pub current_goal: String,
    /// 0-100.
    pub favor: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prisoner_keeps_npc_identity() {
        let npc = NpcTemplate::new("Bandit Chief");
        let prisoner = Companion::prisoner_from_npc(&npc);
        assert_eq!(prisoner.kind(), CompanionKind::Prisoner);
        assert_eq!(prisoner.id().as_str(), npc.id.as_str());
        assert!(prisoner.equipped_items().is_none());
    }

    #[test]
    fn test_companion_tagged_serialization() {
        let wife = Companion::Wife(ComplexCompanion::new(PersonBase::new("Lan")));
        let json = serde_json::to_value(&wife).unwrap();
        assert_eq!(json["entity_type"], "wife");
        let back: Companion = serde_json::from_value(json).unwrap();
        assert_eq!(back, wife);
    }

    #[test]
    fn test_companion_starts_with_all_slots_empty() {
        let c = ComplexCompanion::new(PersonBase::new("Mai"));
        assert_eq!(c.equipped_items.len(), EquipmentSlot::ALL.len());
        assert!(c.equipped_items.values().all(Option::is_none));
    }
}
