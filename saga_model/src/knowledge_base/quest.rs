//! Quests, world events, the bulletin board, mail and lore.

use serde::{Deserialize, Serialize};

use super::WorldDate;
use crate::entities::{EventId, FactionId, LocationId, LoreId, MailId, QuestId, RuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub status: QuestStatus,
    #[serde(default)]
    pub objectives: Vec<QuestObjective>,
}

impl Quest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: QuestId::new(),
            title: title.into(),
            description: description.into(),
            status: QuestStatus::Active,
            objectives: Vec::new(),
        }
    }

    /// Mark completed, along with every objective.
    pub fn complete(&mut self) {
        self.status = QuestStatus::Completed;
        for objective in &mut self.objectives {
            objective.completed = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEventType {
    Opportunity,
    Challenge,
    Conflict,
    Mystery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    Pending,
    Active,
    Cooldown,
    Finished,
}

/// A scheduled happening in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: EventId,
    pub name: String,
    pub event_type: WorldEventType,
    pub current_phase: EventPhase,
    pub phase_description: String,
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub factions_involved: Vec<FactionId>,
    pub start_date: WorldDate,
    pub end_date: WorldDate,
}

impl WorldEvent {
    /// The phase the event should be in on `today`.
    pub fn phase_on(&self, today: &WorldDate) -> EventPhase {
        if *today < self.start_date {
            EventPhase::Pending
        } else if *today <= self.end_date {
            EventPhase::Active
        } else {
            EventPhase::Finished
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletinCategory {
    Politics,
    Economy,
    Cultivation,
    SecretRealm,
    Rumor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletinEntry {
    pub id: String,
    pub turn: u32,
    pub category: BulletinCategory,
    pub headline: String,
    pub content: String,
    pub is_read: bool,
}

/// Proactive message from an NPC to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    pub id: MailId,
    pub sender_id: String,
    pub sender_name: String,
    pub subject: String,
    pub content: String,
    pub turn_received: u32,
    pub is_read: bool,
    pub related_quest_id: Option<QuestId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldLoreEntry {
    pub id: LoreId,
    pub title: String,
    pub content: String,
}

/// A player-authored rule injected into every AI prompt while active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRule {
    pub id: RuleId,
    pub text: String,
    pub is_active: bool,
}
