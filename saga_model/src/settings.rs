//! Game-setup configuration and its validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{
    FactionAlignment, Gender, ItemKind, LocationType, NpcAlignment, Mood, Rarity, SkillType,
};
use crate::knowledge_base::{WorldDate, WorldEventType};
use crate::mechanics::TalentTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

/// What happens when the player dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeathConsequence {
    #[default]
    Capture,
    Reincarnation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Genre {
    #[default]
    Cultivation,
    Wuxia,
    Xianxia,
    Xuanhuan,
    PalaceIntrigue,
    Supernatural,
    SciFi,
    WesternFantasy,
    Romance,
    Urban,
    PostApocalyptic,
    VirtualGame,
    Sports,
    Horror,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingSkill {
    pub name: String,
    pub description: String,
    pub skill_type: SkillType,
    #[serde(default)]
    pub base_damage: u32,
    #[serde(default)]
    pub healing_amount: u32,
    #[serde(default)]
    pub mana_cost: u32,
    #[serde(default)]
    pub cooldown: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingItem {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub rarity: Rarity,
    pub value: u64,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingNpc {
    pub name: String,
    pub personality: String,
    pub initial_affinity: i32,
    pub details: String,
    #[serde(default)]
    pub gender: Gender,
    pub race: String,
    pub realm: Option<String>,
    pub talent: Option<TalentTier>,
    pub alignment: Option<NpcAlignment>,
    pub mood: Option<Mood>,
    pub goal: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingBeast {
    pub name: String,
    pub species: String,
    pub description: String,
    pub realm: Option<String>,
    pub is_hostile: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingLore {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingLocation {
    pub name: String,
    pub description: String,
    pub is_safe_zone: bool,
    pub location_type: LocationType,
    pub map_x: Option<i32>,
    pub map_y: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingFaction {
    pub name: String,
    pub description: String,
    pub alignment: FactionAlignment,
    pub initial_player_reputation: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingEvent {
    pub name: String,
    pub event_type: WorldEventType,
    pub description: String,
    /// Matched against starting location names to place the event.
    pub location_keyword: String,
    pub delay_days: u32,
    pub duration_days: u32,
}

/// Everything chosen on the game-setup screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    pub save_game_name: String,
    pub theme: String,
    pub setting_description: String,
    pub writing_style: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub death_consequence: DeathConsequence,
    pub currency_name: String,
    pub player_name: String,
    #[serde(default)]
    pub player_gender: Gender,
    pub player_race: String,
    pub player_personality: String,
    pub player_backstory: String,
    pub player_goal: String,
    pub player_spiritual_root: String,
    pub player_special_physique: String,
    pub player_tho_nguyen: Option<i64>,
    pub player_max_tho_nguyen: Option<i64>,
    pub starting_currency: Option<i64>,
    /// Starting cultivation realm (cảnh giới khởi đầu).
    pub starting_realm: String,
    pub starting_date: WorldDate,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default = "default_true")]
    pub is_cultivation_enabled: bool,
    #[serde(default)]
    pub starting_skills: Vec<StartingSkill>,
    #[serde(default)]
    pub starting_items: Vec<StartingItem>,
    #[serde(default)]
    pub starting_npcs: Vec<StartingNpc>,
    #[serde(default)]
    pub starting_beasts: Vec<StartingBeast>,
    #[serde(default)]
    pub starting_lore: Vec<StartingLore>,
    #[serde(default)]
    pub starting_locations: Vec<StartingLocation>,
    #[serde(default)]
    pub starting_factions: Vec<StartingFaction>,
    #[serde(default)]
    pub starting_events: Vec<StartingEvent>,
    pub player_avatar_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl WorldSettings {
    /// Minimal settings with the required fields filled in.
    pub fn new(save_game_name: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            save_game_name: save_game_name.into(),
            theme: String::new(),
            setting_description: String::new(),
            writing_style: String::new(),
            difficulty: Difficulty::Normal,
            death_consequence: DeathConsequence::Capture,
            currency_name: String::from("Linh Thạch"),
            player_name: player_name.into(),
            player_gender: Gender::Unknown,
            player_race: String::from("Nhân Tộc"),
            player_personality: String::new(),
            player_backstory: String::new(),
            player_goal: String::new(),
            player_spiritual_root: String::new(),
            player_special_physique: String::new(),
            player_tho_nguyen: None,
            player_max_tho_nguyen: None,
            starting_currency: None,
            starting_realm: String::from("Luyện Khí Nhất Tầng"),
            starting_date: WorldDate::default(),
            genre: Genre::Cultivation,
            is_cultivation_enabled: true,
            starting_skills: Vec::new(),
            starting_items: Vec::new(),
            starting_npcs: Vec::new(),
            starting_beasts: Vec::new(),
            starting_lore: Vec::new(),
            starting_locations: Vec::new(),
            starting_factions: Vec::new(),
            starting_events: Vec::new(),
            player_avatar_url: None,
        }
    }

    /// Check user-entered fields. Errors are keyed by field name.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.save_game_name.trim().is_empty() {
            errors.add("save_game_name", "save name is required");
        }
        if self.player_name.trim().is_empty() {
            errors.add("player_name", "player name is required");
        }
        if self.currency_name.trim().is_empty() {
            errors.add("currency_name", "currency name is required");
        }
        if self.is_cultivation_enabled && self.starting_realm.trim().is_empty() {
            errors.add("starting_realm", "a starting realm is required when cultivation is enabled");
        }
        if !self.starting_date.is_valid() {
            errors.add("starting_date", format!("{} is not a valid date", self.starting_date));
        }
        if let Some(currency) = self.starting_currency {
            if currency < 0 {
                errors.add("starting_currency", "starting currency cannot be negative");
            }
        }
        match (self.player_tho_nguyen, self.player_max_tho_nguyen) {
            (Some(current), Some(max)) if current > max => {
                errors.add("player_tho_nguyen", "lifespan cannot exceed maximum lifespan");
            }
            (_, Some(max)) if max <= 0 => {
                errors.add("player_max_tho_nguyen", "maximum lifespan must be positive");
            }
            _ => {}
        }
        if let Genre::Custom(name) = &self.genre {
            if name.trim().is_empty() {
                errors.add("genre", "a custom genre needs a name");
            }
        }
        for (i, item) in self.starting_items.iter().enumerate() {
            if item.name.trim().is_empty() {
                errors.add(format!("starting_items[{}].name", i), "item name is required");
            }
        }
        for (i, npc) in self.starting_npcs.iter().enumerate() {
            if npc.name.trim().is_empty() {
                errors.add(format!("starting_npcs[{}].name", i), "NPC name is required");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Field-scoped validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("invalid world settings ({} field errors)", .fields.len())]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(WorldSettings::new("Journey", "Lâm Phong").validate().is_ok());
    }

    #[test]
    fn test_errors_are_field_scoped() {
        let mut settings = WorldSettings::new("", "  ");
        settings.starting_currency = Some(-5);
        settings.starting_date = WorldDate {
            year: 1,
            month: 14,
            day: 1,
        };

        let errors = settings.validate().unwrap_err();
        assert!(errors.get("save_game_name").is_some());
        assert!(errors.get("player_name").is_some());
        assert!(errors.get("starting_currency").is_some());
        assert!(errors.get("starting_date").is_some());
        assert!(errors.get("currency_name").is_none());
    }

    #[test]
    fn test_lifespan_bounds() {
        let mut settings = WorldSettings::new("Journey", "Lâm Phong");
        settings.player_tho_nguyen = Some(200);
        settings.player_max_tho_nguyen = Some(100);
        let errors = settings.validate().unwrap_err();
        assert!(errors.get("player_tho_nguyen").is_some());
    }

    #[test]
    fn test_custom_genre_needs_name() {
        let mut settings = WorldSettings::new("Journey", "Lâm Phong");
        settings.genre = Genre::Custom(String::new());
        assert!(settings.validate().unwrap_err().get("genre").is_some());
    }
}
