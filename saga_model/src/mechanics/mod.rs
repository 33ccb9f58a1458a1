//! Game mechanics: player stats, status effects, equipment slots, tiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::ItemId;

/// Equipment slots for the player and equipment-carrying companions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    MainWeapon,
    OffHandWeapon,
    Head,
    Body,
    Hands,
    Legs,
    Artifact,
    Pet,
    Accessory1,
    Accessory2,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 10] = [
        EquipmentSlot::MainWeapon,
        EquipmentSlot::OffHandWeapon,
        EquipmentSlot::Head,
        EquipmentSlot::Body,
        EquipmentSlot::Hands,
        EquipmentSlot::Legs,
        EquipmentSlot::Artifact,
        EquipmentSlot::Pet,
        EquipmentSlot::Accessory1,
        EquipmentSlot::Accessory2,
    ];
}

/// An equipment map with every slot present and empty.
pub fn empty_equipment() -> BTreeMap<EquipmentSlot, Option<ItemId>> {
    EquipmentSlot::ALL.iter().map(|slot| (*slot, None)).collect()
}

/// Innate cultivation talent (tư chất), lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TalentTier {
    Waste,
    Low,
    Middle,
    High,
    Peerless,
    Immortal,
    Divine,
}

/// Skill proficiency tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ProficiencyTier {
    #[default]
    Novice,
    Adept,
    Expert,
    Perfected,
    Transcendent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfessionType {
    Alchemist,
    Artificer,
    TalismanMaster,
    FormationMaster,
    PuppetMaster,
    BeastTamer,
    HerbMaster,
    Diviner,
    PoisonMaster,
    SpiritChef,
    Painter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    pub profession_type: ProfessionType,
    pub level: u32,
    pub exp: u32,
    pub max_exp: u32,
}

/// Effect polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffectType {
    Buff,
    Debuff,
    Neutral,
}

/// A timed status effect on the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub id: String,
    pub name: String,
    pub description: String,
    pub effect_type: StatusEffectType,
    pub duration_turns: u32,
    #[serde(default)]
    pub stat_modifiers: BTreeMap<String, i64>,
    #[serde(default)]
    pub special_effects: Vec<String>,
    pub source: Option<String>,
}

/// Set when the player has been captured or enslaved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpecialStatus {
    pub captive_kind: CaptiveKind,
    pub owner_name: String,
    pub willpower: u32,
    pub resistance: u32,
    pub obedience: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptiveKind {
    Prisoner,
    Slave,
}

/// The player's stats.
///
/// Field names follow the cultivation vocabulary: sinh lực (vitality/HP),
/// linh lực (spiritual power/mana), sức tấn công (attack), kinh nghiệm
/// (experience), thọ nguyên (lifespan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub base_max_sinh_luc: i64,
    pub base_max_linh_luc: i64,
    pub base_suc_tan_cong: i64,
    pub base_max_kinh_nghiem: i64,
    pub sinh_luc: i64,
    pub max_sinh_luc: i64,
    pub linh_luc: i64,
    pub max_linh_luc: i64,
    pub suc_tan_cong: i64,
    pub kinh_nghiem: i64,
    pub max_kinh_nghiem: i64,
    pub realm: String,
    pub currency: i64,
    pub is_in_combat: bool,
    pub turn: u32,
    /// Cultivation bottleneck reached.
    pub bottleneck: bool,
    #[serde(default)]
    pub active_status_effects: Vec<StatusEffect>,
    pub spiritual_root: String,
    pub special_physique: String,
    pub talent: Option<TalentTier>,
    #[serde(default)]
    pub professions: Vec<Profession>,
    pub tho_nguyen: i64,
    pub max_tho_nguyen: i64,
    pub special_status: Option<PlayerSpecialStatus>,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            base_max_sinh_luc: 100,
            base_max_linh_luc: 50,
            base_suc_tan_cong: 10,
            base_max_kinh_nghiem: 100,
            sinh_luc: 100,
            max_sinh_luc: 100,
            linh_luc: 50,
            max_linh_luc: 50,
            suc_tan_cong: 10,
            kinh_nghiem: 0,
            max_kinh_nghiem: 100,
            realm: String::from("Phàm Nhân"),
            currency: 0,
            is_in_combat: false,
            turn: 0,
            bottleneck: false,
            active_status_effects: Vec::new(),
            spiritual_root: String::new(),
            special_physique: String::new(),
            talent: None,
            professions: Vec::new(),
            tho_nguyen: 100,
            max_tho_nguyen: 100,
            special_status: None,
        }
    }
}

impl PlayerStats {
    pub fn is_alive(&self) -> bool {
        self.sinh_luc > 0 && self.tho_nguyen > 0
    }

    /// Tick status effect durations, dropping expired ones. Returns the expired names.
    pub fn tick_status_effects(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        self.active_status_effects.retain_mut(|effect| {
            effect.duration_turns = effect.duration_turns.saturating_sub(1);
            if effect.duration_turns == 0 {
                expired.push(effect.name.clone());
                false
            } else {
                true
            }
        });
        expired
    }
}
