//! Inventory items.

use serde::{Deserialize, Serialize};

use super::{ItemId, QuestId};
use crate::mechanics::{EquipmentSlot, ProfessionType};

/// Item rarity tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Precious,
    Supreme,
    Mythic,
    Exalted,
}

/// Flat category tag derived from [`ItemKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Equipment,
    Potion,
    Material,
    QuestItem,
    Miscellaneous,
    CongPhap,
    LinhKi,
    ProfessionSkillBook,
    ProfessionTool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    Weapon,
    HeadArmor,
    BodyArmor,
    HandArmor,
    LegArmor,
    Accessory,
    Artifact,
    Pet,
}

impl EquipmentType {
    /// Slots an item of this type may occupy.
    pub fn accepted_slots(&self) -> &'static [EquipmentSlot] {
        match self {
            EquipmentType::Weapon => &[EquipmentSlot::MainWeapon, EquipmentSlot::OffHandWeapon],
            EquipmentType::HeadArmor => &[EquipmentSlot::Head],
            EquipmentType::BodyArmor => &[EquipmentSlot::Body],
            EquipmentType::HandArmor => &[EquipmentSlot::Hands],
            EquipmentType::LegArmor => &[EquipmentSlot::Legs],
            EquipmentType::Accessory => &[EquipmentSlot::Accessory1, EquipmentSlot::Accessory2],
            EquipmentType::Artifact => &[EquipmentSlot::Artifact],
            EquipmentType::Pet => &[EquipmentSlot::Pet],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotionType {
    Restoration,
    Enhancement,
    Antidote,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialType {
    SpiritHerb,
    Ore,
    BeastCore,
    BeastHideOrBone,
    Soul,
    CraftingMaterial,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongPhapType {
    QiCultivation,
    BodyCultivation,
    MartialIntent,
    SoulCultivation,
    Devouring,
    DualCultivation,
    InsectCultivation,
    MusicCultivation,
}

/// Stat bonuses granted while equipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBonuses {
    #[serde(default)]
    pub attack: i64,
    #[serde(default)]
    pub max_hp: i64,
    #[serde(default)]
    pub max_mana: i64,
}

/// Category-specific item data. Every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum ItemKind {
    Equipment {
        equipment_type: EquipmentType,
        #[serde(default)]
        stat_bonuses: StatBonuses,
        #[serde(default)]
        unique_effects: Vec<String>,
    },
    Potion {
        potion_type: PotionType,
        effects: Vec<String>,
        duration_turns: Option<u32>,
        cooldown_turns: Option<u32>,
    },
    Material {
        material_type: MaterialType,
    },
    QuestItem {
        quest_id: QuestId,
    },
    Miscellaneous {
        usable: bool,
        consumable: bool,
    },
    CongPhap {
        cong_phap_type: CongPhapType,
        exp_bonus_percentage: u32,
    },
    LinhKi {
        /// Serialized skill definition learnt by reading the manual.
        skill_to_learn: String,
    },
    ProfessionSkillBook {
        profession: ProfessionType,
    },
    ProfessionTool {
        profession: ProfessionType,
    },
}

/// An inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    /// Base value in the world's currency.
    pub value: u64,
    pub quantity: u32,
    pub item_realm: Option<String>,
    pub kind: ItemKind,
}

impl Item {
    /// Create a new item of the given kind with quantity 1.
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            description: String::new(),
            rarity: Rarity::Common,
            value: 0,
            quantity: 1,
            item_realm: None,
            kind,
        }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(&self) -> ItemCategory {
        match self.kind {
            ItemKind::Equipment { .. } => ItemCategory::Equipment,
            ItemKind::Potion { .. } => ItemCategory::Potion,
            ItemKind::Material { .. } => ItemCategory::Material,
            ItemKind::QuestItem { .. } => ItemCategory::QuestItem,
            ItemKind::Miscellaneous { .. } => ItemCategory::Miscellaneous,
            ItemKind::CongPhap { .. } => ItemCategory::CongPhap,
            ItemKind::LinhKi { .. } => ItemCategory::LinhKi,
            ItemKind::ProfessionSkillBook { .. } => ItemCategory::ProfessionSkillBook,
            ItemKind::ProfessionTool { .. } => ItemCategory::ProfessionTool,
        }
    }

    /// Whether this item can be placed in the given equipment slot.
    pub fn is_equippable_in(&self, slot: EquipmentSlot) -> bool {
        match &self.kind {
            ItemKind::Equipment { equipment_type, .. } => {
                equipment_type.accepted_slots().contains(&slot)
            }
            _ => false,
        }
    }

    /// Whether using the item consumes it.
    pub fn is_consumable(&self) -> bool {
        match &self.kind {
            ItemKind::Potion { .. } => true,
            ItemKind::Miscellaneous { consumable, .. } => *consumable,
            ItemKind::Equipment { .. }
            | ItemKind::Material { .. }
            | ItemKind::QuestItem { .. }
            | ItemKind::CongPhap { .. }
            | ItemKind::LinhKi { .. }
            | ItemKind::ProfessionSkillBook { .. }
            | ItemKind::ProfessionTool { .. } => false,
        }
    }
}
