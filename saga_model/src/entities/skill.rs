//! Skill definitions.

use serde::{Deserialize, Serialize};

use super::SkillId;
use crate::mechanics::ProficiencyTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillType {
    /// Cultivation method.
    CongPhap,
    /// Spirit technique.
    LinhKi,
    Profession,
    /// Divine ability.
    ThanThong,
    /// Forbidden art.
    CamThuat,
    Other,
}

/// A learnt or learnable skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    pub skill_type: SkillType,
    pub detailed_effect: String,
    pub mana_cost: u32,
    pub base_damage: u32,
    pub damage_multiplier: f32,
    pub healing_amount: u32,
    pub healing_multiplier: f32,
    pub cooldown: u32,
    #[serde(default)]
    pub proficiency: u32,
    #[serde(default)]
    pub proficiency_tier: ProficiencyTier,
}

impl Skill {
    pub fn new(name: impl Into<String>, skill_type: SkillType) -> Self {
        Self {
            id: SkillId::new(),
            name: name.into(),
            description: String::new(),
            skill_type,
            detailed_effect: String::new(),
            mana_cost: 0,
            base_damage: 0,
            damage_multiplier: 0.0,
            healing_amount: 0,
            healing_multiplier: 0.0,
            cooldown: 0,
            proficiency: 0,
            proficiency_tier: ProficiencyTier::default(),
        }
    }

    /// Whether the skill deals damage or heals when used.
    pub fn is_active(&self) -> bool {
        self.base_damage > 0
            || self.damage_multiplier > 0.0
            || self.healing_amount > 0
            || self.healing_multiplier > 0.0
    }
}
