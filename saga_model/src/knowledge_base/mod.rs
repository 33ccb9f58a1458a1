//! The knowledge base - the aggregate root holding all mutable game state.
//!
//! A `KnowledgeBase` is created from [`WorldSettings`] when a game starts, or
//! restored from a save. Only the session's action methods mutate it.

mod combat;
mod date;
mod quest;
mod vector_store;

pub use combat::*;
pub use date::*;
pub use quest::*;
pub use vector_store::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{
    Beast, BeastId, Companion, EntityType, EventId, Faction, Item, ItemId, Location, LocationId,
    LoreId, Master, NpcDynamicState, NpcId, NpcTemplate, Region, SaveId, Skill,
};
use crate::mechanics::{empty_equipment, EquipmentSlot, PlayerStats};
use crate::saves::AutoSaveSlots;
use crate::settings::WorldSettings;

/// Pagination bookkeeping for AI page summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageLedger {
    /// Summary text by 1-based page number.
    pub page_summaries: BTreeMap<u32, String>,
    /// Turns belonging to the page currently being played.
    pub current_page_history: Vec<u32>,
    pub last_summarized_turn: u32,
}

/// Ways the invariants of a knowledge base can be broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    AutoSaveRingMalformed,
    MissingEquipmentSlot(EquipmentSlot),
    EquippedItemMissing { slot: EquipmentSlot, item_id: ItemId },
    InvalidWorldDate(WorldDate),
    VectorStore(VectorStoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquipError {
    #[error("item {0} is not in the inventory")]
    NotInInventory(ItemId),
    #[error("item {item_id} cannot be equipped in {slot:?}")]
    WrongSlot { item_id: ItemId, slot: EquipmentSlot },
}

/// The complete state of a running game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub player_stats: PlayerStats,
    #[serde(default)]
    pub inventory: Vec<Item>,
    #[serde(default = "empty_equipment")]
    pub equipped_items: BTreeMap<EquipmentSlot, Option<ItemId>>,
    #[serde(default)]
    pub player_skills: Vec<Skill>,
    #[serde(default)]
    pub all_quests: Vec<Quest>,
    #[serde(default)]
    pub discovered_npcs: Vec<NpcTemplate>,
    #[serde(default)]
    pub discovered_beasts: Vec<Beast>,
    #[serde(default)]
    pub discovered_locations: Vec<Location>,
    #[serde(default)]
    pub discovered_factions: Vec<Faction>,
    #[serde(default)]
    pub discovered_regions: Vec<Region>,
    /// Realm names from lowest to highest.
    #[serde(default)]
    pub realm_progression: Vec<String>,
    #[serde(default)]
    pub world_lore: Vec<WorldLoreEntry>,
    pub world_config: Option<WorldSettings>,
    pub world_date: WorldDate,
    #[serde(default)]
    pub world_events: Vec<WorldEvent>,
    #[serde(default)]
    pub world_bulletin: Vec<BulletinEntry>,
    #[serde(default)]
    pub player_mailbox: Vec<Mail>,
    #[serde(default)]
    pub companions: Vec<Companion>,
    pub master: Option<Master>,
    #[serde(default)]
    pub user_rules: Vec<UserRule>,
    pub current_location_id: Option<LocationId>,
    pub player_avatar_url: Option<String>,
    pub rag_vector_store: Option<VectorStore>,
    pub auction_state: Option<ItemAuctionState>,
    pub slave_auction_state: Option<SlaveAuctionState>,
    pub pending_combat: Option<PendingCombat>,
    pub post_combat_state: Option<CombatEndPayload>,
    #[serde(default)]
    pub pagination: PageLedger,
    #[serde(default)]
    pub auto_save: AutoSaveSlots,
    pub manual_save_id: Option<SaveId>,
    pub manual_save_name: Option<String>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            player_stats: PlayerStats::default(),
            inventory: Vec::new(),
            equipped_items: empty_equipment(),
            player_skills: Vec::new(),
            all_quests: Vec::new(),
            discovered_npcs: Vec::new(),
            discovered_beasts: Vec::new(),
            discovered_locations: Vec::new(),
            discovered_factions: Vec::new(),
            discovered_regions: Vec::new(),
            realm_progression: Vec::new(),
            world_lore: Vec::new(),
            world_config: None,
            world_date: WorldDate::default(),
            world_events: Vec::new(),
            world_bulletin: Vec::new(),
            player_mailbox: Vec::new(),
            companions: Vec::new(),
            master: None,
            user_rules: Vec::new(),
            current_location_id: None,
            player_avatar_url: None,
            rag_vector_store: None,
            auction_state: None,
            slave_auction_state: None,
            pending_combat: None,
            post_combat_state: None,
            pagination: PageLedger::default(),
            auto_save: AutoSaveSlots::default(),
            manual_save_id: None,
            manual_save_name: None,
        }
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the opening state of a new game.
    pub fn from_settings(settings: &WorldSettings) -> Self {
        let mut kb = Self::new();

        let stats = &mut kb.player_stats;
        stats.currency = settings.starting_currency.unwrap_or(0);
        stats.realm = settings.starting_realm.clone();
        stats.spiritual_root = settings.player_spiritual_root.clone();
        stats.special_physique = settings.player_special_physique.clone();
        if let Some(max) = settings.player_max_tho_nguyen {
            stats.max_tho_nguyen = max;
            stats.tho_nguyen = max;
        }
        if let Some(current) = settings.player_tho_nguyen {
            stats.tho_nguyen = current;
        }
        kb.player_avatar_url = settings.player_avatar_url.clone();
        kb.world_date = settings.starting_date;
        if !settings.starting_realm.is_empty() {
            kb.realm_progression.push(settings.starting_realm.clone());
        }

        kb.inventory = settings
            .starting_items
            .iter()
            .map(|start| Item {
                id: ItemId::new(),
                name: start.name.clone(),
                description: start.description.clone(),
                rarity: start.rarity,
                value: start.value,
                quantity: start.quantity.max(1),
                item_realm: None,
                kind: start.kind.clone(),
            })
            .collect();

        kb.player_skills = settings
            .starting_skills
            .iter()
            .map(|start| {
                let mut skill = Skill::new(start.name.clone(), start.skill_type);
                skill.description = start.description.clone();
                skill.base_damage = start.base_damage;
                skill.healing_amount = start.healing_amount;
                skill.mana_cost = start.mana_cost;
                skill.cooldown = start.cooldown;
                skill
            })
            .collect();

        kb.discovered_locations = settings
            .starting_locations
            .iter()
            .map(|start| {
                let mut location = Location::new(start.name.clone(), start.location_type);
                location.description = start.description.clone();
                location.is_safe_zone = start.is_safe_zone;
                location.map_x = start.map_x;
                location.map_y = start.map_y;
                location
            })
            .collect();
        kb.current_location_id = kb.discovered_locations.first().map(|l| l.id.clone());
        if let Some(first) = kb.discovered_locations.first_mut() {
            first.visited = true;
        }

        kb.discovered_npcs = settings
            .starting_npcs
            .iter()
            .map(|start| {
                let mut npc = NpcTemplate::new(start.name.clone());
                npc.description = start.details.clone();
                npc.personality_traits = start
                    .personality
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                npc.affinity = start.initial_affinity.clamp(-100, 100);
                npc.gender = start.gender;
                npc.race = Some(start.race.clone());
                npc.realm = start.realm.clone();
                npc.talent = start.talent;
                npc.location_id = kb.current_location_id.clone();
                npc.dynamic_state = Some(NpcDynamicState {
                    alignment: start.alignment.unwrap_or_default(),
                    mood: start.mood.unwrap_or_default(),
                    current_goal: start.goal.clone().unwrap_or_default(),
                    secret: start.secret.clone().unwrap_or_default(),
                    current_location_id: kb.current_location_id.clone(),
                    ..Default::default()
                });
                npc
            })
            .collect();

        kb.discovered_beasts = settings
            .starting_beasts
            .iter()
            .map(|start| Beast {
                id: BeastId::new(),
                name: start.name.clone(),
                species: start.species.clone(),
                description: start.description.clone(),
                is_hostile: start.is_hostile,
                realm: start.realm.clone(),
                location_id: None,
            })
            .collect();

        kb.discovered_factions = settings
            .starting_factions
            .iter()
            .map(|start| {
                let mut faction = Faction::new(start.name.clone(), start.alignment);
                faction.description = start.description.clone();
                faction.player_reputation = start.initial_player_reputation.clamp(-100, 100);
                faction
            })
            .collect();

        kb.world_lore = settings
            .starting_lore
            .iter()
            .map(|start| WorldLoreEntry {
                id: LoreId::new(),
                title: start.title.clone(),
                content: start.content.clone(),
            })
            .collect();

        let today = kb.world_date;
        kb.world_events = settings
            .starting_events
            .iter()
            .map(|start| {
                let keyword = start.location_keyword.to_lowercase();
                let location_id = kb
                    .discovered_locations
                    .iter()
                    .find(|l| !keyword.is_empty() && l.name.to_lowercase().contains(&keyword))
                    .map(|l| l.id.clone());
                let start_date = today.add_days(start.delay_days);
                let mut event = WorldEvent {
                    id: EventId::new(),
                    name: start.name.clone(),
                    event_type: start.event_type,
                    current_phase: EventPhase::Pending,
                    phase_description: start.description.clone(),
                    location_id,
                    factions_involved: Vec::new(),
                    start_date,
                    end_date: start_date.add_days(start.duration_days),
                };
                event.current_phase = event.phase_on(&today);
                event
            })
            .collect();

        kb.world_config = Some(settings.clone());
        kb
    }

    /// Check every structural invariant. An empty result means the state is sound.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if !self.auto_save.is_well_formed() {
            violations.push(InvariantViolation::AutoSaveRingMalformed);
        }

        for slot in EquipmentSlot::ALL {
            match self.equipped_items.get(&slot) {
                None => violations.push(InvariantViolation::MissingEquipmentSlot(slot)),
                Some(Some(item_id)) if !self.is_item_accounted(item_id) => {
                    violations.push(InvariantViolation::EquippedItemMissing {
                        slot,
                        item_id: item_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if !self.world_date.is_valid() {
            violations.push(InvariantViolation::InvalidWorldDate(self.world_date));
        }

        if let Some(store) = &self.rag_vector_store {
            if let Err(e) = store.validate() {
                violations.push(InvariantViolation::VectorStore(e));
            }
        }

        violations
    }

    /// An item is accounted for if the player holds it or a companion wears it.
    fn is_item_accounted(&self, item_id: &ItemId) -> bool {
        self.find_item(item_id).is_some()
            || self.companions.iter().any(|c| {
                c.equipped_items()
                    .map(|slots| slots.values().any(|v| v.as_ref() == Some(item_id)))
                    .unwrap_or(false)
            })
    }

    /// Move the world date forward by `days`.
    pub fn advance_date(&mut self, days: u32) {
        self.world_date = self.world_date.add_days(days);
        let today = self.world_date;
        for event in &mut self.world_events {
            event.current_phase = event.phase_on(&today);
        }
    }

    /// Set the world date, refusing to move it backwards.
    pub fn set_date(&mut self, date: WorldDate) -> Result<(), DateError> {
        if !date.is_valid() {
            return Err(DateError::Invalid {
                day: date.day,
                month: date.month,
                year: date.year,
            });
        }
        if date < self.world_date {
            return Err(DateError::Regression {
                from: self.world_date,
                to: date,
            });
        }
        let days = self.world_date.days_until(&date);
        self.advance_date(u32::try_from(days).unwrap_or(u32::MAX));
        Ok(())
    }

    pub fn find_item(&self, id: &ItemId) -> Option<&Item> {
        self.inventory.iter().find(|i| &i.id == id)
    }

    pub fn find_item_by_name(&self, name: &str) -> Option<&Item> {
        self.inventory
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    /// Add an item, stacking onto an existing item with the same name and kind.
    pub fn add_item(&mut self, item: Item) -> ItemId {
        if let Some(existing) = self
            .inventory
            .iter_mut()
            .find(|i| i.name == item.name && i.kind == item.kind)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return existing.id.clone();
        }
        let id = item.id.clone();
        self.inventory.push(item);
        id
    }

    /// Remove `quantity` units of an item. Unequips it when the stack is gone.
    ///
    /// Returns the removed units as an item, or `None` if not enough are held.
    pub fn remove_item(&mut self, id: &ItemId, quantity: u32) -> Option<Item> {
        let pos = self.inventory.iter().position(|i| &i.id == id)?;
        if self.inventory[pos].quantity < quantity || quantity == 0 {
            return None;
        }
        if self.inventory[pos].quantity == quantity {
            for slot in self.equipped_items.values_mut() {
                if slot.as_ref() == Some(id) {
                    *slot = None;
                }
            }
            return Some(self.inventory.remove(pos));
        }
        let stack = &mut self.inventory[pos];
        stack.quantity -= quantity;
        let mut taken = stack.clone();
        taken.quantity = quantity;
        Some(taken)
    }

    /// Equip an inventory item, returning whatever the slot held before.
    pub fn equip(&mut self, slot: EquipmentSlot, item_id: &ItemId) -> Result<Option<ItemId>, EquipError> {
        let item = self
            .find_item(item_id)
            .ok_or_else(|| EquipError::NotInInventory(item_id.clone()))?;
        if !item.is_equippable_in(slot) {
            return Err(EquipError::WrongSlot {
                item_id: item_id.clone(),
                slot,
            });
        }
        Ok(self
            .equipped_items
            .insert(slot, Some(item_id.clone()))
            .flatten())
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<ItemId> {
        self.equipped_items.get_mut(&slot).and_then(Option::take)
    }

    pub fn find_npc(&self, id: &NpcId) -> Option<&NpcTemplate> {
        self.discovered_npcs.iter().find(|n| &n.id == id)
    }

    pub fn find_npc_mut(&mut self, id: &NpcId) -> Option<&mut NpcTemplate> {
        self.discovered_npcs.iter_mut().find(|n| &n.id == id)
    }

    /// Remove an NPC and any retrieval vectors describing it.
    pub fn remove_npc(&mut self, id: &NpcId) -> Option<NpcTemplate> {
        let pos = self.discovered_npcs.iter().position(|n| &n.id == id)?;
        if let Some(store) = &mut self.rag_vector_store {
            store.remove_entity(id.as_str());
        }
        Some(self.discovered_npcs.remove(pos))
    }

    pub fn find_location(&self, id: &LocationId) -> Option<&Location> {
        self.discovered_locations.iter().find(|l| &l.id == id)
    }

    pub fn find_location_by_name(&self, name: &str) -> Option<&Location> {
        self.discovered_locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn current_location(&self) -> Option<&Location> {
        self.current_location_id
            .as_ref()
            .and_then(|id| self.find_location(id))
    }

    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.all_quests
            .iter()
            .filter(|q| q.status == QuestStatus::Active)
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &UserRule> {
        self.user_rules.iter().filter(|r| r.is_active)
    }

    /// Name of the entity an [`EntityRef`](crate::entities::EntityRef) points at, if known.
    pub fn entity_name(&self, entity_type: EntityType, id: &str) -> Option<&str> {
        match entity_type {
            EntityType::Item => self
                .inventory
                .iter()
                .find(|i| i.id.as_str() == id)
                .map(|i| i.name.as_str()),
            EntityType::Skill => self
                .player_skills
                .iter()
                .find(|s| s.id.as_str() == id)
                .map(|s| s.name.as_str()),
            EntityType::Quest => self
                .all_quests
                .iter()
                .find(|q| q.id.as_str() == id)
                .map(|q| q.title.as_str()),
            EntityType::Npc => self
                .discovered_npcs
                .iter()
                .find(|n| n.id.as_str() == id)
                .map(|n| n.name.as_str()),
            EntityType::Location => self
                .discovered_locations
                .iter()
                .find(|l| l.id.as_str() == id)
                .map(|l| l.name.as_str()),
            EntityType::Lore => self
                .world_lore
                .iter()
                .find(|l| l.id.as_str() == id)
                .map(|l| l.title.as_str()),
            EntityType::Faction => self
                .discovered_factions
                .iter()
                .find(|f| f.id.as_str() == id)
                .map(|f| f.name.as_str()),
            EntityType::YeuThu => self
                .discovered_beasts
                .iter()
                .find(|b| b.id.as_str() == id)
                .map(|b| b.name.as_str()),
            EntityType::Wife | EntityType::Slave | EntityType::Prisoner => self
                .companions
                .iter()
                .find(|c| c.id().as_str() == id)
                .map(|c| c.person().name.as_str()),
            EntityType::Master => self
                .master
                .as_ref()
                .filter(|m| m.person.id.as_str() == id)
                .map(|m| m.person.name.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EquipmentType, ItemKind, LocationType, MaterialType, StatBonuses};
    use crate::settings::{StartingEvent, StartingItem, StartingLocation, StartingNpc};

    fn sword() -> Item {
        Item::new(
            "Azure Sword",
            ItemKind::Equipment {
                equipment_type: EquipmentType::Weapon,
                stat_bonuses: StatBonuses::default(),
                unique_effects: vec![],
            },
        )
    }

    fn herb(quantity: u32) -> Item {
        Item::new(
            "Spirit Herb",
            ItemKind::Material {
                material_type: MaterialType::SpiritHerb,
            },
        )
        .with_quantity(quantity)
    }

    #[test]
    fn test_new_knowledge_base_is_sound() {
        let kb = KnowledgeBase::new();
        assert!(kb.check_invariants().is_empty());
        assert_eq!(kb.equipped_items.len(), EquipmentSlot::ALL.len());
    }

    #[test]
    fn test_from_settings_builds_world() {
        let mut settings = WorldSettings::new("Journey", "Lâm Phong");
        settings.starting_currency = Some(100);
        settings.starting_items.push(StartingItem {
            name: "Old Map".into(),
            description: String::new(),
            quantity: 0,
            rarity: Default::default(),
            value: 5,
            kind: ItemKind::Miscellaneous {
                usable: true,
                consumable: false,
            },
        });
        settings.starting_locations.push(StartingLocation {
            name: "Thanh Vân Village".into(),
            description: String::new(),
            is_safe_zone: true,
            location_type: LocationType::Village,
            map_x: None,
            map_y: None,
        });
        settings.starting_npcs.push(StartingNpc {
            name: "Elder Mo".into(),
            personality: "stern, kind".into(),
            initial_affinity: 250,
            details: String::new(),
            gender: Default::default(),
            race: "Human".into(),
            realm: None,
            talent: None,
            alignment: None,
            mood: None,
            goal: None,
            secret: None,
        });
        settings.starting_events.push(StartingEvent {
            name: "Harvest Festival".into(),
            event_type: WorldEventType::Opportunity,
            description: String::new(),
            location_keyword: "thanh vân".into(),
            delay_days: 3,
            duration_days: 2,
        });

        let kb = KnowledgeBase::from_settings(&settings);

        assert_eq!(kb.player_stats.currency, 100);
        assert_eq!(kb.inventory[0].quantity, 1);
        let village = kb.current_location().unwrap();
        assert!(village.visited);
        assert_eq!(kb.discovered_npcs[0].affinity, 100);
        assert_eq!(kb.discovered_npcs[0].personality_traits, vec!["stern", "kind"]);
        assert_eq!(kb.world_events[0].location_id.as_ref(), Some(&village.id));
        assert_eq!(kb.world_events[0].current_phase, EventPhase::Pending);
        assert!(kb.check_invariants().is_empty());
    }

    #[test]
    fn test_equip_requires_matching_slot() {
        let mut kb = KnowledgeBase::new();
        let id = kb.add_item(sword());

        assert!(matches!(
            kb.equip(EquipmentSlot::Head, &id),
            Err(EquipError::WrongSlot { .. })
        ));
        assert_eq!(kb.equip(EquipmentSlot::MainWeapon, &id).unwrap(), None);
        assert!(kb.check_invariants().is_empty());
    }

    #[test]
    fn test_removing_equipped_item_unequips_it() {
        let mut kb = KnowledgeBase::new();
        let id = kb.add_item(sword());
        kb.equip(EquipmentSlot::MainWeapon, &id).unwrap();

        kb.remove_item(&id, 1).unwrap();
        assert_eq!(kb.equipped_items[&EquipmentSlot::MainWeapon], None);
        assert!(kb.check_invariants().is_empty());
    }

    #[test]
    fn test_dangling_equipment_is_reported() {
        let mut kb = KnowledgeBase::new();
        let ghost = ItemId::from("item-ghost");
        kb.equipped_items.insert(EquipmentSlot::Head, Some(ghost.clone()));
        assert_eq!(
            kb.check_invariants(),
            vec![InvariantViolation::EquippedItemMissing {
                slot: EquipmentSlot::Head,
                item_id: ghost
            }]
        );
    }

    #[test]
    fn test_add_item_stacks_and_remove_splits() {
        let mut kb = KnowledgeBase::new();
        let id = kb.add_item(herb(3));
        let same = kb.add_item(herb(2));
        assert_eq!(id, same);
        assert_eq!(kb.find_item(&id).unwrap().quantity, 5);

        let taken = kb.remove_item(&id, 2).unwrap();
        assert_eq!(taken.quantity, 2);
        assert_eq!(kb.find_item(&id).unwrap().quantity, 3);
        assert!(kb.remove_item(&id, 10).is_none());
    }

    #[test]
    fn test_stacking_saturates_quantity() {
        let mut kb = KnowledgeBase::new();
        let id = kb.add_item(herb(u32::MAX));
        kb.add_item(herb(u32::MAX));
        assert_eq!(kb.find_item(&id).unwrap().quantity, u32::MAX);
        assert_eq!(kb.inventory.len(), 1);
    }

    #[test]
    fn test_world_date_never_moves_backwards() {
        let mut kb = KnowledgeBase::new();
        kb.advance_date(45);
        assert_eq!(kb.world_date, WorldDate::new(16, 2, 1).unwrap());

        let earlier = WorldDate::new(1, 1, 1).unwrap();
        assert!(matches!(kb.set_date(earlier), Err(DateError::Regression { .. })));

        let later = WorldDate::new(1, 3, 1).unwrap();
        kb.set_date(later).unwrap();
        assert_eq!(kb.world_date, later);
    }

    #[test]
    fn test_entity_name_lookup() {
        let mut kb = KnowledgeBase::new();
        let npc = NpcTemplate::new("Elder Mo");
        let id = npc.id.clone();
        kb.discovered_npcs.push(npc);
        assert_eq!(kb.entity_name(EntityType::Npc, id.as_str()), Some("Elder Mo"));
        assert_eq!(kb.entity_name(EntityType::Item, id.as_str()), None);
    }
}
