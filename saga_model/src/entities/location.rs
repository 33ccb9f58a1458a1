//! Locations, regions and factions.

use serde::{Deserialize, Serialize};

use super::{FactionId, LocationId, NpcId, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationType {
    Village,
    Town,
    City,
    Capital,
    SectOrClan,
    Forest,
    Mountain,
    Cave,
    Dungeon,
    Ruin,
    RiverOrLake,
    Landmark,
    Marketplace,
    ShoppingCenter,
    AuctionHouse,
    SlaveMarket,
    SlaveAuction,
    #[default]
    Default,
}

impl LocationType {
    /// Whether the location hosts a market the economy modals can open.
    pub fn is_economy(&self) -> bool {
        matches!(
            self,
            LocationType::Marketplace
                | LocationType::ShoppingCenter
                | LocationType::AuctionHouse
                | LocationType::SlaveMarket
                | LocationType::SlaveAuction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConnection {
    pub target_location_id: LocationId,
    pub is_discovered: bool,
    pub travel_time_turns: Option<u32>,
}

/// A discovered location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub location_type: LocationType,
    pub region_id: Option<RegionId>,
    pub is_safe_zone: bool,
    #[serde(default)]
    pub visited: bool,
    pub map_x: Option<i32>,
    pub map_y: Option<i32>,
    pub owner_faction_id: Option<FactionId>,
    #[serde(default)]
    pub connections: Vec<LocationConnection>,
}

impl Location {
    pub fn new(name: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            description: String::new(),
            location_type,
            region_id: None,
            is_safe_zone: false,
            visited: false,
            map_x: None,
            map_y: None,
            owner_faction_id: None,
            connections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FactionAlignment {
    Righteous,
    #[default]
    Neutral,
    Evil,
    Chaotic,
}

/// A sect, clan or other organisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub description: String,
    pub alignment: FactionAlignment,
    /// Player reputation with the faction, -100 to 100.
    pub player_reputation: i32,
    pub leader_npc_id: Option<NpcId>,
    pub base_location_id: Option<LocationId>,
    #[serde(default)]
    pub allied_faction_ids: Vec<FactionId>,
    #[serde(default)]
    pub enemy_faction_ids: Vec<FactionId>,
}

impl Faction {
    pub fn new(name: impl Into<String>, alignment: FactionAlignment) -> Self {
        Self {
            id: FactionId::new(),
            name: name.into(),
            description: String::new(),
            alignment,
            player_reputation: 0,
            leader_npc_id: None,
            base_location_id: None,
            allied_faction_ids: Vec::new(),
            enemy_faction_ids: Vec::new(),
        }
    }
}
