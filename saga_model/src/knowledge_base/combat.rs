//! Combat hand-off payloads and auction state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{ComplexCompanion, Item, LocationId, NpcId};
use crate::mechanics::PlayerStats;

/// Opponents queued for the combat screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PendingCombat {
    pub opponent_ids: Vec<NpcId>,
    #[serde(default)]
    pub surrendered_npc_ids: Vec<NpcId>,
}

impl PendingCombat {
    pub fn new(opponent_ids: Vec<NpcId>) -> Self {
        Self {
            opponent_ids,
            surrendered_npc_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Escaped,
    Surrendered,
}

/// What the player decides to do with a defeated opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatDisposition {
    Kill,
    Capture,
    Release,
}

/// Result of a finished fight, awaiting the player's dispositions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEndPayload {
    pub outcome: CombatOutcome,
    pub summary: String,
    pub final_player_state: PlayerStats,
    #[serde(default)]
    pub dispositions: BTreeMap<NpcId, CombatDisposition>,
    pub opponent_ids: Vec<NpcId>,
}

impl CombatEndPayload {
    /// Whether the player gets to decide the fate of the opponents.
    pub fn awaits_dispositions(&self) -> bool {
        matches!(
            self.outcome,
            CombatOutcome::Victory | CombatOutcome::Surrendered
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionNpc {
    pub id: NpcId,
    pub name: String,
    pub realm: String,
    pub currency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionCommentary {
    pub id: String,
    pub text: String,
    pub timestamp: i64,
}

/// A lot offered at auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionLot<T> {
    pub lot: T,
    /// `"player"`, `"system"` or an NPC id.
    pub owner_id: Option<String>,
    pub starting_price: i64,
    pub current_bid: i64,
    pub buyout_price: i64,
    pub highest_bidder_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BidError {
    #[error("the auction is closed")]
    Closed,
    #[error("no lot is currently on the block")]
    NoLot,
    #[error("bid {bid} does not beat the current bid {current}")]
    TooLow { bid: i64, current: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionState<T> {
    pub is_open: bool,
    pub items: Vec<AuctionLot<T>>,
    #[serde(default)]
    pub auction_npcs: Vec<AuctionNpc>,
    pub current_item_index: usize,
    #[serde(default)]
    pub auctioneer_commentary: Vec<AuctionCommentary>,
    pub last_bid_time: i64,
    pub auctioneer_call_count: u32,
    pub location_id: LocationId,
}

pub type ItemAuctionState = AuctionState<Item>;
pub type SlaveAuctionState = AuctionState<ComplexCompanion>;

impl<T> AuctionState<T> {
    /// A closed auction with no lots.
    pub fn new(location_id: LocationId) -> Self {
        Self {
            is_open: false,
            items: Vec::new(),
            auction_npcs: Vec::new(),
            current_item_index: 0,
            auctioneer_commentary: Vec::new(),
            last_bid_time: 0,
            auctioneer_call_count: 0,
            location_id,
        }
    }

    pub fn current_lot(&self) -> Option<&AuctionLot<T>> {
        self.items.get(self.current_item_index)
    }

    /// Record a bid on the current lot. Resets the auctioneer's call count.
    pub fn place_bid(&mut self, bidder_id: &str, amount: i64, now: i64) -> Result<(), BidError> {
        if !self.is_open {
            return Err(BidError::Closed);
        }
        let lot = self
            .items
            .get_mut(self.current_item_index)
            .ok_or(BidError::NoLot)?;
        let floor = lot.current_bid.max(lot.starting_price - 1);
        if amount <= floor {
            return Err(BidError::TooLow {
                bid: amount,
                current: lot.current_bid,
            });
        }
        lot.current_bid = amount;
        lot.highest_bidder_id = Some(bidder_id.to_string());
        self.last_bid_time = now;
        self.auctioneer_call_count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ItemKind, MaterialType};

    fn auction() -> ItemAuctionState {
        AuctionState {
            is_open: true,
            items: vec![AuctionLot {
                lot: Item::new(
                    "Dragon Scale",
                    ItemKind::Material {
                        material_type: MaterialType::BeastHideOrBone,
                    },
                ),
                owner_id: Some("system".into()),
                starting_price: 100,
                current_bid: 0,
                buyout_price: 1000,
                highest_bidder_id: None,
            }],
            auction_npcs: vec![],
            current_item_index: 0,
            auctioneer_commentary: vec![],
            last_bid_time: 0,
            auctioneer_call_count: 2,
            location_id: LocationId::from("loc-auction"),
        }
    }

    #[test]
    fn test_bid_must_reach_starting_price() {
        let mut state = auction();
        assert!(matches!(state.place_bid("player", 50, 1), Err(BidError::TooLow { .. })));
        state.place_bid("player", 100, 1).unwrap();
        assert_eq!(state.current_lot().unwrap().current_bid, 100);
        assert_eq!(state.auctioneer_call_count, 0);
    }

    #[test]
    fn test_bid_must_beat_current() {
        let mut state = auction();
        state.place_bid("npc-a", 150, 1).unwrap();
        assert!(state.place_bid("player", 150, 2).is_err());
        state.place_bid("player", 151, 2).unwrap();
        assert_eq!(
            state.current_lot().unwrap().highest_bidder_id.as_deref(),
            Some("player")
        );
    }

    #[test]
    fn test_closed_auction_rejects_bids() {
        let mut state = auction();
        state.is_open = false;
        assert_eq!(state.place_bid("player", 500, 1), Err(BidError::Closed));
    }
}
