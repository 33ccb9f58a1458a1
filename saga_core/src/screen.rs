//! Screen and modal state.
//!
//! Exactly one [`GameScreen`] is active at a time. Modals are independent
//! state layered on top and never change the active screen. Entering combat
//! or an auction is an explicit navigation guarded by the data it needs; the
//! post-combat modal is derived from `post_combat_state` alone.

use saga_model::{
    CombatEndPayload, CombatOutcome, EntityRef, KnowledgeBase, LocationId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameScreen {
    #[default]
    Initial,
    GameSetup,
    Gameplay,
    Combat,
    ApiSettings,
    LoadGameSelection,
    StorageSettings,
    ImportExport,
    Equipment,
    Map,
    Auction,
    Cultivation,
    CompanionManagement,
    PrisonerManagement,
    CompanionEquipment,
    SlaveAuction,
    Rules,
    SpiritCauldron,
    EventHub,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("combat screen requires a pending combat")]
    CombatNotPending,

    #[error("no item auction is open")]
    AuctionNotOpen,

    #[error("no slave auction is open")]
    SlaveAuctionNotOpen,

    #[error("location {0} has no market")]
    NotAMarket(LocationId),

    #[error("the slave market is not open")]
    SlaveMarketNotOpen,
}

/// Marketplace-style modals, each bound to the location it was opened at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EconomyModal {
    Marketplace { location_id: LocationId },
    ShoppingCenter { location_id: LocationId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

/// A transient toast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }
}

/// Busy flags and session-wide status messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub is_initial_loading: bool,
    pub is_loading_api: bool,
    pub is_crafting_item: bool,
    pub is_uploading_avatar: bool,
    pub is_summarizing: bool,
    pub storage_init_error: Option<String>,
    pub api_error: Option<String>,
    pub notification: Option<Notification>,
}

impl StatusFlags {
    /// Name of the operation currently in flight, if any.
    pub fn busy_reason(&self) -> Option<&'static str> {
        if self.is_initial_loading {
            Some("initial loading")
        } else if self.is_loading_api {
            Some("AI request")
        } else if self.is_crafting_item {
            Some("item crafting")
        } else if self.is_uploading_avatar {
            Some("avatar upload")
        } else if self.is_summarizing {
            Some("page summary")
        } else {
            None
        }
    }
}

/// What fills the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Loading,
    /// Blocks everything until the user opens the storage settings.
    StorageError { message: String },
    Screen(GameScreen),
}

/// Layers drawn over the active screen, bottom first.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay<'a> {
    Notification(&'a Notification),
    ApiErrorBanner(&'a str),
    CraftingBanner,
    PostCombat(&'a CombatEndPayload),
    Economy(&'a EconomyModal),
    SlaveMarket(&'a LocationId),
    StyleSettings,
    EntityDetail(&'a EntityRef),
}

/// The active screen plus modal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenController {
    current: GameScreen,
    economy: Option<EconomyModal>,
    slave_market: Option<LocationId>,
    style_settings_open: bool,
    selected_entity: Option<EntityRef>,
}

impl ScreenController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GameScreen {
        self.current
    }

    /// Switch the active screen, checking the data the target needs.
    pub fn navigate(&mut self, screen: GameScreen, kb: &KnowledgeBase) -> Result<(), NavigationError> {
        match screen {
            GameScreen::Combat if kb.pending_combat.is_none() => {
                return Err(NavigationError::CombatNotPending)
            }
            GameScreen::Auction if !kb.auction_state.as_ref().is_some_and(|a| a.is_open) => {
                return Err(NavigationError::AuctionNotOpen)
            }
            GameScreen::SlaveAuction
                if !kb.slave_auction_state.as_ref().is_some_and(|a| a.is_open) =>
            {
                return Err(NavigationError::SlaveAuctionNotOpen)
            }
            _ => {}
        }
        tracing::debug!(from = ?self.current, to = ?screen, "navigate");
        self.current = screen;
        Ok(())
    }

    /// Open a market modal. The location must be a market of the matching kind.
    pub fn open_economy(&mut self, modal: EconomyModal, kb: &KnowledgeBase) -> Result<(), NavigationError> {
        let location_id = match &modal {
            EconomyModal::Marketplace { location_id }
            | EconomyModal::ShoppingCenter { location_id } => location_id,
        };
        let is_market = kb
            .find_location(location_id)
            .is_some_and(|l| l.location_type.is_economy());
        if !is_market {
            return Err(NavigationError::NotAMarket(location_id.clone()));
        }
        self.economy = Some(modal);
        Ok(())
    }

    pub fn close_economy(&mut self) {
        self.economy = None;
    }

    pub fn economy(&self) -> Option<&EconomyModal> {
        self.economy.as_ref()
    }

    pub fn open_slave_market(&mut self, location_id: LocationId) {
        self.slave_market = Some(location_id);
    }

    pub fn slave_market(&self) -> Option<&LocationId> {
        self.slave_market.as_ref()
    }

    pub fn close_slave_market(&mut self) {
        self.slave_market = None;
    }

    pub fn set_style_settings_open(&mut self, open: bool) {
        self.style_settings_open = open;
    }

    pub fn select_entity(&mut self, entity: EntityRef) {
        self.selected_entity = Some(entity);
    }

    pub fn close_entity_detail(&mut self) {
        self.selected_entity = None;
    }

    pub fn selected_entity(&self) -> Option<&EntityRef> {
        self.selected_entity.as_ref()
    }

    /// Close every modal. The active screen is unchanged.
    pub fn close_all_modals(&mut self) {
        self.economy = None;
        self.slave_market = None;
        self.style_settings_open = false;
        self.selected_entity = None;
    }

    pub fn surface(&self, status: &StatusFlags) -> Surface {
        if status.is_initial_loading {
            return Surface::Loading;
        }
        match &status.storage_init_error {
            Some(message) if self.current != GameScreen::StorageSettings => Surface::StorageError {
                message: message.clone(),
            },
            _ => Surface::Screen(self.current),
        }
    }

    /// Overlays to draw, bottom first. Entity detail is always on top.
    pub fn overlays<'a>(&'a self, kb: &'a KnowledgeBase, status: &'a StatusFlags) -> Vec<Overlay<'a>> {
        let mut overlays = Vec::new();

        if let Some(notification) = &status.notification {
            overlays.push(Overlay::Notification(notification));
        }
        if let Some(error) = &status.api_error {
            if self.current == GameScreen::Gameplay {
                overlays.push(Overlay::ApiErrorBanner(error));
            }
        }
        if status.is_crafting_item {
            overlays.push(Overlay::CraftingBanner);
        }
        if let Some(payload) = &kb.post_combat_state {
            if matches!(
                payload.outcome,
                CombatOutcome::Victory | CombatOutcome::Surrendered
            ) {
                overlays.push(Overlay::PostCombat(payload));
            }
        }
        if let Some(modal) = &self.economy {
            overlays.push(Overlay::Economy(modal));
        }
        if let Some(location_id) = &self.slave_market {
            overlays.push(Overlay::SlaveMarket(location_id));
        }
        if self.style_settings_open {
            overlays.push(Overlay::StyleSettings);
        }
        if let Some(entity) = &self.selected_entity {
            overlays.push(Overlay::EntityDetail(entity));
        }

        overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_model::{
        EntityType, ItemAuctionState, Location, LocationType, PendingCombat, PlayerStats,
    };
    use std::collections::BTreeMap;

    fn market_kb() -> (KnowledgeBase, LocationId) {
        let mut kb = KnowledgeBase::new();
        let market = Location::new("Vạn Bảo Lâu", LocationType::Marketplace);
        let id = market.id.clone();
        kb.discovered_locations.push(market);
        (kb, id)
    }

    fn payload(outcome: CombatOutcome) -> CombatEndPayload {
        CombatEndPayload {
            outcome,
            summary: String::new(),
            final_player_state: PlayerStats::default(),
            dispositions: BTreeMap::new(),
            opponent_ids: Vec::new(),
        }
    }

    #[test]
    fn test_starts_on_initial_screen() {
        let screens = ScreenController::new();
        assert_eq!(screens.current(), GameScreen::Initial);
        assert_eq!(
            screens.surface(&StatusFlags::default()),
            Surface::Screen(GameScreen::Initial)
        );
    }

    #[test]
    fn test_modals_never_change_active_screen() {
        let (kb, market) = market_kb();
        let mut screens = ScreenController::new();
        screens.navigate(GameScreen::Map, &kb).unwrap();

        screens
            .open_economy(EconomyModal::Marketplace { location_id: market.clone() }, &kb)
            .unwrap();
        screens.open_slave_market(market);
        screens.set_style_settings_open(true);
        screens.select_entity(EntityRef::new(EntityType::Npc, "npc-1"));
        assert_eq!(screens.current(), GameScreen::Map);

        screens.close_all_modals();
        assert_eq!(screens.current(), GameScreen::Map);
    }

    #[test]
    fn test_combat_requires_pending_combat() {
        let mut kb = KnowledgeBase::new();
        let mut screens = ScreenController::new();
        assert_eq!(
            screens.navigate(GameScreen::Combat, &kb),
            Err(NavigationError::CombatNotPending)
        );
        assert_eq!(screens.current(), GameScreen::Initial);

        kb.pending_combat = Some(PendingCombat::default());
        screens.navigate(GameScreen::Combat, &kb).unwrap();
        assert_eq!(screens.current(), GameScreen::Combat);
    }

    #[test]
    fn test_auction_requires_open_auction() {
        let (mut kb, market) = market_kb();
        let mut screens = ScreenController::new();
        assert_eq!(
            screens.navigate(GameScreen::Auction, &kb),
            Err(NavigationError::AuctionNotOpen)
        );

        let mut auction = ItemAuctionState::new(market);
        auction.is_open = true;
        kb.auction_state = Some(auction);
        assert!(screens.navigate(GameScreen::Auction, &kb).is_ok());
        assert_eq!(
            screens.navigate(GameScreen::SlaveAuction, &kb),
            Err(NavigationError::SlaveAuctionNotOpen)
        );
    }

    #[test]
    fn test_economy_modal_needs_a_market() {
        let mut kb = KnowledgeBase::new();
        let village = Location::new("Thanh Vân", LocationType::Village);
        let id = village.id.clone();
        kb.discovered_locations.push(village);

        let mut screens = ScreenController::new();
        assert_eq!(
            screens.open_economy(EconomyModal::ShoppingCenter { location_id: id.clone() }, &kb),
            Err(NavigationError::NotAMarket(id))
        );
        assert!(screens.economy().is_none());
    }

    #[test]
    fn test_storage_error_blocks_until_settings() {
        let kb = KnowledgeBase::new();
        let mut screens = ScreenController::new();
        let status = StatusFlags {
            storage_init_error: Some("disk full".into()),
            ..Default::default()
        };
        assert_eq!(
            screens.surface(&status),
            Surface::StorageError {
                message: "disk full".into()
            }
        );

        screens.navigate(GameScreen::StorageSettings, &kb).unwrap();
        assert_eq!(
            screens.surface(&status),
            Surface::Screen(GameScreen::StorageSettings)
        );

        let loading = StatusFlags {
            is_initial_loading: true,
            ..status
        };
        assert_eq!(screens.surface(&loading), Surface::Loading);
    }

    #[test]
    fn test_overlay_order() {
        let (mut kb, market) = market_kb();
        kb.post_combat_state = Some(payload(CombatOutcome::Victory));

        let mut screens = ScreenController::new();
        screens.navigate(GameScreen::Gameplay, &kb).unwrap();
        screens.select_entity(EntityRef::new(EntityType::Location, market.as_str()));
        screens.set_style_settings_open(true);
        screens
            .open_economy(EconomyModal::Marketplace { location_id: market.clone() }, &kb)
            .unwrap();
        screens.open_slave_market(market);

        let status = StatusFlags {
            is_crafting_item: true,
            api_error: Some("timeout".into()),
            notification: Some(Notification::info("saved")),
            ..Default::default()
        };
        let overlays = screens.overlays(&kb, &status);
        assert_eq!(overlays.len(), 8);
        assert!(matches!(overlays[0], Overlay::Notification(_)));
        assert_eq!(overlays[1], Overlay::ApiErrorBanner("timeout"));
        assert_eq!(overlays[2], Overlay::CraftingBanner);
        assert!(matches!(overlays[3], Overlay::PostCombat(_)));
        assert!(matches!(overlays[4], Overlay::Economy(_)));
        assert!(matches!(overlays[5], Overlay::SlaveMarket(_)));
        assert_eq!(overlays[6], Overlay::StyleSettings);
        assert!(matches!(overlays[7], Overlay::EntityDetail(_)));
    }

    #[test]
    fn test_api_banner_only_on_gameplay_and_defeat_has_no_modal() {
        let mut kb = KnowledgeBase::new();
        kb.post_combat_state = Some(payload(CombatOutcome::Defeat));
        let screens = ScreenController::new();
        let status = StatusFlags {
            api_error: Some("timeout".into()),
            ..Default::default()
        };
        assert!(screens.overlays(&kb, &status).is_empty());
    }

    #[test]
    fn test_busy_reason() {
        assert_eq!(StatusFlags::default().busy_reason(), None);
        let status = StatusFlags {
            is_uploading_avatar: true,
            ..Default::default()
        };
        assert_eq!(status.busy_reason(), Some("avatar upload"));
    }
}
