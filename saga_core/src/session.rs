//! The running game.
//!
//! A [`GameSession`] owns the knowledge base, the message log, the turn
//! history and the screen state of one game. Every change goes through one of
//! its action methods; there is no shared global state.
//!
//! Turns run in two phases. [`GameSession::begin_action`] snapshots what the
//! narrator needs and hands back a [`PendingTurn`]; once the AI answers,
//! [`GameSession::complete_action`] applies the response, unless a new game,
//! a load or a rollback happened in between, in which case the response is
//! discarded untouched.

use std::collections::BTreeMap;

use saga_model::{
    AuctionState, CombatDisposition, CombatEndPayload, Companion, CompanionId, ComplexCompanion,
    GameMessage, Item, ItemId, KnowledgeBase, MessageType, NpcId, ParsedAiResponse,
    PendingCombat, PlayerInputKind, SaveId, ValidationErrors, WorldSettings,
};
use tracing::instrument;

use crate::config::EngineConfig;
use crate::context_assembler::{query_text, AssemblerConfig, ContextAssembler, NarrativeRequest};
use crate::directives;
use crate::error::{ApiError, EconomyError, EngineError, Result};
use crate::history::{Paginator, TurnHistory};
use crate::persist::{PersistError, SaveGameData, SaveGameMeta};
use crate::ports::{CraftingRequest, Ports};
use crate::screen::{
    EconomyModal, GameScreen, NavigationError, Notification, Overlay, ScreenController,
    StatusFlags, Surface,
};

/// Bidder id used for the player in auctions.
pub const PLAYER_BIDDER_ID: &str = "player";

/// A turn waiting for the narrator's response.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub epoch: u64,
    pub turn: u32,
    pub request: NarrativeRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Applied {
        turn: u32,
        directives: usize,
        auto_save: Option<SaveId>,
    },
    /// The game moved on while the request was in flight.
    Discarded,
}

pub struct GameSession {
    config: EngineConfig,
    ports: Ports,
    knowledge_base: KnowledgeBase,
    messages: Vec<GameMessage>,
    history: TurnHistory,
    screen: ScreenController,
    status: StatusFlags,
    paginator: Paginator,
    assembler: ContextAssembler,
    turn: u32,
    /// Bumped whenever the game state is replaced wholesale.
    epoch: u64,
    has_game: bool,
}

impl GameSession {
    pub fn new(config: EngineConfig, ports: Ports) -> Self {
        let paginator = Paginator::new(config.session.page_size);
        let assembler = ContextAssembler::new(AssemblerConfig {
            recent_message_count: config.session.recent_message_count,
            rag_top_k: config.api.rag_top_k,
        });
        let history = TurnHistory::with_config(config.history.thresholds());
        Self {
            config,
            ports,
            knowledge_base: KnowledgeBase::new(),
            messages: Vec::new(),
            history,
            screen: ScreenController::new(),
            status: StatusFlags::default(),
            paginator,
            assembler,
            turn: 0,
            epoch: 0,
            has_game: false,
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn messages(&self) -> &[GameMessage] {
        &self.messages
    }

    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    pub fn screen(&self) -> &ScreenController {
        &self.screen
    }

    /// Modal state that needs no game data to change.
    pub fn screen_mut(&mut self) -> &mut ScreenController {
        &mut self.screen
    }

    pub fn status(&self) -> &StatusFlags {
        &self.status
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_turn(&self) -> u32 {
        self.turn
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn has_game(&self) -> bool {
        self.has_game
    }

    pub fn surface(&self) -> Surface {
        self.screen.surface(&self.status)
    }

    pub fn overlays(&self) -> Vec<Overlay<'_>> {
        self.screen.overlays(&self.knowledge_base, &self.status)
    }

    pub fn navigate(&mut self, screen: GameScreen) -> Result<()> {
        self.screen.navigate(screen, &self.knowledge_base)?;
        Ok(())
    }

    pub fn open_economy(&mut self, modal: EconomyModal) -> Result<()> {
        self.screen.open_economy(modal, &self.knowledge_base)?;
        Ok(())
    }

    pub fn dismiss_api_error(&mut self) {
        self.status.api_error = None;
    }

    pub fn dismiss_notification(&mut self) {
        self.status.notification = None;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Prepare the save backend. A failure blocks the UI until the storage
    /// settings are opened; it is not retried.
    pub async fn initialize_storage(&mut self) -> Result<()> {
        self.status.is_initial_loading = true;
        let result = self.ports.saves.init().await;
        self.status.is_initial_loading = false;

        match result {
            Ok(()) => {
                self.status.storage_init_error = None;
                tracing::info!("save storage ready");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(error = %message, "save storage failed to initialize");
                self.status.storage_init_error = Some(message.clone());
                Err(EngineError::StorageInit(message))
            }
        }
    }

    /// Start a new game from the setup screen.
    pub fn start_new_game(&mut self, settings: WorldSettings) -> Result<()> {
        settings.validate()?;

        let mut knowledge_base = KnowledgeBase::from_settings(&settings);
        knowledge_base.manual_save_name = Some(settings.save_game_name.clone());

        let mut history = TurnHistory::with_config(self.config.history.thresholds());
        history.record_turn(0, &knowledge_base, &[])?;

        self.knowledge_base = knowledge_base;
        self.messages = Vec::new();
        self.history = history;
        self.turn = 0;
        self.has_game = true;
        self.reset_transient_state();
        self.screen.navigate(GameScreen::Gameplay, &self.knowledge_base)?;

        tracing::info!(save_name = %settings.save_game_name, epoch = self.epoch, "started new game");
        Ok(())
    }

    // =========================================================================
    // Turns
    // =========================================================================

    /// First phase of a turn: check the session is free and build the request.
    pub fn begin_action(
        &mut self,
        input: &str,
        kind: PlayerInputKind,
        query_embedding: Option<&[f32]>,
    ) -> Result<PendingTurn> {
        self.ensure_active()?;
        self.ensure_idle()?;
        if input.trim().is_empty() {
            let mut errors = ValidationErrors::default();
            errors.add("input", "action cannot be empty");
            return Err(errors.into());
        }

        let turn = self.turn + 1;
        let request = self.assembler.assemble(
            turn,
            input,
            kind,
            &self.knowledge_base,
            &self.messages,
            query_embedding,
        );
        self.status.is_loading_api = true;
        self.status.api_error = None;

        Ok(PendingTurn {
            epoch: self.epoch,
            turn,
            request,
        })
    }

    /// Second phase of a turn: apply the narrator's response.
    ///
    /// A failed AI call sets `api_error` and leaves the game untouched.
    pub async fn complete_action(
        &mut self,
        pending: PendingTurn,
        response: std::result::Result<ParsedAiResponse, ApiError>,
    ) -> Result<TurnOutcome> {
        if pending.epoch != self.epoch || pending.turn != self.turn + 1 {
            tracing::debug!(
                pending_epoch = pending.epoch,
                epoch = self.epoch,
                pending_turn = pending.turn,
                turn = self.turn,
                "discarding stale AI response"
            );
            return Ok(TurnOutcome::Discarded);
        }
        self.status.is_loading_api = false;

        match response {
            Ok(response) => self.apply_turn(pending, response).await,
            Err(e) => {
                tracing::warn!(turn = pending.turn, error = %e, "AI request failed");
                self.status.api_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Run a whole turn against the configured narrator.
    #[instrument(skip(self, input))]
    pub async fn submit_action(&mut self, input: &str, kind: PlayerInputKind) -> Result<TurnOutcome> {
        self.ensure_active()?;
        self.ensure_idle()?;

        let query_embedding = self.embed_query(input, kind).await;
        let pending = self.begin_action(input, kind, query_embedding.as_deref())?;

        let narrative = self.ports.narrative.clone();
        let response = narrative.generate(&pending.request).await;
        self.complete_action(pending, response).await
    }

    async fn embed_query(&self, input: &str, kind: PlayerInputKind) -> Option<Vec<f32>> {
        let embeddings = self.ports.embeddings.clone()?;
        if self
            .knowledge_base
            .rag_vector_store
            .as_ref()
            .map_or(true, |store| store.is_empty())
        {
            return None;
        }

        let query = query_text(input, kind, &self.knowledge_base);
        match embeddings.embed(&query).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                tracing::warn!(error = %e, "embedding failed, continuing without retrieval");
                None
            }
        }
    }

    async fn apply_turn(&mut self, pending: PendingTurn, response: ParsedAiResponse) -> Result<TurnOutcome> {
        let turn = pending.turn;
        let request = pending.request;

        self.messages.push(GameMessage::new(
            MessageType::PlayerAction,
            request.player_action,
            turn,
        ));
        self.messages
            .push(GameMessage::narration(response.narration, response.choices, turn));
        if let Some(system) = response.system_message.filter(|m| !m.trim().is_empty()) {
            self.messages.push(GameMessage::system(system, turn));
        }

        let parsed = directives::parse_all(&response.tags);
        let mut applied = 0;
        for directive in &parsed {
            match directives::apply(&mut self.knowledge_base, directive) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!(turn, ?directive, error = %e, "directive not applied"),
            }
        }

        let kb = &mut self.knowledge_base;
        kb.player_stats.turn = turn;
        self.paginator.note_turn(&mut kb.pagination, turn);
        kb.auto_save.turn_counter = kb.auto_save.turn_counter.saturating_add(1);
        self.turn = turn;

        let mut auto_save = None;
        if self.knowledge_base.auto_save.turn_counter >= self.config.session.autosave_interval_turns {
            auto_save = self.auto_save_turn(turn).await?;
        }
        if auto_save.is_none() {
            self.history
                .record_turn(turn, &self.knowledge_base, &self.messages)?;
            self.prune_history(turn);
        }

        tracing::info!(turn, directives = applied, "turn applied");
        Ok(TurnOutcome::Applied {
            turn,
            directives: applied,
            auto_save,
        })
    }

    /// Record `turn` and write it as the next auto-save.
    ///
    /// The slot ring only advances once the save is stored. A failed write
    /// returns `None` and leaves the ring unchanged, so the next turn retries.
    async fn auto_save_turn(&mut self, turn: u32) -> Result<Option<SaveId>> {
        let id = SaveId::new();
        let mut knowledge_base = self.knowledge_base.clone();
        let displaced = knowledge_base.auto_save.commit(id.clone());
        let mut history = self.history.clone();
        history.record_turn(turn, &knowledge_base, &self.messages)?;

        let data = SaveGameData::new(
            id.clone(),
            format!("{} (auto, turn {})", self.save_name(), turn),
            knowledge_base,
            self.messages.clone(),
            history,
        );
        if let Err(e) = self.ports.saves.save(&data).await {
            tracing::warn!(turn, error = %e, "auto-save failed");
            self.status.notification = Some(Notification::warning(format!("Auto-save failed: {}", e)));
            return Ok(None);
        }
        tracing::info!(save_id = %id, turn, "auto-saved");

        self.knowledge_base = data.knowledge_base;
        self.history = data.history;
        self.prune_history(turn);

        if let Some(old) = displaced {
            match self.ports.saves.delete(&old).await {
                Ok(()) | Err(PersistError::NotFound(_)) => {}
                Err(e) => tracing::warn!(save_id = %old, error = %e, "could not delete displaced auto-save"),
            }
        }
        Ok(Some(id))
    }

    fn prune_history(&mut self, turn: u32) {
        let pruned = self.history.prune(self.config.history.retention());
        if pruned > 0 {
            tracing::debug!(turn, pruned, "pruned history after turn");
        }
    }

    /// Summarize every fully played page that has no summary yet.
    /// Returns how many pages were summarized.
    pub async fn summarize_pending_pages(&mut self) -> Result<usize> {
        self.ensure_active()?;
        self.ensure_idle()?;

        let narrative = self.ports.narrative.clone();
        let mut summarized = 0;
        while let Some(range) = self
            .paginator
            .pending_page(&self.knowledge_base.pagination, self.turn)
        {
            let page: Vec<GameMessage> = self
                .messages
                .iter()
                .filter(|m| range.contains(m.turn_number))
                .cloned()
                .collect();

            self.status.is_summarizing = true;
            let result = narrative.summarize(&page).await;
            self.status.is_summarizing = false;

            let summary = result.map_err(|e| {
                tracing::warn!(page = range.page, error = %e, "page summary failed");
                EngineError::from(e)
            })?;
            self.paginator
                .store_summary(&mut self.knowledge_base.pagination, range, summary);
            tracing::debug!(page = range.page, "stored page summary");
            summarized += 1;
        }
        Ok(summarized)
    }

    // =========================================================================
    // Economy
    // =========================================================================

    /// Buy `quantity` units of a market item. Returns the inventory id.
    pub fn buy_item(&mut self, item: Item, unit_price: i64, quantity: u32) -> Result<ItemId> {
        self.ensure_active()?;
        self.ensure_idle()?;
        if quantity == 0 {
            return Err(EconomyError::ZeroQuantity.into());
        }
        let needed = unit_price.saturating_mul(i64::from(quantity));
        self.spend(needed)?;

        let name = item.name.clone();
        let id = self.knowledge_base.add_item(item.with_quantity(quantity));
        tracing::info!(item = %name, quantity, cost = needed, "bought item");
        Ok(id)
    }

    /// Sell held units of an item. Returns the currency received.
    pub fn sell_item(&mut self, item_id: &ItemId, quantity: u32, unit_price: i64) -> Result<i64> {
        self.ensure_active()?;
        self.ensure_idle()?;
        if quantity == 0 {
            return Err(EconomyError::ZeroQuantity.into());
        }
        if unit_price < 0 {
            return Err(EconomyError::NegativePrice(unit_price).into());
        }
        let held = self
            .knowledge_base
            .find_item(item_id)
            .ok_or_else(|| EconomyError::ItemNotFound(item_id.clone()))?
            .quantity;
        if held < quantity {
            return Err(EconomyError::NotEnoughQuantity {
                requested: quantity,
                available: held,
            }
            .into());
        }

        self.knowledge_base
            .remove_item(item_id, quantity)
            .ok_or_else(|| EconomyError::ItemNotFound(item_id.clone()))?;
        let earned = unit_price.saturating_mul(i64::from(quantity));
        let currency = &mut self.knowledge_base.player_stats.currency;
        *currency = currency.saturating_add(earned);
        tracing::info!(item_id = %item_id, quantity, earned, "sold item");
        Ok(earned)
    }

    /// Buy a slave at the open slave market.
    pub fn buy_slave(&mut self, slave: ComplexCompanion, price: i64) -> Result<CompanionId> {
        self.ensure_active()?;
        self.ensure_idle()?;
        if self.screen.slave_market().is_none() {
            return Err(NavigationError::SlaveMarketNotOpen.into());
        }
        self.spend(price)?;

        let id = slave.person.id.clone();
        tracing::info!(name = %slave.person.name, price, "bought slave");
        self.knowledge_base.companions.push(Companion::Slave {
            companion: slave,
            value: u64::try_from(price).ok(),
        });
        Ok(id)
    }

    /// Bid on the current lot of the open item auction.
    pub fn place_auction_bid(&mut self, amount: i64) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;
        let available = self.knowledge_base.player_stats.currency;
        let auction = self
            .knowledge_base
            .auction_state
            .as_mut()
            .filter(|a| a.is_open)
            .ok_or(NavigationError::AuctionNotOpen)?;
        place_player_bid(auction, amount, available)
    }

    /// Bid on the current lot of the open slave auction.
    pub fn place_slave_auction_bid(&mut self, amount: i64) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;
        let available = self.knowledge_base.player_stats.currency;
        let auction = self
            .knowledge_base
            .slave_auction_state
            .as_mut()
            .filter(|a| a.is_open)
            .ok_or(NavigationError::SlaveAuctionNotOpen)?;
        place_player_bid(auction, amount, available)
    }

    /// Combine materials in the spirit cauldron.
    ///
    /// The materials are only consumed once the crafter answers. Returns the
    /// inventory id of the crafted item.
    pub async fn craft_item(&mut self, materials: &[(ItemId, u32)], intent: &str) -> Result<ItemId> {
        self.ensure_active()?;
        self.ensure_idle()?;
        if materials.is_empty() {
            return Err(EconomyError::NoMaterials.into());
        }
        let crafter = self
            .ports
            .crafter
            .clone()
            .ok_or(ApiError::NotConfigured("item crafting"))?;

        let mut consumed = Vec::with_capacity(materials.len());
        for (item_id, quantity) in materials {
            let item = self
                .knowledge_base
                .find_item(item_id)
                .ok_or_else(|| EconomyError::ItemNotFound(item_id.clone()))?;
            if *quantity == 0 {
                return Err(EconomyError::ZeroQuantity.into());
            }
            if item.quantity < *quantity {
                return Err(EconomyError::NotEnoughQuantity {
                    requested: *quantity,
                    available: item.quantity,
                }
                .into());
            }
            consumed.push(item.clone().with_quantity(*quantity));
        }
        let request = CraftingRequest {
            materials: consumed,
            intent: intent.to_string(),
            player_realm: self.knowledge_base.player_stats.realm.clone(),
        };

        self.status.is_crafting_item = true;
        let result = crafter.craft(&request).await;
        self.status.is_crafting_item = false;

        let crafted = result.map_err(|e| {
            tracing::warn!(error = %e, "crafting failed");
            self.status.notification = Some(Notification::warning(format!("Crafting failed: {}", e)));
            EngineError::from(e)
        })?;

        for (item_id, quantity) in materials {
            if self.knowledge_base.remove_item(item_id, *quantity).is_none() {
                tracing::warn!(item_id = %item_id, "material vanished while crafting");
            }
        }
        let name = crafted.name.clone();
        let id = self.knowledge_base.add_item(crafted);
        tracing::info!(item = %name, materials = materials.len(), "crafted item");
        Ok(id)
    }

    fn spend(&mut self, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(EconomyError::NegativePrice(amount).into());
        }
        let available = self.knowledge_base.player_stats.currency;
        if amount > available {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available,
            }
            .into());
        }
        self.knowledge_base.player_stats.currency -= amount;
        Ok(())
    }

    // =========================================================================
    // Combat
    // =========================================================================

    pub fn begin_combat(&mut self, opponent_ids: Vec<NpcId>) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;
        self.knowledge_base.pending_combat = Some(PendingCombat::new(opponent_ids));
        self.knowledge_base.player_stats.is_in_combat = true;
        self.screen
            .navigate(GameScreen::Combat, &self.knowledge_base)?;
        Ok(())
    }

    /// Record the end of a fight. Victories and surrenders wait for
    /// [`handle_combat_end`](Self::handle_combat_end).
    pub fn finish_combat(&mut self, payload: CombatEndPayload) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;
        let kb = &mut self.knowledge_base;
        if kb.pending_combat.take().is_none() {
            return Err(EngineError::NoPendingCombat);
        }
        kb.player_stats = payload.final_player_state.clone();
        kb.player_stats.is_in_combat = false;

        self.messages
            .push(GameMessage::system(payload.summary.clone(), self.turn));
        tracing::info!(outcome = ?payload.outcome, opponents = payload.opponent_ids.len(), "combat finished");

        kb.post_combat_state = payload.awaits_dispositions().then_some(payload);
        self.screen
            .navigate(GameScreen::Gameplay, &self.knowledge_base)?;
        Ok(())
    }

    /// Apply the player's decision for each defeated opponent. Opponents
    /// without a decision are released.
    pub fn handle_combat_end(&mut self, dispositions: BTreeMap<NpcId, CombatDisposition>) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;
        let payload = self
            .knowledge_base
            .post_combat_state
            .take()
            .ok_or(EngineError::NoPostCombatState)?;

        for npc_id in &payload.opponent_ids {
            let disposition = dispositions
                .get(npc_id)
                .or_else(|| payload.dispositions.get(npc_id))
                .copied()
                .unwrap_or(CombatDisposition::Release);

            match disposition {
                CombatDisposition::Kill => {
                    if self.knowledge_base.remove_npc(npc_id).is_none() {
                        tracing::warn!(npc_id = %npc_id, "killed opponent was not a known NPC");
                    }
                }
                CombatDisposition::Capture => match self.knowledge_base.remove_npc(npc_id) {
                    Some(npc) => self
                        .knowledge_base
                        .companions
                        .push(Companion::prisoner_from_npc(&npc)),
                    None => tracing::warn!(npc_id = %npc_id, "captured opponent was not a known NPC"),
                },
                CombatDisposition::Release => {}
            }
            tracing::debug!(npc_id = %npc_id, ?disposition, "resolved opponent");
        }
        Ok(())
    }

    // =========================================================================
    // Avatars
    // =========================================================================

    /// Generate a new player portrait. Failures only raise a warning.
    pub async fn update_player_avatar(&mut self, prompt: &str) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;

        if let Some(url) = self.generate_avatar(prompt).await {
            self.knowledge_base.player_avatar_url = Some(url);
        }
        Ok(())
    }

    pub async fn update_npc_avatar(&mut self, npc_id: &NpcId, prompt: &str) -> Result<()> {
        self.ensure_active()?;
        self.ensure_idle()?;
        if self.knowledge_base.find_npc(npc_id).is_none() {
            self.status.notification = Some(Notification::warning(format!("Unknown NPC {}", npc_id)));
            return Ok(());
        }

        if let Some(url) = self.generate_avatar(prompt).await {
            if let Some(npc) = self.knowledge_base.find_npc_mut(npc_id) {
                npc.avatar_url = Some(url);
            }
        }
        Ok(())
    }

    async fn generate_avatar(&mut self, prompt: &str) -> Option<String> {
        let avatars = self.ports.avatars.clone();
        self.status.is_uploading_avatar = true;
        let result = avatars.generate_avatar(prompt).await;
        self.status.is_uploading_avatar = false;

        match result {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "avatar generation failed");
                self.status.notification =
                    Some(Notification::warning(format!("Avatar generation failed: {}", e)));
                None
            }
        }
    }

    // =========================================================================
    // Saves and history
    // =========================================================================

    /// Write the manual save. The same id is reused for every manual save of a game.
    pub async fn save_manual(&mut self) -> Result<SaveGameMeta> {
        self.ensure_active()?;
        let id = self
            .knowledge_base
            .manual_save_id
            .get_or_insert_with(SaveId::new)
            .clone();
        let data = SaveGameData::new(
            id.clone(),
            self.save_name(),
            self.knowledge_base.clone(),
            self.messages.clone(),
            self.history.clone(),
        );
        let meta = self.ports.saves.save(&data).await?;
        tracing::info!(save_id = %id, turn = self.turn, "saved game");
        Ok(meta)
    }

    #[instrument(skip(self))]
    pub async fn load_game(&mut self, id: &SaveId) -> Result<()> {
        let data = self.ports.saves.load(id).await?;

        let violations = data.knowledge_base.check_invariants();
        if !violations.is_empty() {
            tracing::warn!(?violations, "loaded save breaks knowledge base invariants");
        }

        let mut history = data.history;
        let turn = match history.latest_turn() {
            Some(turn) => turn,
            None => {
                let turn = data.knowledge_base.player_stats.turn;
                history.record_turn(turn, &data.knowledge_base, &data.game_messages)?;
                turn
            }
        };

        self.knowledge_base = data.knowledge_base;
        self.messages = data.game_messages;
        self.history = history;
        self.turn = turn;
        self.has_game = true;
        self.reset_transient_state();
        self.screen
            .navigate(GameScreen::Gameplay, &self.knowledge_base)?;

        tracing::info!(turn, epoch = self.epoch, "loaded game");
        Ok(())
    }

    pub async fn list_saves(&self) -> Result<Vec<SaveGameMeta>> {
        Ok(self.ports.saves.list().await?)
    }

    pub async fn delete_save(&mut self, id: &SaveId) -> Result<()> {
        self.ports.saves.delete(id).await?;
        if self.knowledge_base.manual_save_id.as_ref() == Some(id) {
            self.knowledge_base.manual_save_id = None;
        }
        Ok(())
    }

    /// Return the game to the state recorded at `turn`, forgetting later turns.
    ///
    /// Auto-save slots and the manual save id survive the rollback, so saves
    /// written after `turn` stay reachable and keep rotating.
    pub fn rollback_to_turn(&mut self, turn: u32) -> Result<()> {
        self.ensure_active()?;
        let (mut knowledge_base, messages) = self.history.reconstruct(turn)?;
        let removed = self.history.truncate_after(turn)?;

        knowledge_base.auto_save = std::mem::take(&mut self.knowledge_base.auto_save);
        knowledge_base.manual_save_id = self.knowledge_base.manual_save_id.take();
        knowledge_base.manual_save_name = self.knowledge_base.manual_save_name.take();

        self.knowledge_base = knowledge_base;
        self.messages = messages;
        self.turn = turn;
        self.reset_transient_state();

        tracing::info!(turn, removed, epoch = self.epoch, "rolled back");
        Ok(())
    }

    fn reset_transient_state(&mut self) {
        self.epoch += 1;
        self.status.is_loading_api = false;
        self.status.is_summarizing = false;
        self.status.api_error = None;
        self.screen.close_all_modals();
    }

    fn save_name(&self) -> String {
        self.knowledge_base
            .manual_save_name
            .clone()
            .or_else(|| {
                self.knowledge_base
                    .world_config
                    .as_ref()
                    .map(|c| c.save_game_name.clone())
            })
            .unwrap_or_else(|| "Untitled".to_string())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.has_game {
            Ok(())
        } else {
            Err(EngineError::NoActiveGame)
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.status.busy_reason() {
            Some(reason) => Err(EngineError::Busy(reason)),
            None => Ok(()),
        }
    }
}

fn place_player_bid<T>(auction: &mut AuctionState<T>, amount: i64, available: i64) -> Result<()> {
    if amount > available {
        return Err(EconomyError::InsufficientFunds {
            needed: amount,
            available,
        }
        .into());
    }
    let now = chrono::Utc::now().timestamp_millis();
    auction
        .place_bid(PLAYER_BIDDER_ID, amount, now)
        .map_err(EconomyError::from)?;
    Ok(())
}
