use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use saga_core::{
    ApiError, AvatarGenerator, EconomyModal, EngineConfig, EngineError, GameScreen, GameSession,
    JsonFileStore, MemoryStore, NarrativeGenerator, NarrativeRequest, Overlay, Ports, SaveStore,
    Surface, TurnOutcome,
};
use saga_model::{
    EntityRef, EntityType, GameMessage, Location, LocationType, ParsedAiResponse,
    PlayerInputKind, WorldSettings,
};

/// Replies with queued responses in order and remembers every request.
#[derive(Default)]
struct ScriptedNarrator {
    replies: Mutex<VecDeque<Result<ParsedAiResponse, ApiError>>>,
    requests: Mutex<Vec<NarrativeRequest>>,
}

impl ScriptedNarrator {
    fn with_replies(replies: Vec<Result<ParsedAiResponse, ApiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl NarrativeGenerator for ScriptedNarrator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<ParsedAiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Request("no scripted reply left".into())))
    }

    async fn summarize(&self, messages: &[GameMessage]) -> Result<String, ApiError> {
        Ok(format!("{} messages", messages.len()))
    }
}

struct NoAvatars;

#[async_trait]
impl AvatarGenerator for NoAvatars {
    async fn generate_avatar(&self, _prompt: &str) -> Result<String, ApiError> {
        Err(ApiError::Blocked)
    }
}

fn reply(narration: &str, tags: &[&str]) -> Result<ParsedAiResponse, ApiError> {
    Ok(ParsedAiResponse {
        narration: narration.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    })
}

fn settings() -> WorldSettings {
    let mut settings = WorldSettings::new("Journey", "Lâm Phong");
    settings.starting_currency = Some(100);
    settings
}

fn session(narrator: Arc<ScriptedNarrator>, saves: Arc<dyn SaveStore>) -> GameSession {
    GameSession::new(
        EngineConfig::default(),
        Ports::new(narrator, Arc::new(NoAvatars), saves),
    )
}

#[tokio::test]
async fn test_currency_scenario_reconstructs_each_turn() {
    let narrator = Arc::new(ScriptedNarrator::with_replies(vec![
        reply("You pay the ferryman.", &["CURRENCY_CHANGE: amount=-10"]),
        reply("The sect rewards you.", &["[CURRENCY_CHANGE: amount=60]"]),
    ]));
    let mut game = session(narrator, Arc::new(MemoryStore::new()));
    game.start_new_game(settings()).unwrap();

    game.submit_action("cross the river", PlayerInputKind::Action)
        .await
        .unwrap();
    game.submit_action("report to the elder", PlayerInputKind::Action)
        .await
        .unwrap();

    let history = game.history();
    assert_eq!(history.recorded_turns(), vec![0, 1, 2]);
    for (turn, currency) in [(0, 100), (1, 90), (2, 150)] {
        let (kb, messages) = history.reconstruct(turn).unwrap();
        assert_eq!(kb.player_stats.currency, currency, "turn {}", turn);
        assert_eq!(messages.len(), 2 * turn as usize);
    }
    assert_eq!(game.knowledge_base().player_stats.currency, 150);
}

#[tokio::test]
async fn test_failed_ai_call_leaves_state_and_sets_banner() {
    let narrator = Arc::new(ScriptedNarrator::with_replies(vec![Err(ApiError::Request(
        "connection reset".into(),
    ))]));
    let mut game = session(narrator.clone(), Arc::new(MemoryStore::new()));
    game.start_new_game(settings()).unwrap();
    let before = game.knowledge_base().clone();

    let result = game.submit_action("attack", PlayerInputKind::Action).await;
    assert!(matches!(result, Err(EngineError::Api(_))));
    assert_eq!(narrator.request_count(), 1);

    assert_eq!(game.knowledge_base(), &before);
    assert_eq!(game.current_turn(), 0);
    assert_eq!(game.history().recorded_turns(), vec![0]);
    let banner = game
        .overlays()
        .into_iter()
        .find_map(|o| match o {
            Overlay::ApiErrorBanner(message) => Some(message.to_string()),
            _ => None,
        })
        .unwrap();
    assert!(banner.contains("connection reset"));
}

#[tokio::test]
async fn test_story_input_reaches_the_narrator() {
    let narrator = Arc::new(ScriptedNarrator::with_replies(vec![reply("So it was.", &[])]));
    let mut game = session(narrator.clone(), Arc::new(MemoryStore::new()));
    game.start_new_game(settings()).unwrap();

    game.submit_action("a storm rolls in", PlayerInputKind::Story)
        .await
        .unwrap();

    let requests = narrator.requests.lock().unwrap();
    assert_eq!(requests[0].turn, 1);
    assert_eq!(requests[0].input_kind, PlayerInputKind::Story);
    assert!(requests[0]
        .to_prompt_string()
        .contains("## Story Direction\na storm rolls in"));
}

#[tokio::test]
async fn test_response_after_load_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let narrator = Arc::new(ScriptedNarrator::default());
    let mut game = session(narrator, store);
    game.initialize_storage().await.unwrap();
    game.start_new_game(settings()).unwrap();
    let meta = game.save_manual().await.unwrap();

    let pending = game
        .begin_action("draw your sword", PlayerInputKind::Action, None)
        .unwrap();
    game.load_game(&meta.id).await.unwrap();

    let outcome = game
        .complete_action(pending, reply("Steel flashes.", &["CURRENCY_CHANGE: amount=-100"]))
        .await
        .unwrap();
    assert_eq!(outcome, TurnOutcome::Discarded);
    assert_eq!(game.knowledge_base().player_stats.currency, 100);
    assert!(!game.status().is_loading_api);
}

#[tokio::test]
async fn test_file_saves_round_trip_history() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SaveStore> = Arc::new(JsonFileStore::new(dir.path().join("saves")));
    let narrator = Arc::new(ScriptedNarrator::with_replies(vec![
        reply("You find coins.", &["CURRENCY_CHANGE: amount=5"]),
        reply("You find more coins.", &["CURRENCY_CHANGE: amount=5"]),
    ]));

    let mut game = session(narrator.clone(), store.clone());
    game.initialize_storage().await.unwrap();
    game.start_new_game(settings()).unwrap();
    game.submit_action("search", PlayerInputKind::Action).await.unwrap();
    game.submit_action("search", PlayerInputKind::Action).await.unwrap();
    let meta = game.save_manual().await.unwrap();

    let mut resumed = session(narrator, store);
    resumed.initialize_storage().await.unwrap();
    let listed = resumed.list_saves().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Journey");

    resumed.load_game(&meta.id).await.unwrap();
    assert_eq!(resumed.current_turn(), 2);
    assert_eq!(resumed.knowledge_base().player_stats.currency, 110);
    assert_eq!(resumed.screen().current(), GameScreen::Gameplay);

    resumed.rollback_to_turn(1).unwrap();
    assert_eq!(resumed.knowledge_base().player_stats.currency, 105);
    assert_eq!(resumed.messages().len(), 2);
    assert_eq!(resumed.knowledge_base().manual_save_id.as_ref(), Some(&meta.id));
}

#[tokio::test]
async fn test_auto_saves_fill_ring_then_rotate() {
    let replies = (0..30).map(|_| reply("Time passes.", &[])).collect();
    let narrator = Arc::new(ScriptedNarrator::with_replies(replies));
    let store = Arc::new(MemoryStore::new());
    let mut game = session(narrator, store.clone());
    game.start_new_game(settings()).unwrap();

    let mut auto_saves = Vec::new();
    for _ in 0..60 {
        match game.submit_action("wait", PlayerInputKind::Action).await {
            Ok(TurnOutcome::Applied {
                auto_save: Some(id),
                ..
            }) => auto_saves.push(id),
            Ok(_) => {}
            Err(_) => break,
        }
    }

    // 30 turns at the default interval of 5.
    assert_eq!(auto_saves.len(), 6);
    let slots = game.knowledge_base().auto_save.slot_ids();
    for (k, id) in auto_saves.iter().enumerate() {
        assert_eq!(slots[k % slots.len()].as_ref(), Some(id));
    }
    assert_eq!(store.len().await, 6);
}

#[test]
fn test_screen_stays_put_while_modals_change() {
    let narrator = Arc::new(ScriptedNarrator::default());
    let mut game = session(narrator, Arc::new(MemoryStore::new()));

    let mut settings = settings();
    settings.starting_locations.push(saga_model::StartingLocation {
        name: "Vạn Bảo Lâu".into(),
        description: "A bustling market".into(),
        is_safe_zone: true,
        location_type: LocationType::Marketplace,
        map_x: None,
        map_y: None,
    });
    game.start_new_game(settings).unwrap();
    let market = game.knowledge_base().current_location_id.clone().unwrap();
    assert_eq!(game.surface(), Surface::Screen(GameScreen::Gameplay));

    game.open_economy(EconomyModal::Marketplace {
        location_id: market.clone(),
    })
    .unwrap();
    game.screen_mut().open_slave_market(market.clone());
    game.screen_mut().set_style_settings_open(true);
    game.screen_mut()
        .select_entity(EntityRef::new(EntityType::Location, market.as_str()));
    assert_eq!(game.screen().current(), GameScreen::Gameplay);

    let overlays = game.overlays();
    assert_eq!(overlays.len(), 4);
    assert!(matches!(overlays.last(), Some(Overlay::EntityDetail(_))));

    let wilderness = Location::new("Hắc Phong Lâm", LocationType::Forest);
    assert!(matches!(
        game.open_economy(EconomyModal::ShoppingCenter {
            location_id: wilderness.id.clone(),
        }),
        Err(EngineError::Navigation(_))
    ));
    assert!(matches!(
        game.navigate(GameScreen::Auction),
        Err(EngineError::Navigation(_))
    ));

    game.navigate(GameScreen::Map).unwrap();
    game.screen_mut().close_all_modals();
    assert_eq!(game.screen().current(), GameScreen::Map);
    assert!(game.overlays().is_empty());
}
