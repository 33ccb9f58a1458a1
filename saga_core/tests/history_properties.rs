use saga_core::{HistoryConfig, HistoryError, RetentionPolicy, TurnHistory};
use saga_model::{
    GameMessage, Item, ItemKind, KnowledgeBase, MaterialType, Quest, WorldSettings,
};

/// A scripted game: each turn changes currency, sometimes picks up an item or a
/// quest, and appends two messages.
fn scripted_turns(count: u32) -> Vec<(KnowledgeBase, Vec<GameMessage>)> {
    let mut settings = WorldSettings::new("Journey", "Lâm Phong");
    settings.starting_currency = Some(100);
    let mut kb = KnowledgeBase::from_settings(&settings);
    let mut messages = Vec::new();
    let mut states = vec![(kb.clone(), messages.clone())];

    for turn in 1..=count {
        kb.player_stats.currency += i64::from(turn % 7) * 3 - 5;
        kb.player_stats.turn = turn;
        if turn % 3 == 0 {
            kb.add_item(Item::new(
                "Spirit Herb",
                ItemKind::Material {
                    material_type: MaterialType::SpiritHerb,
                },
            ));
        }
        if turn % 5 == 0 {
            kb.all_quests.push(Quest::new(format!("Errand {}", turn), "Run an errand"));
        }
        if turn % 4 == 0 {
            kb.advance_date(1);
        }
        messages.push(GameMessage::system(format!("action {}", turn), turn));
        messages.push(GameMessage::narration(format!("narration {}", turn), vec![], turn));
        states.push((kb.clone(), messages.clone()));
    }
    states
}

fn record_all(config: HistoryConfig, states: &[(KnowledgeBase, Vec<GameMessage>)]) -> TurnHistory {
    let mut history = TurnHistory::with_config(config);
    for (turn, (kb, messages)) in states.iter().enumerate() {
        history.record_turn(turn as u32, kb, messages).unwrap();
    }
    history
}

#[test]
fn test_reconstruct_reproduces_every_recorded_turn() {
    let states = scripted_turns(30);
    let history = record_all(HistoryConfig::default(), &states);

    assert_eq!(history.len(), 31);
    for (turn, (kb, messages)) in states.iter().enumerate() {
        let (rebuilt_kb, rebuilt_messages) = history.reconstruct(turn as u32).unwrap();
        assert_eq!(&rebuilt_kb, kb, "knowledge base differs at turn {}", turn);
        assert_eq!(&rebuilt_messages, messages, "messages differ at turn {}", turn);
    }
}

#[test]
fn test_keyframe_placement_is_deterministic() {
    let states = scripted_turns(25);
    let first = record_all(HistoryConfig::default(), &states);
    let second = record_all(HistoryConfig::default(), &states);

    assert_eq!(first.keyframe_turns(), second.keyframe_turns());
    assert_eq!(first.entries(), second.entries());
    assert_eq!(first.keyframe_turns()[0], 0);
}

#[test]
fn test_chain_limit_places_keyframes() {
    let states = scripted_turns(12);
    let history = record_all(
        HistoryConfig {
            max_delta_chain: 3,
            max_delta_ratio: 1.0,
        },
        &states,
    );
    assert_eq!(history.keyframe_turns(), vec![0, 4, 8, 12]);
}

#[test]
fn test_prune_keeps_latest_keyframe_and_reconstructs_retained_turns() {
    let states = scripted_turns(20);
    let mut history = record_all(
        HistoryConfig {
            max_delta_chain: 4,
            max_delta_ratio: 1.0,
        },
        &states,
    );
    let latest_keyframe = *history.keyframe_turns().last().unwrap();

    let removed = history.prune(RetentionPolicy { keep_keyframes: 0 });
    assert!(removed > 0);
    assert_eq!(history.keyframe_turns(), vec![latest_keyframe]);
    assert_eq!(history.oldest_turn(), Some(latest_keyframe));

    for turn in latest_keyframe..=20 {
        let (kb, _) = history.reconstruct(turn).unwrap();
        assert_eq!(kb, states[turn as usize].0);
    }
    assert!(matches!(
        history.reconstruct(0),
        Err(HistoryError::TurnNotRecorded(0))
    ));

    let (kb, messages) = &states[20];
    let mut next_kb = kb.clone();
    next_kb.player_stats.currency += 1;
    history.record_turn(21, &next_kb, messages).unwrap();
    assert_eq!(history.reconstruct(21).unwrap().0, next_kb);
}

#[test]
fn test_history_survives_serialization() {
    let states = scripted_turns(8);
    let history = record_all(HistoryConfig::default(), &states[..8]);

    let json = serde_json::to_string(&history).unwrap();
    let mut restored: TurnHistory = serde_json::from_str(&json).unwrap();
    let (kb, messages) = &states[8];
    restored.record_turn(8, kb, messages).unwrap();

    assert_eq!(restored.reconstruct(8).unwrap().0, *kb);
    assert_eq!(restored.reconstruct(3).unwrap().1, states[3].1);
}
