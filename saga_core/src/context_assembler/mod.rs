//! Context Assembler - builds the request sent to the narrative AI.
//!
//! A request combines:
//! 1. **Action**: what the player typed and whether it is an action or a story steer
//! 2. **Recent log**: the last few messages, verbatim
//! 3. **Summaries**: AI summaries of earlier pages
//! 4. **Knowledge slice**: the parts of the knowledge base the narrator needs every turn
//! 5. **Retrieval**: lore and entity records most similar to the action

mod retrieval;

pub use retrieval::*;

use saga_model::{GameMessage, KnowledgeBase, MessageType, PlayerInputKind, WorldDate};
use serde::{Deserialize, Serialize};

/// How much context goes into each request.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Messages included verbatim.
    pub recent_message_count: usize,

    /// Retrieved records included.
    pub rag_top_k: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            recent_message_count: 10,
            rag_top_k: 5,
        }
    }
}

/// Builds narrative requests from the knowledge base and message log.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: AssemblerConfig,
}

impl ContextAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AssemblerConfig::default())
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble the request for the action taken on `turn`.
    pub fn assemble(
        &self,
        turn: u32,
        action: &str,
        input_kind: PlayerInputKind,
        kb: &KnowledgeBase,
        messages: &[GameMessage],
        query_embedding: Option<&[f32]>,
    ) -> NarrativeRequest {
        let start = messages.len().saturating_sub(self.config.recent_message_count);
        NarrativeRequest {
            turn,
            player_action: action.trim().to_string(),
            input_kind,
            recent_messages: messages[start..].to_vec(),
            page_summaries: kb
                .pagination
                .page_summaries
                .iter()
                .map(|(page, summary)| (*page, summary.clone()))
                .collect(),
            knowledge: KnowledgeSlice::from_knowledge_base(kb),
            retrieved: retrieve(kb.rag_vector_store.as_ref(), query_embedding, self.config.rag_top_k),
        }
    }
}

/// Everything the narrator is told about the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub turn: u32,
    pub player_action: String,
    pub input_kind: PlayerInputKind,
    pub recent_messages: Vec<GameMessage>,
    /// `(page, summary)` in page order.
    pub page_summaries: Vec<(u32, String)>,
    pub knowledge: KnowledgeSlice,
    pub retrieved: Vec<RetrievedContext>,
}

impl NarrativeRequest {
    /// Format the request as a sectioned prompt.
    pub fn to_prompt_string(&self) -> String {
        let k = &self.knowledge;
        let mut prompt = String::new();

        prompt.push_str("## World State\n");
        prompt.push_str(&format!("Date: {}\n", k.date));
        if let Some(location) = &k.location {
            prompt.push_str(&format!("Location: {}\n", location));
        }
        prompt.push('\n');

        prompt.push_str("## Player\n");
        if let Some(name) = &k.player_name {
            prompt.push_str(&format!("Name: {}\n", name));
        }
        prompt.push_str(&format!(
            "Realm: {}, HP {}/{}, Mana {}/{}, {} {}\n",
            k.realm, k.hp, k.max_hp, k.mana, k.max_mana, k.currency, k.currency_name
        ));
        if !k.inventory.is_empty() {
            prompt.push_str(&format!("Inventory: {}\n", k.inventory.join(", ")));
        }
        prompt.push('\n');

        if !k.active_quests.is_empty() {
            prompt.push_str("## Active Quests\n");
            for quest in &k.active_quests {
                prompt.push_str(&format!("- {}\n", quest));
            }
            prompt.push('\n');
        }

        if !k.nearby_npcs.is_empty() {
            prompt.push_str("## Nearby\n");
            prompt.push_str(&k.nearby_npcs.join(", "));
            prompt.push_str("\n\n");
        }

        if !self.retrieved.is_empty() {
            prompt.push_str("## Relevant Background\n");
            for record in &self.retrieved {
                prompt.push_str(&format!("- {}\n", record.text));
            }
            prompt.push('\n');
        }

        if !self.page_summaries.is_empty() {
            prompt.push_str("## Story So Far\n");
            for (page, summary) in &self.page_summaries {
                prompt.push_str(&format!("Page {}: {}\n", page, summary));
            }
            prompt.push('\n');
        }

        if !self.recent_messages.is_empty() {
            prompt.push_str("## Recent Events\n");
            for message in &self.recent_messages {
                let speaker = match message.message_type {
                    MessageType::PlayerAction => "Player",
                    MessageType::Narration => "Narrator",
                    _ => "System",
                };
                prompt.push_str(&format!("{}: {}\n", speaker, message.content));
            }
            prompt.push('\n');
        }

        if !k.active_rules.is_empty() {
            prompt.push_str("## Player Rules\n");
            for rule in &k.active_rules {
                prompt.push_str(&format!("- {}\n", rule));
            }
            prompt.push('\n');
        }

        prompt.push_str(match self.input_kind {
            PlayerInputKind::Action => "## Player Action\n",
            PlayerInputKind::Story => "## Story Direction\n",
        });
        prompt.push_str(&self.player_action);
        prompt.push('\n');

        prompt
    }
}

/// The knowledge base as the narrator sees it each turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSlice {
    pub player_name: Option<String>,
    pub realm: String,
    pub hp: i64,
    pub max_hp: i64,
    pub mana: i64,
    pub max_mana: i64,
    pub currency: i64,
    pub currency_name: String,
    pub location: Option<String>,
    pub date: WorldDate,
    pub active_quests: Vec<String>,
    /// Item names, with a count when more than one is held.
    pub inventory: Vec<String>,
    pub nearby_npcs: Vec<String>,
    pub active_rules: Vec<String>,
}

impl KnowledgeSlice {
    pub fn from_knowledge_base(kb: &KnowledgeBase) -> Self {
        let stats = &kb.player_stats;
        let settings = kb.world_config.as_ref();
        Self {
            player_name: settings.map(|s| s.player_name.clone()),
            realm: stats.realm.clone(),
            hp: stats.sinh_luc,
            max_hp: stats.max_sinh_luc,
            mana: stats.linh_luc,
            max_mana: stats.max_linh_luc,
            currency: stats.currency,
            currency_name: settings
                .map(|s| s.currency_name.clone())
                .unwrap_or_default(),
            location: kb.current_location().map(|l| l.name.clone()),
            date: kb.world_date,
            active_quests: kb.active_quests().map(|q| q.title.clone()).collect(),
            inventory: kb
                .inventory
                .iter()
                .map(|item| {
                    if item.quantity > 1 {
                        format!("{} x{}", item.name, item.quantity)
                    } else {
                        item.name.clone()
                    }
                })
                .collect(),
            nearby_npcs: match &kb.current_location_id {
                Some(here) => kb
                    .discovered_npcs
                    .iter()
                    .filter(|npc| npc.location_id.as_ref() == Some(here))
                    .map(|npc| npc.name.clone())
                    .collect(),
                None => Vec::new(),
            },
            active_rules: kb.active_rules().map(|r| r.text.clone()).collect(),
        }
    }
}
