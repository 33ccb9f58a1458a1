//! Vector retrieval for narrative context.

use saga_model::{EntityType, KnowledgeBase, PlayerInputKind, VectorStore};
use serde::{Deserialize, Serialize};

/// A record pulled from the vector store, owned so it can outlive the store borrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub text: String,
    pub score: f32,
}

/// The `k` records most similar to `query`. Empty without a store or query.
pub fn retrieve(store: Option<&VectorStore>, query: Option<&[f32]>, k: usize) -> Vec<RetrievedContext> {
    let (Some(store), Some(query)) = (store, query) else {
        return Vec::new();
    };
    store
        .top_k(query, k)
        .into_iter()
        .map(|hit| RetrievedContext {
            entity_id: hit.metadata.entity_id.clone(),
            entity_type: hit.metadata.entity_type,
            text: hit.metadata.text.clone(),
            score: hit.score,
        })
        .collect()
}

/// Text to embed when searching for context relevant to a player action.
pub fn query_text(action: &str, kind: PlayerInputKind, kb: &KnowledgeBase) -> String {
    let mut query = String::from(action.trim());
    if kind == PlayerInputKind::Story {
        query.insert_str(0, "[story] ");
    }
    if let Some(location) = kb.current_location() {
        query.push_str(" @ ");
        query.push_str(&location.name);
    }
    query
}
