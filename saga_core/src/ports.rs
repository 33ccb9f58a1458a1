//! Ports to external collaborators: the narrative AI, embeddings, avatar
//! generation, item crafting and save storage.

use std::sync::Arc;

use async_trait::async_trait;
use saga_model::{GameMessage, Item, ParsedAiResponse, SaveId};

use crate::error::ApiError;
use crate::persist::{PersistError, SaveGameData, SaveGameMeta};
use crate::context_assembler::NarrativeRequest;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Narrate the outcome of a player action.
    async fn generate(&self, request: &NarrativeRequest) -> Result<ParsedAiResponse, ApiError>;

    /// Summarize one page of the message log.
    async fn summarize(&self, messages: &[GameMessage]) -> Result<String, ApiError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarGenerator: Send + Sync {
    /// Generate an image for `prompt` and return its URL.
    async fn generate_avatar(&self, prompt: &str) -> Result<String, ApiError>;
}

/// Materials placed in the spirit cauldron and what the player hopes to make.
#[derive(Debug, Clone, PartialEq)]
pub struct CraftingRequest {
    /// The consumed units of each material.
    pub materials: Vec<Item>,
    pub intent: String,
    pub player_realm: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemCrafter: Send + Sync {
    /// Decide what the cauldron produces.
    async fn craft(&self, request: &CraftingRequest) -> Result<Item, ApiError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaveStore: Send + Sync {
    /// Prepare the backend. Called once at startup.
    async fn init(&self) -> Result<(), PersistError>;
    async fn save(&self, data: &SaveGameData) -> Result<SaveGameMeta, PersistError>;
    async fn load(&self, id: &SaveId) -> Result<SaveGameData, PersistError>;
    /// Saves ordered newest first.
    async fn list(&self) -> Result<Vec<SaveGameMeta>, PersistError>;
    async fn delete(&self, id: &SaveId) -> Result<(), PersistError>;
}

/// The collaborators a session talks to.
#[derive(Clone)]
pub struct Ports {
    pub narrative: Arc<dyn NarrativeGenerator>,
    pub embeddings: Option<Arc<dyn EmbeddingProvider>>,
    pub avatars: Arc<dyn AvatarGenerator>,
    pub crafter: Option<Arc<dyn ItemCrafter>>,
    pub saves: Arc<dyn SaveStore>,
}

impl Ports {
    pub fn new(
        narrative: Arc<dyn NarrativeGenerator>,
        avatars: Arc<dyn AvatarGenerator>,
        saves: Arc<dyn SaveStore>,
    ) -> Self {
        Self {
            narrative,
            embeddings: None,
            avatars,
            crafter: None,
            saves,
        }
    }

    pub fn with_embeddings(mut self, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn with_crafter(mut self, crafter: Arc<dyn ItemCrafter>) -> Self {
        self.crafter = Some(crafter);
        self
    }
}
