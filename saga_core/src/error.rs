//! Error taxonomy for the engine.
//!
//! Local failures (`Api`, `Economy`, `Navigation`, `Validation`) are rendered
//! where they happen. Storage, persistence and history corruption invalidate
//! the session and propagate to the top-level controller.

use saga_model::{BidError, ItemId, ValidationErrors};
use thiserror::Error;

use crate::history::HistoryError;
use crate::persist::PersistError;
use crate::screen::NavigationError;

/// Failure of an external AI call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("rate limited by the provider")]
    RateLimited,

    #[error("content blocked by safety settings")]
    Blocked,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no {0} service configured")]
    NotConfigured(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    #[error("not enough currency: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("item {0} is not in the inventory")]
    ItemNotFound(ItemId),

    #[error("cannot trade {requested} of an item when {available} are held")]
    NotEnoughQuantity { requested: u32, available: u32 },

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("price {0} is negative")]
    NegativePrice(i64),

    #[error("crafting needs at least one material")]
    NoMaterials,

    #[error(transparent)]
    Bid(#[from] BidError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage unavailable: {0}")]
    StorageInit(String),

    #[error("AI error: {0}")]
    Api(#[from] ApiError),

    #[error("history corrupted at turn {turn}: {reason}")]
    HistoryCorruption { turn: u32, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    History(HistoryError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Economy(#[from] EconomyError),

    #[error("busy: {0} in progress")]
    Busy(&'static str),

    #[error("no game is running")]
    NoActiveGame,

    #[error("no finished combat awaits resolution")]
    NoPostCombatState,

    #[error("no combat is in progress")]
    NoPendingCombat,
}

impl From<HistoryError> for EngineError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Corruption { turn, reason } => {
                EngineError::HistoryCorruption { turn, reason }
            }
            other => EngineError::History(other),
        }
    }
}

impl EngineError {
    /// Whether the error invalidates the whole session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::StorageInit(_)
                | EngineError::HistoryCorruption { .. }
                | EngineError::Persist(_)
        )
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
