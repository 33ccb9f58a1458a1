//! # Saga Model
//!
//! The world schema for the cultivation saga: entity definitions, player
//! mechanics, and the `KnowledgeBase` aggregate that holds a running game.
//! This crate owns the data and its invariants and does not contain any AI,
//! persistence or orchestration logic.

pub mod entities;
pub mod knowledge_base;
pub mod mechanics;
pub mod messages;
pub mod saves;
pub mod settings;

pub use entities::*;
pub use knowledge_base::*;
pub use mechanics::*;
pub use messages::*;
pub use saves::*;
pub use settings::*;
