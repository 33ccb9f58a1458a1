//! # Saga Core
//!
//! The engine behind an AI-narrated cultivation game. This crate sits on top
//! of `saga_model`, records every turn so any earlier state can be rebuilt,
//! and assembles context for the narrative AI.
//!
//! ## Core Components
//!
//! - **history**: Keyframe/delta turn history, JSON patches, summary pages
//! - **session**: `GameSession`, the one object that mutates a running game
//! - **screen**: Active screen, modals and overlays
//! - **context_assembler**: Builds narrative requests, including vector retrieval
//! - **directives**: State changes carried in AI responses
//! - **persist**: Save files and the in-memory store
//! - **ports**: Traits for the AI, embeddings, avatars, crafting and save storage
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: Every screen and overlay is derived from session and knowledge base state
//! - **Replayable**: Any recorded turn can be reconstructed exactly
//! - **Pluggable**: External services are reached only through the port traits

pub mod config;
pub mod context_assembler;
pub mod directives;
pub mod error;
pub mod history;
pub mod persist;
pub mod ports;
pub mod screen;
pub mod session;

pub use config::*;
pub use context_assembler::*;
pub use directives::{Directive, DirectiveError};
pub use error::*;
pub use history::*;
pub use persist::*;
pub use ports::*;
pub use screen::*;
pub use session::*;
