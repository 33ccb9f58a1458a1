//! Narrative log entries and the parsed shape of AI responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::MessageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Narration,
    PlayerAction,
    System,
    Error,
    PageSummary,
    EventSummary,
    Bulletin,
}

/// A choice offered to the player after a narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiChoice {
    pub text: String,
}

impl AiChoice {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Whether player input is an in-world action or an out-of-character story steer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerInputKind {
    #[default]
    Action,
    Story,
}

/// An entry in the narrative log. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMessage {
    pub id: MessageId,
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub choices: Vec<AiChoice>,
    #[serde(default)]
    pub is_player_input: bool,
    pub turn_number: u32,
}

impl GameMessage {
    pub fn new(message_type: MessageType, content: impl Into<String>, turn_number: u32) -> Self {
        Self {
            id: MessageId::new(),
            message_type,
            content: content.into(),
            timestamp: Utc::now(),
            choices: Vec::new(),
            is_player_input: matches!(message_type, MessageType::PlayerAction),
            turn_number,
        }
    }

    pub fn narration(content: impl Into<String>, choices: Vec<AiChoice>, turn_number: u32) -> Self {
        let mut message = Self::new(MessageType::Narration, content, turn_number);
        message.choices = choices;
        message
    }

    pub fn system(content: impl Into<String>, turn_number: u32) -> Self {
        Self::new(MessageType::System, content, turn_number)
    }
}

/// Structured response from the narrative AI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParsedAiResponse {
    pub narration: String,
    #[serde(default)]
    pub choices: Vec<AiChoice>,
    /// State-change directives, e.g. `CURRENCY_CHANGE: amount=-10`.
    #[serde(default)]
    pub tags: Vec<String>,
    pub system_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_action_flags_input() {
        let msg = GameMessage::new(MessageType::PlayerAction, "I bow to the elder", 3);
        assert!(msg.is_player_input);
        assert_eq!(msg.turn_number, 3);

        let narration = GameMessage::narration("The elder nods.", vec![AiChoice::new("Ask")], 3);
        assert!(!narration.is_player_input);
        assert_eq!(narration.choices.len(), 1);
    }

    #[test]
    fn test_message_type_wire_names() {
        let json = serde_json::to_string(&MessageType::PageSummary).unwrap();
        assert_eq!(json, "\"page_summary\"");
    }
}
