//! Turn History - point-in-time reconstruction of game state.
//!
//! Every recorded turn is stored either as a keyframe (full snapshot of the
//! knowledge base and message log) or as a delta (two RFC 6902 JSON patches
//! relative to the previous recorded turn). Reconstruction replays deltas from the nearest
//! keyframe at or before the requested turn.
//!
//! Snapshots are canonical `serde_json::Value`s. All maps in the model are
//! ordered, so identical states always serialize identically.

pub mod pagination;

pub use pagination::*;

use json_patch::Patch;
use saga_model::{GameMessage, KnowledgeBase};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Keyframe placement thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of deltas following a keyframe.
    pub max_delta_chain: usize,

    /// A delta larger than this fraction of the full snapshot is stored as a keyframe instead.
    pub max_delta_ratio: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_delta_chain: 10,
            max_delta_ratio: 0.5,
        }
    }
}

/// How much history `prune` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Number of most recent keyframes (with their deltas) to keep. At least one is always kept.
    pub keep_keyframes: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep_keyframes: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Keyframe,
    Delta,
}

/// One recorded turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Keyframe {
        turn: u32,
        knowledge_base: Value,
        messages: Value,
    },
    Delta {
        turn: u32,
        knowledge_base_ops: Patch,
        message_ops: Patch,
    },
}

impl HistoryEntry {
    pub fn turn(&self) -> u32 {
        match self {
            HistoryEntry::Keyframe { turn, .. } | HistoryEntry::Delta { turn, .. } => *turn,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            HistoryEntry::Keyframe { .. } => EntryKind::Keyframe,
            HistoryEntry::Delta { .. } => EntryKind::Delta,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, HistoryEntry::Keyframe { .. })
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("turn {turn} is not after the latest recorded turn {latest}")]
    NonMonotonicTurn { turn: u32, latest: u32 },

    #[error("turn {0} is not in the history")]
    TurnNotRecorded(u32),

    /// Replay failed. Only a defect in recording can cause this.
    #[error("history corrupted at turn {turn}: {reason}")]
    Corruption { turn: u32, reason: String },

    #[error("failed to encode state for turn {turn}: {source}")]
    Encode {
        turn: u32,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot/delta history of recorded turns, strictly ordered by turn number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnHistory {
    entries: Vec<HistoryEntry>,

    #[serde(default)]
    config: HistoryConfig,

    /// State at the latest recorded turn, the base for the next delta.
    #[serde(skip)]
    last_state: Option<(Value, Value)>,
}

impl TurnHistory {
    /// Create an empty history with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Record the state after `turn`.
    ///
    /// A keyframe is written when there is no earlier keyframe, when the delta
    /// chain has reached `max_delta_chain`, or when the delta would exceed
    /// `max_delta_ratio` of the full snapshot.
    pub fn record_turn(
        &mut self,
        turn: u32,
        knowledge_base: &KnowledgeBase,
        messages: &[GameMessage],
    ) -> Result<EntryKind, HistoryError> {
        if let Some(latest) = self.latest_turn() {
            if turn <= latest {
                return Err(HistoryError::NonMonotonicTurn { turn, latest });
            }
        }

        let kb_value = encode(turn, knowledge_base)?;
        let msg_value = encode(turn, messages)?;

        self.ensure_base()?;

        let entry = match &self.last_state {
            Some((last_kb, last_msgs)) if self.chain_length() < self.config.max_delta_chain => {
                let knowledge_base_ops = json_patch::diff(last_kb, &kb_value);
                let message_ops = json_patch::diff(last_msgs, &msg_value);

                let delta_size = encoded_len(turn, &knowledge_base_ops)? + encoded_len(turn, &message_ops)?;
                let snapshot_size = encoded_len(turn, &kb_value)? + encoded_len(turn, &msg_value)?;
                if delta_size as f64 > self.config.max_delta_ratio * snapshot_size as f64 {
                    tracing::debug!(
                        turn,
                        delta_size,
                        snapshot_size,
                        "delta too large, writing keyframe"
                    );
                    None
                } else {
                    Some(HistoryEntry::Delta {
                        turn,
                        knowledge_base_ops,
                        message_ops,
                    })
                }
            }
            _ => None,
        };

        let entry = entry.unwrap_or_else(|| HistoryEntry::Keyframe {
            turn,
            knowledge_base: kb_value.clone(),
            messages: msg_value.clone(),
        });
        let kind = entry.kind();
        tracing::debug!(turn, ?kind, "recorded turn");

        self.entries.push(entry);
        self.last_state = Some((kb_value, msg_value));
        Ok(kind)
    }

    /// Rebuild the exact state recorded for `turn`.
    pub fn reconstruct(&self, turn: u32) -> Result<(KnowledgeBase, Vec<GameMessage>), HistoryError> {
        let index = self.index_of(turn)?;
        let (kb_value, msg_value) = self.replay(index)?;

        let knowledge_base = serde_json::from_value(kb_value)
            .map_err(|e| corruption(turn, format!("knowledge base does not deserialize: {}", e)))?;
        let messages = serde_json::from_value(msg_value)
            .map_err(|e| corruption(turn, format!("message log does not deserialize: {}", e)))?;
        Ok((knowledge_base, messages))
    }

    /// Drop entries older than the retained keyframes. Returns how many were removed.
    pub fn prune(&mut self, policy: RetentionPolicy) -> usize {
        let keep = policy.keep_keyframes.max(1);
        let keyframes: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_keyframe())
            .map(|(i, _)| i)
            .collect();

        if keyframes.len() <= keep {
            return 0;
        }

        let cut = keyframes[keyframes.len() - keep];
        self.entries.drain(..cut);
        tracing::info!(removed = cut, kept = self.entries.len(), "pruned turn history");
        cut
    }

    /// Forget every turn after `turn`, making it the latest. Returns how many were removed.
    pub fn truncate_after(&mut self, turn: u32) -> Result<usize, HistoryError> {
        let index = self.index_of(turn)?;
        let base = self.replay(index)?;
        let removed = self.entries.len() - (index + 1);
        self.entries.truncate(index + 1);
        self.last_state = Some(base);
        Ok(removed)
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_state = None;
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest_turn(&self) -> Option<u32> {
        self.entries.last().map(HistoryEntry::turn)
    }

    pub fn oldest_turn(&self) -> Option<u32> {
        self.entries.first().map(HistoryEntry::turn)
    }

    pub fn recorded_turns(&self) -> Vec<u32> {
        self.entries.iter().map(HistoryEntry::turn).collect()
    }

    pub fn keyframe_turns(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| e.is_keyframe())
            .map(HistoryEntry::turn)
            .collect()
    }

    /// Deltas written since the latest keyframe.
    fn chain_length(&self) -> usize {
        self.entries
            .iter()
            .rev()
            .take_while(|e| !e.is_keyframe())
            .count()
    }

    fn index_of(&self, turn: u32) -> Result<usize, HistoryError> {
        self.entries
            .binary_search_by_key(&turn, HistoryEntry::turn)
            .map_err(|_| HistoryError::TurnNotRecorded(turn))
    }

    /// The diff base is not serialized; rebuild it after loading a save.
    fn ensure_base(&mut self) -> Result<(), HistoryError> {
        if self.last_state.is_none() && !self.entries.is_empty() {
            let latest = self.entries.len() - 1;
            self.last_state = Some(self.replay(latest)?);
        }
        Ok(())
    }

    fn replay(&self, index: usize) -> Result<(Value, Value), HistoryError> {
        let turn = self.entries[index].turn();
        let start = self.entries[..=index]
            .iter()
            .rposition(HistoryEntry::is_keyframe)
            .ok_or_else(|| corruption(turn, "no keyframe at or before this turn".to_string()))?;

        let (mut kb_value, mut msg_value) = match &self.entries[start] {
            HistoryEntry::Keyframe {
                knowledge_base,
                messages,
                ..
            } => (knowledge_base.clone(), messages.clone()),
            HistoryEntry::Delta { .. } => {
                return Err(corruption(turn, "expected keyframe".to_string()))
            }
        };

        for entry in &self.entries[start + 1..=index] {
            if let HistoryEntry::Delta {
                turn: delta_turn,
                knowledge_base_ops,
                message_ops,
            } = entry
            {
                json_patch::patch(&mut kb_value, &knowledge_base_ops.0).map_err(|e| {
                    corruption(turn, format!("knowledge base delta of turn {}: {}", delta_turn, e))
                })?;
                json_patch::patch(&mut msg_value, &message_ops.0).map_err(|e| {
                    corruption(turn, format!("message delta of turn {}: {}", delta_turn, e))
                })?;
            }
        }

        Ok((kb_value, msg_value))
    }
}

fn encode<T: Serialize + ?Sized>(turn: u32, value: &T) -> Result<Value, HistoryError> {
    serde_json::to_value(value).map_err(|source| HistoryError::Encode { turn, source })
}

fn encoded_len<T: Serialize + ?Sized>(turn: u32, value: &T) -> Result<usize, HistoryError> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(|source| HistoryError::Encode { turn, source })
}

fn corruption(turn: u32, reason: String) -> HistoryError {
    tracing::error!(turn, %reason, "turn history corruption");
    HistoryError::Corruption { turn, reason }
}
