//! Rotating auto-save slots.

use serde::{Deserialize, Serialize};

use crate::entities::SaveId;

/// Number of auto-save slots kept per game.
pub const AUTO_SAVE_SLOT_COUNT: usize = 10;

/// Fixed-size ring of auto-save ids.
///
/// Each auto-save goes to the slot under the cursor, overwriting whatever save
/// that slot held, and the cursor then advances. The k-th auto-save (0-based)
/// therefore always lands in slot `k % AUTO_SAVE_SLOT_COUNT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveSlots {
    slot_ids: Vec<Option<SaveId>>,
    cursor: usize,
    /// Turns elapsed since the last auto-save.
    #[serde(default)]
    pub turn_counter: u32,
}

impl Default for AutoSaveSlots {
    fn default() -> Self {
        Self {
            slot_ids: vec![None; AUTO_SAVE_SLOT_COUNT],
            cursor: 0,
            turn_counter: 0,
        }
    }
}

impl AutoSaveSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_ids(&self) -> &[Option<SaveId>] {
        &self.slot_ids
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The save the next auto-save will overwrite, if the slot is occupied.
    pub fn target_slot(&self) -> Option<&SaveId> {
        self.slot_ids.get(self.cursor).and_then(Option::as_ref)
    }

    /// Store the id written by an auto-save and advance the cursor.
    ///
    /// Returns the id that was displaced, if it differs from the new one.
    pub fn commit(&mut self, id: SaveId) -> Option<SaveId> {
        if !self.is_well_formed() {
            self.repair();
        }
        let displaced = self.slot_ids[self.cursor].replace(id.clone());
        self.cursor = (self.cursor + 1) % self.slot_ids.len();
        self.turn_counter = 0;
        displaced.filter(|old| *old != id)
    }

    /// Ids currently referenced by a slot.
    pub fn live_ids(&self) -> impl Iterator<Item = &SaveId> {
        self.slot_ids.iter().flatten()
    }

    /// Whether the ring still has its fixed shape. Fails for corrupted saves.
    pub fn is_well_formed(&self) -> bool {
        self.slot_ids.len() == AUTO_SAVE_SLOT_COUNT && self.cursor < self.slot_ids.len()
    }

    /// Restore the fixed shape after loading a malformed save, keeping what fits.
    pub fn repair(&mut self) {
        self.slot_ids.resize(AUTO_SAVE_SLOT_COUNT, None);
        if self.cursor >= AUTO_SAVE_SLOT_COUNT {
            self.cursor = 0;
        }
    }
}
