//! Fixed-size pages of turns for AI summaries.
//!
//! Pages are 1-based: page `p` covers turns `(p - 1) * size + 1 ..= p * size`.
//! Turn 0 is the game opening and belongs to no page.

use saga_model::PageLedger;
use serde::{Deserialize, Serialize};

/// The turns covered by one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub page: u32,
    pub first_turn: u32,
    pub last_turn: u32,
}

impl PageRange {
    pub fn contains(&self, turn: u32) -> bool {
        (self.first_turn..=self.last_turn).contains(&turn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Page number holding `turn`, or 0 for the opening turn.
    pub fn page_of(&self, turn: u32) -> u32 {
        if turn == 0 {
            0
        } else {
            (turn - 1) / self.page_size + 1
        }
    }

    pub fn range(&self, page: u32) -> PageRange {
        let page = page.max(1);
        PageRange {
            page,
            first_turn: (page - 1) * self.page_size + 1,
            last_turn: page * self.page_size,
        }
    }

    /// Track `turn` in the currently open page, starting a fresh page window when it moves on.
    pub fn note_turn(&self, ledger: &mut PageLedger, turn: u32) {
        let page = self.page_of(turn);
        let same_page = ledger
            .current_page_history
            .first()
            .map(|first| self.page_of(*first) == page)
            .unwrap_or(false);
        if !same_page {
            ledger.current_page_history.clear();
        }
        if ledger.current_page_history.last() != Some(&turn) {
            ledger.current_page_history.push(turn);
        }
    }

    /// The first fully played page that has not been summarized yet.
    pub fn pending_page(&self, ledger: &PageLedger, current_turn: u32) -> Option<PageRange> {
        let next = ledger.last_summarized_turn / self.page_size + 1;
        let range = self.range(next);
        (current_turn >= range.last_turn).then_some(range)
    }

    /// Store the summary of a page and mark its turns as summarized.
    pub fn store_summary(&self, ledger: &mut PageLedger, range: PageRange, summary: impl Into<String>) {
        ledger.page_summaries.insert(range.page, summary.into());
        ledger.last_summarized_turn = ledger.last_summarized_turn.max(range.last_turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_one_based() {
        let pages = Paginator::new(10);
        assert_eq!(pages.page_of(0), 0);
        assert_eq!(pages.page_of(1), 1);
        assert_eq!(pages.page_of(10), 1);
        assert_eq!(pages.page_of(11), 2);
        assert_eq!(
            pages.range(2),
            PageRange {
                page: 2,
                first_turn: 11,
                last_turn: 20
            }
        );
    }

    #[test]
    fn test_current_page_window_resets() {
        let pages = Paginator::new(3);
        let mut ledger = PageLedger::default();
        for turn in 1..=4 {
            pages.note_turn(&mut ledger, turn);
        }
        assert_eq!(ledger.current_page_history, vec![4]);
        pages.note_turn(&mut ledger, 5);
        pages.note_turn(&mut ledger, 5);
        assert_eq!(ledger.current_page_history, vec![4, 5]);
    }

    #[test]
    fn test_pending_page_waits_for_full_page() {
        let pages = Paginator::new(10);
        let mut ledger = PageLedger::default();
        assert_eq!(pages.pending_page(&ledger, 9), None);

        let first = pages.pending_page(&ledger, 12).unwrap();
        assert_eq!(first.page, 1);

        pages.store_summary(&mut ledger, first, "The journey began.");
        assert_eq!(ledger.last_summarized_turn, 10);
        assert_eq!(ledger.page_summaries[&1], "The journey began.");
        assert_eq!(pages.pending_page(&ledger, 12), None);
        assert_eq!(pages.pending_page(&ledger, 20).map(|r| r.page), Some(2));
    }
}
