use serde::{Deserialize, Serialize};

/// Per-visitor position in the flashcard deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashcardState {
    pub index: usize,
    pub shuffle: bool,
    pub order: Option<Vec<usize>>,
}

impl FlashcardState {
    pub fn is_consistent(&self, card_count: usize) -> bool {
        if card_count == 0 || self.index >= card_count {
            return false;
        }
        match (&self.order, self.shuffle) {
            (None, false) => true,
            (Some(order), true) => {
                let mut seen = vec![false; card_count];
                order.len() == card_count
                    && order.iter().all(|&i| {
                        if i >= card_count || seen[i] {
                            return false;
                        }
                        seen[i] = true;
                        true
                    })
            }
            _ => false,
        }
    }

    /// Catalog index of the card currently shown.
    pub fn card_index(&self) -> usize {
        match &self.order {
            Some(order) if self.shuffle => order[self.index],
            _ => self.index,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlashcardView {
    pub front: String,
    pub back: String,
    pub position: usize,
    pub total_cards: usize,
    pub shuffle: bool,
    pub at_first: bool,
    pub at_last: bool,
    pub progress_percent: u8,
}
