use rand::{seq::SliceRandom, Rng};

use crate::models::{flag_set, Catalog, FlashcardForm, FlashcardState, FlashcardView};
use crate::services::puzzle_game::percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashcardAction {
    ToggleShuffle,
    Reshuffle,
    Next,
    Prev,
    Reset,
}

impl FlashcardAction {
    /// Picks the action for a submitted form.
    ///
    /// `next` and `prev` only match when the move is possible, so a form that
    /// also carries `reset` falls through to it at either end of the deck.
    pub fn from_form(
        form: &FlashcardForm,
        state: &FlashcardState,
        card_count: usize,
    ) -> Option<Self> {
        if flag_set(&form.shuffle_toggle) {
            Some(Self::ToggleShuffle)
        } else if flag_set(&form.reshuffle) && state.shuffle {
            Some(Self::Reshuffle)
        } else if flag_set(&form.next) && state.index + 1 < card_count {
            Some(Self::Next)
        } else if flag_set(&form.prev) && state.index > 0 {
            Some(Self::Prev)
        } else if flag_set(&form.reset) {
            Some(Self::Reset)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToggleShuffle => "shuffle_toggle",
            Self::Reshuffle => "reshuffle",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Reset => "reset",
        }
    }
}

/// Paging over the flashcard table, optionally through a shuffled order.
pub struct FlashcardDeck<'a> {
    catalog: &'a Catalog,
    state: FlashcardState,
}

impl<'a> FlashcardDeck<'a> {
    pub fn resume(catalog: &'a Catalog, state: Option<FlashcardState>) -> Self {
        let state = match state {
            Some(state) if state.is_consistent(catalog.flashcard_count()) => state,
            Some(_) => {
                tracing::warn!("Discarding inconsistent flashcard state");
                FlashcardState::default()
            }
            None => FlashcardState::default(),
        };
        Self { catalog, state }
    }

    pub fn state(&self) -> &FlashcardState {
        &self.state
    }

    pub fn into_state(self) -> FlashcardState {
        self.state
    }

    fn last_index(&self) -> usize {
        self.catalog.flashcard_count().saturating_sub(1)
    }

    pub fn next(&mut self) -> bool {
        if self.state.index >= self.last_index() {
            return false;
        }
        self.state.index += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if self.state.index == 0 {
            return false;
        }
        self.state.index -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.state.index = 0;
    }

    pub fn toggle_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.state.shuffle {
            self.state.shuffle = false;
            self.state.order = None;
        } else {
            self.state.shuffle = true;
            self.state.order = Some(self.shuffled_order(rng));
        }
        self.state.index = 0;
    }

    /// New random order; only meaningful while shuffling.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.state.shuffle {
            return false;
        }
        self.state.order = Some(self.shuffled_order(rng));
        self.state.index = 0;
        true
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, action: FlashcardAction, rng: &mut R) {
        match action {
            FlashcardAction::ToggleShuffle => self.toggle_shuffle(rng),
            FlashcardAction::Reshuffle => {
                self.reshuffle(rng);
            }
            FlashcardAction::Next => {
                self.next();
            }
            FlashcardAction::Prev => {
                self.prev();
            }
            FlashcardAction::Reset => self.reset(),
        }
    }

    pub fn view(&self) -> FlashcardView {
        let total = self.catalog.flashcard_count();
        // `resume` guarantees the index and order fit the table.
        let card = &self.catalog.flashcards()[self.state.card_index()];

        FlashcardView {
            front: card.front.clone(),
            back: card.back.clone(),
            position: self.state.index + 1,
            total_cards: total,
            shuffle: self.state.shuffle,
            at_first: self.state.index == 0,
            at_last: self.state.index >= self.last_index(),
            progress_percent: percent(self.state.index + 1, total),
        }
    }

    fn shuffled_order<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.catalog.flashcard_count()).collect();
        order.shuffle(rng);
        order
    }
}
