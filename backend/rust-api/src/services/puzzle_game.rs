//! Puzzle deck state machine.
//!
//! A visitor works through a shuffled deck of puzzle indices. Each puzzle is
//! evaluated at most once until the visitor asks to try again or moves on.
//! Missed puzzles can be replayed in review mode, which swaps the active deck
//! for a shuffled copy of the incorrect set.
//!
//! Everything here is synchronous and takes its randomness as a parameter, so
//! the web layer only has to load the state, call [`step`], and store the
//! result.

use rand::{seq::SliceRandom, Rng};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::{
    flag_set, AnswerResult, Catalog, ChoiceView, PuzzleForm, PuzzleState, PuzzleView,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no incorrectly answered puzzles to review")]
    NothingToReview,
    #[error("no puzzles left in the active deck")]
    DeckExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleAction {
    Choose(usize),
    TryAgain,
    Next,
    EnterReview,
    ExitReview,
    Reset,
}

impl PuzzleAction {
    /// Picks the single action a submitted form asks for.
    ///
    /// Fields are checked in a fixed order and the first match wins. A choice
    /// only counts while the current puzzle is unanswered; a choice that is
    /// not a number is swallowed rather than falling through to later fields.
    pub fn from_form(form: &PuzzleForm, answered: bool) -> Option<Self> {
        if flag_set(&form.reset) {
            return Some(Self::Reset);
        }
        if let Some(choice) = form.choice.as_deref() {
            if !answered {
                return choice.trim().parse().ok().map(Self::Choose);
            }
        }
        if flag_set(&form.review) {
            Some(Self::EnterReview)
        } else if flag_set(&form.exit_review) {
            Some(Self::ExitReview)
        } else if flag_set(&form.next) {
            Some(Self::Next)
        } else if flag_set(&form.tryagain) {
            Some(Self::TryAgain)
        } else {
            None
        }
    }
}

/// What applying an action did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered(AnswerResult),
    Retried,
    Advanced,
    /// The deck ran out and was replaced by a fresh shuffle.
    Restarted,
    ReviewStarted,
    ReviewRejected,
    ReviewExited,
    Reset,
    Ignored,
}

pub struct PuzzleGame<'a> {
    catalog: &'a Catalog,
    state: PuzzleState,
}

impl<'a> PuzzleGame<'a> {
    pub fn new<R: Rng + ?Sized>(catalog: &'a Catalog, rng: &mut R) -> Self {
        Self {
            catalog,
            state: fresh_state(catalog.puzzle_count(), rng),
        }
    }

    /// Continues from a stored state, starting over if it is missing or does
    /// not fit the catalog.
    pub fn resume<R: Rng + ?Sized>(
        catalog: &'a Catalog,
        state: Option<PuzzleState>,
        rng: &mut R,
    ) -> Self {
        match state {
            Some(state) if state.is_consistent(catalog.puzzle_count()) => Self { catalog, state },
            Some(_) => {
                tracing::warn!("Discarding inconsistent puzzle state, starting a new deck");
                Self::new(catalog, rng)
            }
            None => Self::new(catalog, rng),
        }
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn into_state(self) -> PuzzleState {
        self.state
    }

    /// Evaluates `choice` against the current puzzle.
    ///
    /// Returns `None` when the puzzle was already answered or the choice does
    /// not exist.
    pub fn submit_choice(&mut self, choice: usize) -> Option<AnswerResult> {
        if self.state.answered {
            return None;
        }

        let index = self.state.current();
        let puzzle = self.catalog.puzzle(index)?;
        if choice >= puzzle.choices.len() {
            return None;
        }

        let result = if puzzle.is_correct(choice) {
            // Review progress is tracked separately from the main run.
            if self.state.review_mode {
                self.state.review_completed.insert(index);
            } else {
                self.state.completed.insert(index);
            }
            self.state.incorrect.remove(&index);
            AnswerResult::Correct
        } else {
            self.state.incorrect.insert(index);
            AnswerResult::Incorrect
        };

        self.state.answered = true;
        self.state.selected = Some(choice);
        self.state.last_result = Some(result);
        Some(result)
    }

    /// Clears the answer for the current puzzle so it can be attempted again.
    pub fn try_again(&mut self) -> bool {
        if !self.state.answered {
            return false;
        }
        self.clear_answer();
        true
    }

    pub fn advance(&mut self) -> Result<(), GameError> {
        if self.state.position + 1 >= self.state.deck.len() {
            return Err(GameError::DeckExhausted);
        }
        self.state.position += 1;
        self.clear_answer();
        Ok(())
    }

    pub fn enter_review<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if self.state.incorrect.is_empty() {
            return Err(GameError::NothingToReview);
        }

        let mut deck: Vec<usize> = self.state.incorrect.iter().copied().collect();
        deck.shuffle(rng);

        self.state.deck = deck;
        self.state.position = 0;
        self.state.review_mode = true;
        self.state.review_completed.clear();
        self.clear_answer();
        Ok(())
    }

    /// Leaves review mode with a completely new deck. No-op outside review.
    pub fn exit_review<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.state.review_mode {
            return false;
        }
        self.reset(rng);
        true
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state = fresh_state(self.catalog.puzzle_count(), rng);
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, action: PuzzleAction, rng: &mut R) -> Outcome {
        match action {
            PuzzleAction::Choose(choice) => self
                .submit_choice(choice)
                .map_or(Outcome::Ignored, Outcome::Answered),
            PuzzleAction::TryAgain => {
                if self.try_again() {
                    Outcome::Retried
                } else {
                    Outcome::Ignored
                }
            }
            PuzzleAction::Next => match self.advance() {
                Ok(()) => Outcome::Advanced,
                Err(GameError::DeckExhausted) => {
                    self.reset(rng);
                    Outcome::Restarted
                }
                Err(_) => Outcome::Ignored,
            },
            PuzzleAction::EnterReview => match self.enter_review(rng) {
                Ok(()) => Outcome::ReviewStarted,
                Err(e) => {
                    tracing::debug!("Review request rejected: {}", e);
                    Outcome::ReviewRejected
                }
            },
            PuzzleAction::ExitReview => {
                if self.exit_review(rng) {
                    Outcome::ReviewExited
                } else {
                    Outcome::Ignored
                }
            }
            PuzzleAction::Reset => {
                self.reset(rng);
                Outcome::Reset
            }
        }
    }

    /// Completed puzzles against the size of the active run.
    fn progress(&self) -> (usize, usize) {
        if self.state.review_mode {
            (self.state.review_completed.len(), self.state.deck.len())
        } else {
            (self.state.completed.len(), self.catalog.puzzle_count())
        }
    }

    pub fn progress_percent(&self) -> u8 {
        let (done, total) = self.progress();
        percent(done, total)
    }

    pub fn all_completed(&self) -> bool {
        let (done, total) = self.progress();
        total > 0 && done >= total
    }

    pub fn view(&self) -> PuzzleView {
        let state = &self.state;
        let index = state.current();
        // `resume` guarantees the deck only holds catalog indices.
        let puzzle = &self.catalog.puzzles()[index];

        let choices = puzzle
            .choices
            .iter()
            .enumerate()
            .map(|(i, text)| ChoiceView {
                index: i,
                text: text.clone(),
                selected: state.selected == Some(i),
                is_answer: state.answered && puzzle.is_correct(i),
            })
            .collect();

        PuzzleView {
            puzzle_id: puzzle.id,
            question: puzzle.question.clone(),
            choices,
            question_number: state.position + 1,
            total_questions: state.deck.len(),
            answered: state.answered,
            result: state.last_result,
            correct_answer: state
                .answered
                .then(|| puzzle.correct_choice().to_string()),
            completed_count: self.progress().0,
            incorrect_count: state.incorrect.len(),
            progress_percent: self.progress_percent(),
            all_completed: self.all_completed(),
            review_mode: state.review_mode,
            can_review: !state.review_mode && !state.incorrect.is_empty(),
            is_last: state.position + 1 == state.deck.len(),
        }
    }

    fn clear_answer(&mut self) {
        self.state.answered = false;
        self.state.selected = None;
        self.state.last_result = None;
    }
}

/// Applies one action to a stored state and returns the state to store next.
pub fn step<R: Rng + ?Sized>(
    catalog: &Catalog,
    state: Option<PuzzleState>,
    action: PuzzleAction,
    rng: &mut R,
) -> (PuzzleState, Outcome) {
    let mut game = PuzzleGame::resume(catalog, state, rng);
    let outcome = game.apply(action, rng);
    (game.into_state(), outcome)
}

fn fresh_state<R: Rng + ?Sized>(puzzle_count: usize, rng: &mut R) -> PuzzleState {
    let mut deck: Vec<usize> = (0..puzzle_count).collect();
    deck.shuffle(rng);

    PuzzleState {
        deck,
        position: 0,
        completed: BTreeSet::new(),
        incorrect: BTreeSet::new(),
        answered: false,
        selected: None,
        last_result: None,
        review_mode: false,
        review_completed: BTreeSet::new(),
    }
}

pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = (done.min(total) * 100 + total / 2) / total;
    scaled as u8
}
