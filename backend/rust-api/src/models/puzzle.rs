use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerResult {
    Correct,
    Incorrect,
}

/// Per-visitor progress through the puzzle deck.
///
/// `deck` holds indices into the catalog's puzzle table; in review mode it is
/// restricted to the puzzles that were answered incorrectly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleState {
    pub deck: Vec<usize>,
    pub position: usize,
    pub completed: BTreeSet<usize>,
    pub incorrect: BTreeSet<usize>,
    pub answered: bool,
    pub selected: Option<usize>,
    pub last_result: Option<AnswerResult>,
    pub review_mode: bool,
    pub review_completed: BTreeSet<usize>,
}

impl PuzzleState {
    /// Puzzle index at the current position.
    pub fn current(&self) -> usize {
        self.deck[self.position]
    }

    /// Checks the structural invariants against a catalog of `puzzle_count` puzzles.
    pub fn is_consistent(&self, puzzle_count: usize) -> bool {
        let in_table = |idx: &usize| *idx < puzzle_count;

        if self.deck.is_empty() || self.position >= self.deck.len() {
            return false;
        }
        if !self.deck.iter().all(in_table)
            || !self.completed.iter().all(in_table)
            || !self.incorrect.iter().all(in_table)
            || !self.review_completed.iter().all(in_table)
        {
            return false;
        }

        let unique: BTreeSet<_> = self.deck.iter().collect();
        if unique.len() != self.deck.len() {
            return false;
        }
        if !self.review_mode && self.deck.len() != puzzle_count {
            return false;
        }
        if self.answered != self.last_result.is_some() || self.answered != self.selected.is_some()
        {
            return false;
        }
        true
    }
}

/// One rendered answer option.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub index: usize,
    pub text: String,
    pub selected: bool,
    /// Only set once the puzzle has been answered.
    pub is_answer: bool,
}

/// Snapshot handed to the puzzle template.
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleView {
    pub puzzle_id: u32,
    pub question: String,
    pub choices: Vec<ChoiceView>,
    pub question_number: usize,
    pub total_questions: usize,
    pub answered: bool,
    pub result: Option<AnswerResult>,
    pub correct_answer: Option<String>,
    pub completed_count: usize,
    pub incorrect_count: usize,
    pub progress_percent: u8,
    /// Every puzzle in the active run (full table or review deck) is done.
    pub all_completed: bool,
    pub review_mode: bool,
    pub can_review: bool,
    pub is_last: bool,
}

impl PuzzleView {
    pub fn is_correct(&self) -> bool {
        self.result == Some(AnswerResult::Correct)
    }

    pub fn is_incorrect(&self) -> bool {
        self.result == Some(AnswerResult::Incorrect)
    }

    pub fn correct_answer_text(&self) -> &str {
        self.correct_answer.as_deref().unwrap_or_default()
    }
}
