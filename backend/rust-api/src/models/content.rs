use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A multiple-choice question. `answer` indexes into `choices`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Puzzle {
    pub id: u32,
    pub question: String,
    pub choices: Vec<String>,
    pub answer: usize,
}

impl Puzzle {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }

    pub fn correct_choice(&self) -> &str {
        &self.choices[self.answer]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no puzzles")]
    NoPuzzles,
    #[error("catalog has no flashcards")]
    NoFlashcards,
    #[error("puzzle {id} needs at least two choices")]
    TooFewChoices { id: u32 },
    #[error("puzzle {id} answer index {answer} is outside its {choices} choices")]
    AnswerOutOfRange { id: u32, answer: usize, choices: usize },
    #[error("puzzle id {0} is used more than once")]
    DuplicatePuzzleId(u32),
}

/// Static study content, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Catalog {
    puzzles: Vec<Puzzle>,
    flashcards: Vec<Flashcard>,
}

impl Catalog {
    pub fn new(puzzles: Vec<Puzzle>, flashcards: Vec<Flashcard>) -> Result<Self, CatalogError> {
        if puzzles.is_empty() {
            return Err(CatalogError::NoPuzzles);
        }
        if flashcards.is_empty() {
            return Err(CatalogError::NoFlashcards);
        }

        let mut seen = HashSet::new();
        for puzzle in &puzzles {
            if puzzle.choices.len() < 2 {
                return Err(CatalogError::TooFewChoices { id: puzzle.id });
            }
            if puzzle.answer >= puzzle.choices.len() {
                return Err(CatalogError::AnswerOutOfRange {
                    id: puzzle.id,
                    answer: puzzle.answer,
                    choices: puzzle.choices.len(),
                });
            }
            if !seen.insert(puzzle.id) {
                return Err(CatalogError::DuplicatePuzzleId(puzzle.id));
            }
        }

        Ok(Self {
            puzzles,
            flashcards,
        })
    }

    /// Japanese beginner set shipped with the server.
    pub fn builtin() -> Result<Self, CatalogError> {
        let puzzle = |id: u32, question: &str, choices: [&str; 4], answer: usize| Puzzle {
            id,
            question: question.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            answer,
        };

        let puzzles = vec![
            puzzle(
                1,
                "What is the meaning of '水' (mizu)?",
                ["Fire", "Water", "Tree", "Mountain"],
                1,
            ),
            puzzle(
                2,
                "What is the hiragana for 'neko' (cat)?",
                ["ねこ", "いぬ", "さる", "とり"],
                0,
            ),
            puzzle(3, "Which kanji means 'tree'?", ["山", "水", "木", "火"], 2),
            puzzle(
                4,
                "What is the romaji for 'ありがとう'?",
                ["arigatou", "konnichiwa", "sayonara", "ohayou"],
                0,
            ),
            puzzle(
                5,
                "What is the meaning of '火' (hi)?",
                ["Water", "Tree", "Fire", "Earth"],
                2,
            ),
        ];

        let flashcards = [
            ("私 (わたし)", "I/me"),
            ("ありがとう", "Thank you"),
            ("猫 (ねこ)", "Cat"),
            ("おはよう", "Good morning"),
            ("水 (みず)", "Water"),
            ("犬 (いぬ)", "Dog"),
            ("本 (ほん)", "Book"),
            ("日本 (にほん)", "Japan"),
            ("食べる (たべる)", "To eat"),
            ("飲む (のむ)", "To drink"),
        ]
        .into_iter()
        .map(|(front, back)| Flashcard {
            front: front.to_string(),
            back: back.to_string(),
        })
        .collect();

        Self::new(puzzles, flashcards)
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn puzzle(&self, index: usize) -> Option<&Puzzle> {
        self.puzzles.get(index)
    }

    pub fn puzzle_count(&self) -> usize {
        self.puzzles.len()
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn flashcard(&self, index: usize) -> Option<&Flashcard> {
        self.flashcards.get(index)
    }

    pub fn flashcard_count(&self) -> usize {
        self.flashcards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Flashcard {
        Flashcard {
            front: "犬".to_string(),
            back: "Dog".to_string(),
        }
    }

    fn puzzle(id: u32, answer: usize) -> Puzzle {
        Puzzle {
            id,
            question: "?".to_string(),
            choices: vec!["a".to_string(), "b".to_string()],
            answer,
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.puzzle_count(), 5);
        assert_eq!(catalog.flashcard_count(), 10);
        assert_eq!(catalog.puzzle(0).unwrap().correct_choice(), "Water");
        assert_eq!(catalog.flashcard(9).unwrap().back, "To drink");
    }

    #[test]
    fn rejects_answer_outside_choices() {
        let err = Catalog::new(vec![puzzle(1, 2)], vec![card()]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::AnswerOutOfRange {
                id: 1,
                answer: 2,
                choices: 2
            }
        );
    }

    #[test]
    fn rejects_duplicate_ids_and_empty_tables() {
        assert_eq!(
            Catalog::new(vec![puzzle(1, 0), puzzle(1, 1)], vec![card()]).unwrap_err(),
            CatalogError::DuplicatePuzzleId(1)
        );
        assert_eq!(
            Catalog::new(vec![], vec![card()]).unwrap_err(),
            CatalogError::NoPuzzles
        );
        assert_eq!(
            Catalog::new(vec![puzzle(1, 0)], vec![]).unwrap_err(),
            CatalogError::NoFlashcards
        );
    }
}
