use serde::{Deserialize, Serialize};

pub mod content;
pub mod flashcard;
pub mod puzzle;

pub use content::{Catalog, CatalogError, Flashcard, Puzzle};
pub use flashcard::{FlashcardState, FlashcardView};
pub use puzzle::{AnswerResult, ChoiceView, PuzzleState, PuzzleView};

/// Everything remembered about one visitor between requests.
///
/// Each part is created lazily by the page that owns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisitorSession {
    #[serde(default)]
    pub puzzle: Option<PuzzleState>,
    #[serde(default)]
    pub flashcards: Option<FlashcardState>,
}

/// Form fields accepted by `POST /puzzle`.
#[derive(Debug, Default, Deserialize)]
pub struct PuzzleForm {
    pub choice: Option<String>,
    pub reset: Option<String>,
    pub review: Option<String>,
    pub exit_review: Option<String>,
    pub next: Option<String>,
    pub tryagain: Option<String>,
}

/// Form fields accepted by `POST /flashcard`.
#[derive(Debug, Default, Deserialize)]
pub struct FlashcardForm {
    pub shuffle_toggle: Option<String>,
    pub reshuffle: Option<String>,
    pub next: Option<String>,
    pub prev: Option<String>,
    pub reset: Option<String>,
}

/// Truthiness of an HTML form flag: present and non-empty.
pub fn flag_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
