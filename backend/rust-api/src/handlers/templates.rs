//! Askama page templates.

use askama::Template;
use axum::{http::StatusCode, response::Html};

use crate::models::{FlashcardView, PuzzleView};

#[derive(Template)]
#[template(path = "menu.html")]
pub struct MenuTemplate {}

#[derive(Template)]
#[template(path = "puzzle.html")]
pub struct PuzzleTemplate {
    pub view: PuzzleView,
}

#[derive(Template)]
#[template(path = "flashcard.html")]
pub struct FlashcardTemplate {
    pub view: FlashcardView,
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, (StatusCode, String)> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Failed to render template: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to render page".to_string(),
        )
    })
}
