use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Form,
};
use std::sync::Arc;

use crate::{
    metrics::FLASHCARD_ACTIONS_TOTAL,
    models::{Catalog, FlashcardForm, FlashcardState},
    services::{
        flashcard_deck::{FlashcardAction, FlashcardDeck},
        session_service::{SessionJar, SessionService},
        AppState,
    },
};

use super::templates::{render, FlashcardTemplate};

/// GET /flashcard - Render the current card
pub async fn show_flashcard(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone(), state.config.session.clone());
    let mut session = service.load(&jar).await.map_err(super::internal_error)?;

    let deck = FlashcardDeck::resume(&state.catalog, session.data.flashcards.take());
    let view = deck.view();
    session.data.flashcards = Some(deck.into_state());

    let jar = service
        .save(jar, &session)
        .await
        .map_err(super::internal_error)?;

    let page = render(&FlashcardTemplate { view })?;
    Ok((jar, page))
}

/// POST /flashcard - Page through or reshuffle the deck
pub async fn submit_flashcard(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
    Form(form): Form<FlashcardForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone(), state.config.session.clone());
    let mut session = service.load(&jar).await.map_err(super::internal_error)?;

    let flashcards = apply_form(&state.catalog, session.data.flashcards.take(), &form);
    session.data.flashcards = Some(flashcards);

    let jar = service
        .save(jar, &session)
        .await
        .map_err(super::internal_error)?;

    Ok((jar, Redirect::to("/flashcard")))
}

fn apply_form(
    catalog: &Catalog,
    stored: Option<FlashcardState>,
    form: &FlashcardForm,
) -> FlashcardState {
    let mut deck = FlashcardDeck::resume(catalog, stored);

    let action = FlashcardAction::from_form(form, deck.state(), catalog.flashcard_count());
    if let Some(action) = action {
        deck.apply(action, &mut rand::rng());
        FLASHCARD_ACTIONS_TOTAL
            .with_label_values(&[action.as_str()])
            .inc();
    }

    deck.into_state()
}
