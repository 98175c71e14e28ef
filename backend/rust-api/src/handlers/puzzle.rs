use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Form,
};
use std::sync::Arc;

use crate::{
    metrics::{ANSWERS_SUBMITTED_TOTAL, DECK_RESTARTS_TOTAL, REVIEW_REQUESTS_TOTAL},
    models::{AnswerResult, Catalog, PuzzleForm, PuzzleState, PuzzleView},
    services::{
        puzzle_game::{Outcome, PuzzleAction, PuzzleGame},
        session_service::{SessionJar, SessionService},
        AppState,
    },
};

use super::templates::{render, PuzzleTemplate};

/// GET /puzzle - Render the visitor's current puzzle
pub async fn show_puzzle(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone(), state.config.session.clone());
    let mut session = service.load(&jar).await.map_err(super::internal_error)?;

    let (puzzle, view) = resume(&state.catalog, session.data.puzzle.take());
    session.data.puzzle = Some(puzzle);

    let jar = service
        .save(jar, &session)
        .await
        .map_err(super::internal_error)?;

    let page = render(&PuzzleTemplate { view })?;
    Ok((jar, page))
}

/// POST /puzzle - Apply one form action, then redirect back to the page
pub async fn submit_puzzle(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
    Form(form): Form<PuzzleForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone(), state.config.session.clone());
    let mut session = service.load(&jar).await.map_err(super::internal_error)?;

    let (puzzle, outcome) = apply_form(&state.catalog, session.data.puzzle.take(), &form);

    if let Some(outcome) = outcome {
        tracing::debug!("Session {}: puzzle outcome {:?}", session.id, outcome);
        record_outcome(outcome, puzzle.review_mode);
    }
    session.data.puzzle = Some(puzzle);

    let jar = service
        .save(jar, &session)
        .await
        .map_err(super::internal_error)?;

    Ok((jar, Redirect::to("/puzzle")))
}

fn resume(catalog: &Catalog, stored: Option<PuzzleState>) -> (PuzzleState, PuzzleView) {
    let mut rng = rand::rng();
    let game = PuzzleGame::resume(catalog, stored, &mut rng);
    let view = game.view();
    (game.into_state(), view)
}

fn apply_form(
    catalog: &Catalog,
    stored: Option<PuzzleState>,
    form: &PuzzleForm,
) -> (PuzzleState, Option<Outcome>) {
    let mut rng = rand::rng();
    let mut game = PuzzleGame::resume(catalog, stored, &mut rng);

    let outcome = PuzzleAction::from_form(form, game.state().answered)
        .map(|action| game.apply(action, &mut rng));

    (game.into_state(), outcome)
}

fn record_outcome(outcome: Outcome, review_mode: bool) {
    let mode = if review_mode { "review" } else { "normal" };

    match outcome {
        Outcome::Answered(result) => {
            let correct = if result == AnswerResult::Correct {
                "true"
            } else {
                "false"
            };
            ANSWERS_SUBMITTED_TOTAL
                .with_label_values(&[correct, mode])
                .inc();
        }
        Outcome::ReviewStarted => {
            REVIEW_REQUESTS_TOTAL.with_label_values(&["started"]).inc();
        }
        Outcome::ReviewRejected => {
            REVIEW_REQUESTS_TOTAL.with_label_values(&["rejected"]).inc();
        }
        Outcome::Restarted => {
            DECK_RESTARTS_TOTAL.with_label_values(&["exhausted"]).inc();
        }
        Outcome::Reset => {
            DECK_RESTARTS_TOTAL.with_label_values(&["reset"]).inc();
        }
        Outcome::ReviewExited => {
            DECK_RESTARTS_TOTAL.with_label_values(&["exit_review"]).inc();
        }
        Outcome::Retried | Outcome::Advanced | Outcome::Ignored => {}
    }
}
