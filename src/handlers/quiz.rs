// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{AnswerRequest, CompletedQuiz, NextResponse, PublicStack, StartSessionRequest},
    services::{quiz::Answer, rules, sessions::NextStep},
    state::AppState,
    utils::jwt::Claims,
};

/// Lists the quiz stacks without their questions.
pub async fn list_stacks(State(state): State<AppState>) -> impl IntoResponse {
    let stacks: Vec<PublicStack> = state.catalog.stacks.iter().map(PublicStack::from).collect();
    Json(stacks)
}

/// Opens a quiz session on a stack. The countdown starts with `start`.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    // The award at the end needs a ledger record.
    state.store.get_user(&claims.sub).await?;
    let stack = state.catalog.stack(&req.stack_id)?.clone();
    let view = state.sessions.create(&claims.sub, stack).await;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.view(id, &claims.sub).await?))
}

pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.start(id, &claims.sub).await?))
}

/// Records the caller's choice for the current question.
///
/// The first answer is final; choices made after the reveal are ignored.
pub async fn answer_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.sessions.answer(id, &claims.sub, req.option).await?))
}

/// Moves past a revealed answer.
///
/// * Mid-quiz: returns the next question with a fresh countdown.
/// * After the last question: applies the quiz award once and returns the
///   final score with the caller's new total. If the award fails the
///   session is kept and the call can be repeated.
pub async fn next_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let finished = match state.sessions.next(id, &claims.sub).await? {
        NextStep::Question(session) => return Ok(Json(NextResponse::Question { session })),
        NextStep::Finished(finished) => finished,
    };

    let recorded = match rules::quiz_award(&claims.sub, &finished.stack, &finished.outcome) {
        Some(award) => state.store.apply_award(&award).await.map(|o| o.total()),
        None => state.store.get_user(&claims.sub).await.map(|u| u.points),
    };
    let total_points = match recorded {
        Ok(total) => total,
        Err(e) => {
            state.sessions.release(id).await;
            return Err(e);
        }
    };
    state.sessions.finish(id).await;

    tracing::info!(
        "User {} finished quiz '{}' with {}/{}",
        claims.sub,
        finished.stack.id,
        finished.outcome.score,
        finished.outcome.total_questions
    );

    Ok(Json(NextResponse::Completed {
        result: CompletedQuiz {
            stack_id: finished.stack.id,
            outcome: finished.outcome,
            answers: finished.answers.iter().map(Answer::index).collect(),
            total_points,
        },
    }))
}

/// Abandons a session. Nothing is awarded.
pub async fn abandon_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.abandon(id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}
