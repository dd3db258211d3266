// src/handlers/problem.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::problem::{ProblemDetail, ProblemSummary, SubmitCodeRequest, SubmitCodeResponse},
    services::rules,
    state::AppState,
    utils::jwt::Claims,
};

pub async fn list_problems(State(state): State<AppState>) -> impl IntoResponse {
    let problems: Vec<ProblemSummary> = state
        .catalog
        .problems
        .iter()
        .map(ProblemSummary::from)
        .collect();
    Json(problems)
}

pub async fn get_problem(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let problem = state.catalog.problem(id)?;
    Ok(Json(ProblemDetail::from(problem)).into_response())
}

/// Judges a submission and pays out the problem's points.
///
/// * Runs every test case through the configured judge.
/// * All passed: applies the coding award. A problem pays out once per
///   user; later solves report `already_solved`.
pub async fn submit_solution(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let problem = state.catalog.problem(id)?;

    let verdict = state.judge.run(problem, req.language, &req.source).await?;
    if !verdict.all_passed {
        return Ok(Json(SubmitCodeResponse {
            verdict,
            points_awarded: 0,
            already_solved: false,
            total_points: None,
        }));
    }

    let award = rules::coding_problem_award(&claims.sub, problem, req.language);
    let outcome = state.store.apply_award(&award).await?;
    if outcome.applied() {
        tracing::info!(
            "User {} solved problem {} in {} (+{})",
            claims.sub,
            problem.id,
            req.language.as_str(),
            award.amount
        );
    }

    Ok(Json(SubmitCodeResponse {
        verdict,
        points_awarded: if outcome.applied() { award.amount } else { 0 },
        already_solved: !outcome.applied(),
        total_points: Some(outcome.total()),
    }))
}
