// src/handlers/leaderboard.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::leaderboard::LeaderboardParams,
    services::leaderboard,
    state::AppState,
    utils::jwt::Claims,
};

/// Public top-N leaderboard.
///
/// `limit` is clamped to `1..=LEADERBOARD_LIMIT`. Users without points are
/// never listed.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let max = state.config.leaderboard_limit.max(1);
    let limit = params.limit.unwrap_or(max).clamp(1, max);

    let users = state.store.top_users(limit).await?;
    Ok(Json(leaderboard::project(users, limit as usize)))
}

/// The caller's own entry, `null` until they earn points.
pub async fn get_my_rank(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.store.get_user(&claims.sub).await?;
    let entry = state
        .store
        .rank_of(&user)
        .await?
        .map(|rank| leaderboard::entry(&user, rank));
    Ok(Json(entry))
}
