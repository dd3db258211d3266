use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    models::user::{MeResponse, UserProfile},
    services::leaderboard,
    state::AppState,
    utils::jwt::Claims,
};

const RECENT_AWARDS: i64 = 20;

/// Get current user's profile, rank and latest awards.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.store.get_user(&claims.sub).await?;
    let rank = state.store.rank_of(&user).await?;
    let recent_awards = state.store.list_awards(&user.id, RECENT_AWARDS).await?;

    Ok(Json(MeResponse {
        profile: UserProfile::from(&user),
        rank: rank.map(|r| leaderboard::entry(&user, r)),
        recent_awards,
    }))
}
