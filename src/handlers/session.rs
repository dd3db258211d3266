// src/handlers/session.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    identity::IdentityEvent,
    models::user::{NewUser, SignInRequest, UserProfile},
    state::AppState,
    utils::{html::clean_optional, jwt::Claims},
};

/// Called by the client right after the identity provider signs a user in.
///
/// * Creates the user record on first authentication (all counters at zero).
/// * Refreshes name, email and photo from the token claims.
/// * Publishes `SignedIn` to identity listeners.
pub async fn sign_in(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state
        .store
        .ensure_user(&NewUser {
            id: claims.sub.clone(),
            display_name: clean_optional(claims.name.as_deref()),
            email: claims.email.clone(),
            college: clean_optional(req.college.as_deref()),
            photo_url: claims.picture.clone(),
        })
        .await?;

    tracing::info!("User {} signed in", user.id);
    state.identity.publish(IdentityEvent::SignedIn {
        user_id: user.id.clone(),
    });

    Ok(Json(UserProfile::from(&user)))
}

/// Ends the caller's session: live quiz sessions are torn down by the
/// identity listener.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    tracing::info!("User {} signed out", claims.sub);
    state
        .identity
        .publish(IdentityEvent::SignedOut { user_id: claims.sub });
    StatusCode::NO_CONTENT
}
