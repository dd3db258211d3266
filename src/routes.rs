// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{contest, leaderboard, problem, profile, quiz, session},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Read-only catalog, leaderboard and contest listings are public.
/// * Everything that reads or changes a user's own data sits behind
///   `auth_middleware`.
/// * Trace and CORS layers wrap the whole tree.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/leaderboard", get(leaderboard::get_leaderboard))
        .route("/quiz/stacks", get(quiz::list_stacks))
        .route("/problems", get(problem::list_problems))
        .route("/problems/{id}", get(problem::get_problem))
        .route("/contests", get(contest::list_contests))
        .route("/contests/{id}", get(contest::get_contest));

    let protected_routes = Router::new()
        .route("/auth/session", post(session::sign_in).delete(session::sign_out))
        .route("/me", get(profile::get_me))
        .route("/leaderboard/me", get(leaderboard::get_my_rank))
        .route("/quiz/sessions", post(quiz::create_session))
        .route(
            "/quiz/sessions/{id}",
            get(quiz::get_session).delete(quiz::abandon_session),
        )
        .route("/quiz/sessions/{id}/start", post(quiz::start_session))
        .route("/quiz/sessions/{id}/answer", post(quiz::answer_question))
        .route("/quiz/sessions/{id}/next", post(quiz::next_question))
        .route("/problems/{id}/submit", post(problem::submit_solution))
        .route("/contests", post(contest::create_contest))
        .route(
            "/contests/{id}/participants",
            post(contest::register).get(contest::list_participants),
        )
        .route("/contests/{id}/submission", put(contest::submit_project))
        .route("/contests/{id}/winners", post(contest::select_winner))
        .route("/contests/{id}/close", post(contest::close_contest))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        // Global Middleware (listed from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
