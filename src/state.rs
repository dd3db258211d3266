use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    catalog::Catalog,
    config::Config,
    identity::IdentityHub,
    services::{judge::Judge, rail::RewardRail, sessions::QuizSessions},
    store::Store,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub sessions: QuizSessions,
    pub judge: Arc<dyn Judge>,
    pub rail: Arc<dyn RewardRail>,
    pub identity: IdentityHub,
}

impl AppState {
    /// Wires the shared services together. Must run inside a Tokio runtime:
    /// it spawns the task that ends quiz sessions on sign-out.
    pub fn new(
        store: Arc<dyn Store>,
        config: Config,
        catalog: Catalog,
        judge: Arc<dyn Judge>,
        rail: Arc<dyn RewardRail>,
    ) -> Self {
        let sessions = QuizSessions::new(config.quiz_seconds_per_question);
        let identity = IdentityHub::new();
        sessions.watch_sign_outs(identity.subscribe());

        Self {
            store,
            config,
            catalog: Arc::new(catalog),
            sessions,
            judge,
            rail,
            identity,
        }
    }
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for QuizSessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
