// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use arena::{
    catalog::Catalog,
    config::Config,
    error::AppError,
    routes,
    services::{
        judge::PatternJudge,
        rail::{RewardMemo, RewardRail, TxReceipt},
    },
    state::AppState,
    store::MemoryStore,
    utils::jwt::{TokenProfile, sign_jwt},
};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

/// Reward rail that records every payout instead of sending it.
#[derive(Default)]
pub struct RecordingRail {
    pub calls: Mutex<Vec<(String, i64, RewardMemo)>>,
    pub fail: bool,
}

#[async_trait]
impl RewardRail for RecordingRail {
    async fn award(&self, address: &str, amount: i64, memo: &RewardMemo) -> Result<TxReceipt, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((address.to_string(), amount, memo.clone()));
        if self.fail {
            return Err(AppError::ExternalRail("relay unreachable".to_string()));
        }
        Ok(TxReceipt {
            tx_hash: format!("0xtx{}", self.calls.lock().unwrap().len()),
        })
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub rail: Arc<RecordingRail>,
}

/// Spawns the app on a random port, backed by the in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_rail(RecordingRail::default()).await
}

pub async fn spawn_app_with_rail(rail: RecordingRail) -> TestApp {
    let rail = Arc::new(rail);
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Config::for_tests(JWT_SECRET),
        Catalog::builtin().expect("builtin catalog"),
        Arc::new(PatternJudge),
        rail.clone(),
    );
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        rail,
    }
}

pub fn token_for(user_id: &str) -> String {
    sign_jwt(
        user_id,
        TokenProfile {
            name: Some(user_id),
            email: Some("player@example.com"),
            picture: None,
        },
        JWT_SECRET,
        600,
    )
    .expect("Failed to sign token")
}

pub fn unique_user() -> String {
    format!("uid_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Signs a user in and returns their bearer token.
    pub async fn sign_in(&self, user_id: &str) -> String {
        let token = token_for(user_id);
        let response = self
            .client
            .post(self.url("/api/auth/session"))
            .bearer_auth(&token)
            .json(&json!({}))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        token
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn points_of(&self, token: &str) -> i64 {
        let me: Value = self.get("/api/me", Some(token)).await.json().await.unwrap();
        me["points"].as_i64().unwrap()
    }
}
