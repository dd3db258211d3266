// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use dotenvy::dotenv;

/// Default per-question countdown for quiz sessions.
pub const DEFAULT_QUIZ_SECONDS: u32 = 30;

/// Default (and maximum) size of the leaderboard.
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;

/// Which code judge backs `POST /api/problems/{id}/submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeMode {
    /// Source-text pattern matching, no execution.
    Pattern,
    /// Remote Judge0-compatible execution service.
    Judge0,
}

impl FromStr for JudgeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(JudgeMode::Pattern),
            "judge0" => Ok(JudgeMode::Judge0),
            other => Err(format!("unknown judge mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL. The in-memory store is used when absent.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub quiz_seconds_per_question: u32,
    pub leaderboard_limit: i64,
    pub judge_mode: JudgeMode,
    pub judge0_url: Option<String>,
    pub judge0_api_key: Option<String>,
    pub judge0_max_wait_secs: u64,
    pub reward_rail_url: Option<String>,
    pub reward_rail_api_key: Option<String>,
    pub reward_rail_timeout_secs: u64,
    pub catalog_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let judge_mode = match optional("JUDGE_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to pattern judge", e);
                JudgeMode::Pattern
            }),
            None => JudgeMode::Pattern,
        };

        Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000))),
            quiz_seconds_per_question: parsed("QUIZ_SECONDS_PER_QUESTION", DEFAULT_QUIZ_SECONDS),
            leaderboard_limit: parsed("LEADERBOARD_LIMIT", DEFAULT_LEADERBOARD_LIMIT),
            judge_mode,
            judge0_url: optional("JUDGE0_URL"),
            judge0_api_key: optional("JUDGE0_API_KEY"),
            judge0_max_wait_secs: parsed("JUDGE0_MAX_WAIT_SECS", 10),
            reward_rail_url: optional("REWARD_RAIL_URL"),
            reward_rail_api_key: optional("REWARD_RAIL_API_KEY"),
            reward_rail_timeout_secs: parsed("REWARD_RAIL_TIMEOUT_SECS", 15),
            catalog_path: optional("CATALOG_PATH"),
        }
    }

    /// Configuration for tests and local runs: memory store, pattern judge,
    /// no reward rail.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            quiz_seconds_per_question: DEFAULT_QUIZ_SECONDS,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            judge_mode: JudgeMode::Pattern,
            judge0_url: None,
            judge0_api_key: None,
            judge0_max_wait_secs: 10,
            reward_rail_url: None,
            reward_rail_api_key: None,
            reward_rail_timeout_secs: 15,
            catalog_path: None,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    optional(key)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
