// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};

/// A ranked row of the leaderboard. Derived on every request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub name: String,
    pub college: String,
    pub avatar: String,
    pub points: i64,
    pub streak: i32,
    pub badge_count: i32,
    pub title: &'static str,
    pub icon: &'static str,
    pub badge_colors: [&'static str; 2],
}

/// Query parameters for `GET /api/leaderboard`.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}
