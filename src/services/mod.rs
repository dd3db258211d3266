// src/services/mod.rs

pub mod judge;
pub mod leaderboard;
pub mod quiz;
pub mod rail;
pub mod rules;
pub mod sessions;
