// src/handlers/mod.rs

pub mod contest;
pub mod leaderboard;
pub mod problem;
pub mod profile;
pub mod quiz;
pub mod session;
