// src/models/mod.rs

pub mod award;
pub mod contest;
pub mod leaderboard;
pub mod problem;
pub mod quiz;
pub mod user;
