// src/models/award.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Feature that produced an award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwardSource {
    CodingProblem,
    QuizStack,
    HackathonRank,
    IdeathonRank,
}

impl AwardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardSource::CodingProblem => "coding-problem",
            AwardSource::QuizStack => "quiz-stack",
            AwardSource::HackathonRank => "hackathon-rank",
            AwardSource::IdeathonRank => "ideathon-rank",
        }
    }

    /// The per-user counter this source increments.
    pub fn field(&self) -> LedgerField {
        match self {
            AwardSource::CodingProblem | AwardSource::QuizStack => LedgerField::Points,
            AwardSource::HackathonRank | AwardSource::IdeathonRank => LedgerField::Aura,
        }
    }
}

/// Counter columns the ledger is allowed to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerField {
    Points,
    Aura,
}

/// Feature-specific details kept alongside an award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AwardMetadata {
    Problem {
        problem_id: i64,
        title: String,
        difficulty: String,
        language: String,
    },
    Quiz {
        stack_id: String,
        score: u32,
        total_questions: u32,
        difficulty: String,
    },
    ContestRank {
        contest_id: i64,
        contest_title: String,
        rank: String,
    },
}

/// A computed point delta, ready to be applied by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardEvent {
    pub user_id: String,
    pub source: AwardSource,
    pub amount: i64,
    pub metadata: AwardMetadata,
    /// When set, at most one event with this key is applied per user.
    pub dedupe_key: Option<String>,
}

/// Result of applying an award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AwardOutcome {
    /// The increment happened; `total` is the new value of the field.
    Applied { total: i64 },
    /// An event with the same dedupe key already exists; nothing changed.
    Duplicate { total: i64 },
}

impl AwardOutcome {
    pub fn total(&self) -> i64 {
        match self {
            AwardOutcome::Applied { total } | AwardOutcome::Duplicate { total } => *total,
        }
    }

    pub fn applied(&self) -> bool {
        matches!(self, AwardOutcome::Applied { .. })
    }
}

/// Represents the 'award_events' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AwardRecord {
    pub id: i64,
    pub user_id: String,
    pub source: String,
    pub amount: i64,
    pub metadata: Json<AwardMetadata>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
