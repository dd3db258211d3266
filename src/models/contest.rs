// src/models/contest.rs

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use url::Url;
use validator::Validate;

pub const KIND_HACKATHON: &str = "hackathon";
pub const KIND_IDEATHON: &str = "ideathon";

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_COMPLETED: &str = "completed";

static WALLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("wallet regex compiles"));

/// Ranked prize slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankSlot {
    First,
    Second,
    Third,
}

impl RankSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankSlot::First => "first",
            RankSlot::Second => "second",
            RankSlot::Third => "third",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankSlot::First => "First Place Winner",
            RankSlot::Second => "Second Place Winner",
            RankSlot::Third => "Third Place Winner",
        }
    }
}

impl fmt::Display for RankSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(RankSlot::First),
            "second" => Ok(RankSlot::Second),
            "third" => Ok(RankSlot::Third),
            other => Err(format!("unknown rank '{}'", other)),
        }
    }
}

/// Per-rank AURA prize pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRewards {
    pub first: i64,
    pub second: i64,
    pub third: i64,
}

/// Represents the 'contests' table. Hackathons and ideathons share it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contest {
    pub id: i64,
    /// 'hackathon' or 'ideathon'.
    pub kind: String,
    pub title: String,
    pub description: String,
    pub theme: Option<String>,
    pub requirements: Json<Vec<String>>,
    pub host_id: String,
    pub base_reward: i64,
    pub reward_first: i64,
    pub reward_second: i64,
    pub reward_third: i64,
    pub max_participants: i32,
    pub registration_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    /// 'active' or 'completed'.
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Contest {
    pub fn is_hackathon(&self) -> bool {
        self.kind == KIND_HACKATHON
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn registration_open(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.is_active() && self.registration_deadline.is_none_or(|deadline| deadline > now)
    }

    pub fn rewards(&self) -> RankingRewards {
        RankingRewards {
            first: self.reward_first,
            second: self.reward_second,
            third: self.reward_third,
        }
    }
}

/// Contest as inserted by the store (id and timestamps assigned there).
#[derive(Debug, Clone)]
pub struct NewContest {
    pub kind: String,
    pub title: String,
    pub description: String,
    pub theme: Option<String>,
    pub requirements: Vec<String>,
    pub host_id: String,
    pub base_reward: i64,
    pub rewards: RankingRewards,
    pub max_participants: i32,
    pub registration_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for hosting a contest.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContestRequest {
    #[validate(custom(function = validate_kind))]
    pub kind: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(max = 200))]
    pub theme: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub requirements: Vec<String>,
    #[validate(range(min = 1, max = 1_000_000_000, message = "Reward must be between 1 and 1000000000."))]
    pub base_reward: i64,
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub first_place: Option<i64>,
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub second_place: Option<i64>,
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub third_place: Option<i64>,
    #[validate(range(min = 1, max = 10000))]
    pub max_participants: Option<i32>,
    pub registration_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn validate_kind(kind: &str) -> Result<(), validator::ValidationError> {
    if kind != KIND_HACKATHON && kind != KIND_IDEATHON {
        return Err(validator::ValidationError::new("invalid_contest_kind"));
    }
    Ok(())
}

/// Query parameters for listing contests.
#[derive(Debug, Deserialize)]
pub struct ContestListParams {
    pub kind: Option<String>,
    /// Only contests still accepting registrations.
    #[serde(default)]
    pub open: bool,
}

/// Represents the 'contest_participants' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub contest_id: i64,
    pub user_id: String,
    pub display_name: String,
    pub team_name: Option<String>,
    pub contact_email: String,
    pub wallet_address: Option<String>,
    pub github_profile_url: Option<String>,
    pub github_project_url: Option<String>,
    pub project_idea: Option<String>,
    pub submission: Option<Json<ProjectSubmission>>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for registering to a contest.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    #[validate(length(min = 1, max = 100))]
    pub team_name: Option<String>,
    #[validate(email)]
    pub contact_email: String,
    #[validate(custom(function = validate_wallet))]
    pub wallet_address: Option<String>,
    #[validate(custom(function = validate_github_url))]
    pub github_profile_url: Option<String>,
    #[validate(custom(function = validate_github_url))]
    pub github_project_url: Option<String>,
    #[validate(length(max = 2000))]
    pub project_idea: Option<String>,
}

/// Project handed in by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectSubmission {
    #[validate(length(min = 1, max = 200))]
    pub project_title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(custom(function = validate_github_url))]
    pub repo_url: Option<String>,
    #[validate(url)]
    pub live_url: Option<String>,
    #[validate(length(max = 500))]
    pub tech_stack: Option<String>,
    #[validate(url)]
    pub video_demo: Option<String>,
}

/// Accepts Ethereum-style addresses only.
pub fn validate_wallet(address: &str) -> Result<(), validator::ValidationError> {
    if !WALLET_RE.is_match(address) {
        return Err(validator::ValidationError::new("invalid_wallet_address"));
    }
    Ok(())
}

/// Accepts absolute http(s) URLs on github.com.
pub fn validate_github_url(raw: &str) -> Result<(), validator::ValidationError> {
    let parsed = Url::parse(raw).map_err(|_| validator::ValidationError::new("invalid_url"))?;
    let host_ok = matches!(parsed.host_str(), Some("github.com") | Some("www.github.com"));
    if !host_ok || !matches!(parsed.scheme(), "http" | "https") {
        return Err(validator::ValidationError::new("not_a_github_url"));
    }
    Ok(())
}

/// Represents the 'contest_winners' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Winner {
    pub contest_id: i64,
    pub rank: String,
    pub user_id: String,
    pub display_name: String,
    pub aura_awarded: i64,
    pub tx_hash: Option<String>,
    pub rail_error: Option<String>,
    pub awarded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWinner {
    pub contest_id: i64,
    pub rank: RankSlot,
    pub user_id: String,
    pub display_name: String,
    pub aura_awarded: i64,
}

/// DTO for selecting a winner.
#[derive(Debug, Deserialize)]
pub struct SelectWinnerRequest {
    pub user_id: String,
    pub rank: RankSlot,
}

/// State of the on-chain payout after a winner is recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RailStatus {
    Confirmed { tx_hash: String },
    Failed { error: String },
    /// Participant has no wallet on file.
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct SelectWinnerResponse {
    pub winner: Winner,
    pub aura_total: i64,
    pub rail: RailStatus,
}

#[derive(Debug, Serialize)]
pub struct ContestDetail {
    #[serde(flatten)]
    pub contest: Contest,
    pub participant_count: i64,
    pub winners: Vec<Winner>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_addresses_are_checked() {
        assert!(validate_wallet("0x52908400098527886E0F7030069857D2E4169EE7").is_ok());
        assert!(validate_wallet("0x1234").is_err());
        assert!(validate_wallet("52908400098527886E0F7030069857D2E4169EE7").is_err());
    }

    #[test]
    fn github_urls_must_point_at_github() {
        assert!(validate_github_url("https://github.com/octocat").is_ok());
        assert!(validate_github_url("https://gitlab.com/octocat").is_err());
        assert!(validate_github_url("not a url github.com").is_err());
    }

    #[test]
    fn registration_closes_after_deadline() {
        let now = chrono::Utc::now();
        let contest = Contest {
            id: 1,
            kind: KIND_HACKATHON.to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            theme: None,
            requirements: Json(vec![]),
            host_id: "host".to_string(),
            base_reward: 100,
            reward_first: 100,
            reward_second: 60,
            reward_third: 30,
            max_participants: 10,
            registration_deadline: Some(now - chrono::Duration::hours(1)),
            starts_at: None,
            ends_at: None,
            status: STATUS_ACTIVE.to_string(),
            created_at: now,
        };
        assert!(!contest.registration_open(now));
    }
}
