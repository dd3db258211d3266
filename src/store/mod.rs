// src/store/mod.rs
//
// Persistence seams. Handlers only talk to these traits; `postgres` is the
// production backend and `memory` backs tests and database-less local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        award::{AwardEvent, AwardOutcome, AwardRecord},
        contest::{
            Contest, NewContest, NewWinner, Participant, ProjectSubmission, RankSlot,
            RegisterRequest, Winner,
        },
        user::{NewUser, UserRecord},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// User records and the score ledger.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the record on first authentication (all counters at zero),
    /// otherwise refreshes provider-owned profile fields.
    async fn ensure_user(&self, user: &NewUser) -> Result<UserRecord, AppError>;

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, AppError>;

    /// Atomically increments the counter selected by `event.source` and
    /// records the event. Either both happen or neither does.
    async fn apply_award(&self, event: &AwardEvent) -> Result<AwardOutcome, AppError>;

    /// Users with points, best first, at most `limit`.
    async fn top_users(&self, limit: i64) -> Result<Vec<UserRecord>, AppError>;

    /// 1-based leaderboard position, `None` for users without points.
    async fn rank_of(&self, user: &UserRecord) -> Result<Option<u32>, AppError>;

    /// Most recent award events first.
    async fn list_awards(&self, user_id: &str, limit: i64) -> Result<Vec<AwardRecord>, AppError>;
}

/// Hackathons and ideathons.
#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn create_contest(&self, contest: &NewContest) -> Result<Contest, AppError>;

    /// Newest first, optionally restricted to one kind.
    async fn list_contests(&self, kind: Option<&str>) -> Result<Vec<Contest>, AppError>;

    async fn get_contest(&self, id: i64) -> Result<Contest, AppError>;

    async fn close_contest(&self, id: i64) -> Result<Contest, AppError>;

    /// Fails with `Conflict` when the user is already registered or the
    /// contest is full. The capacity check and insert are atomic.
    async fn register_participant(
        &self,
        contest_id: i64,
        user_id: &str,
        req: &RegisterRequest,
    ) -> Result<Participant, AppError>;

    async fn get_participant(&self, contest_id: i64, user_id: &str) -> Result<Participant, AppError>;

    async fn list_participants(&self, contest_id: i64) -> Result<Vec<Participant>, AppError>;

    async fn count_participants(&self, contest_id: i64) -> Result<i64, AppError>;

    /// Stores (or replaces) a participant's project.
    async fn save_submission(
        &self,
        contest_id: i64,
        user_id: &str,
        submission: &ProjectSubmission,
    ) -> Result<Participant, AppError>;

    /// Records the winner and applies `award` in one transaction.
    /// A filled slot or an already placed participant is a `Conflict`.
    async fn assign_winner(
        &self,
        winner: &NewWinner,
        award: &AwardEvent,
    ) -> Result<(Winner, AwardOutcome), AppError>;

    /// Stores the outcome of the on-chain payout for a winner.
    async fn record_payout(
        &self,
        contest_id: i64,
        rank: RankSlot,
        tx_hash: Option<&str>,
        rail_error: Option<&str>,
    ) -> Result<Winner, AppError>;

    async fn list_winners(&self, contest_id: i64) -> Result<Vec<Winner>, AppError>;
}

/// Everything the handlers need from persistence.
pub trait Store: UserStore + ContestStore {}

impl<T: UserStore + ContestStore> Store for T {}

/// Shared guard for award parameters.
pub(crate) fn check_award(event: &AwardEvent) -> Result<(), AppError> {
    if event.amount <= 0 {
        return Err(AppError::Validation(format!(
            "Award amount must be positive, got {}",
            event.amount
        )));
    }
    if event.user_id.is_empty() {
        return Err(AppError::Validation("Award has no user".to_string()));
    }
    Ok(())
}

pub(crate) fn user_not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("User '{}' not found", user_id))
}

pub(crate) fn contest_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Contest {} not found", id))
}

pub(crate) fn participant_not_found() -> AppError {
    AppError::NotFound("Participant is not registered for this contest".to_string())
}
