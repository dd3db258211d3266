// src/store/memory.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use super::{
    ContestStore, UserStore, check_award, contest_not_found, participant_not_found, user_not_found,
};
use crate::{
    error::AppError,
    models::{
        award::{AwardEvent, AwardOutcome, AwardRecord, LedgerField},
        contest::{
            Contest, NewContest, NewWinner, Participant, ProjectSubmission, RankSlot,
            RegisterRequest, STATUS_ACTIVE, STATUS_COMPLETED, Winner,
        },
        user::{NewUser, UserRecord},
    },
    services::leaderboard::{is_ahead, leaderboard_order},
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, UserRecord>,
    awards: Vec<AwardRecord>,
    dedupe: HashSet<(String, String)>,
    contests: Vec<Contest>,
    participants: Vec<Participant>,
    winners: Vec<Winner>,
    next_award_id: i64,
    next_contest_id: i64,
}

impl MemoryState {
    /// Same semantics as the Postgres ledger: the counter bump and the
    /// event insert happen under one write lock.
    fn apply(&mut self, event: &AwardEvent) -> Result<AwardOutcome, AppError> {
        check_award(event)?;
        let user = self
            .users
            .get_mut(&event.user_id)
            .ok_or_else(|| user_not_found(&event.user_id))?;

        let counter = match event.source.field() {
            LedgerField::Points => &mut user.points,
            LedgerField::Aura => &mut user.aura,
        };

        let total = counter
            .checked_add(event.amount)
            .ok_or_else(|| AppError::Validation("Award would overflow the balance".to_string()))?;

        if let Some(key) = &event.dedupe_key {
            let slot = (event.user_id.clone(), key.clone());
            if self.dedupe.contains(&slot) {
                return Ok(AwardOutcome::Duplicate { total: *counter });
            }
            self.dedupe.insert(slot);
        }

        *counter = total;

        self.next_award_id += 1;
        self.awards.push(AwardRecord {
            id: self.next_award_id,
            user_id: event.user_id.clone(),
            source: event.source.as_str().to_string(),
            amount: event.amount,
            metadata: Json(event.metadata.clone()),
            created_at: Utc::now(),
        });

        Ok(AwardOutcome::Applied { total })
    }

    fn contest(&self, id: i64) -> Result<&Contest, AppError> {
        self.contests
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| contest_not_found(id))
    }

    fn participant_mut(&mut self, contest_id: i64, user_id: &str) -> Result<&mut Participant, AppError> {
        self.participants
            .iter_mut()
            .find(|p| p.contest_id == contest_id && p.user_id == user_id)
            .ok_or_else(participant_not_found)
    }
}

/// In-process store for tests and local runs without a database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: std::sync::Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rank_order(rank: &str) -> u8 {
    match rank.parse::<RankSlot>() {
        Ok(RankSlot::First) => 1,
        Ok(RankSlot::Second) => 2,
        _ => 3,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ensure_user(&self, user: &NewUser) -> Result<UserRecord, AppError> {
        let mut state = self.state.write().await;
        let record = state
            .users
            .entry(user.id.clone())
            .and_modify(|existing| {
                if user.display_name.is_some() {
                    existing.display_name = user.display_name.clone();
                }
                if user.email.is_some() {
                    existing.email = user.email.clone();
                }
                if user.college.is_some() {
                    existing.college = user.college.clone();
                }
                if user.photo_url.is_some() {
                    existing.photo_url = user.photo_url.clone();
                }
            })
            .or_insert_with(|| UserRecord {
                id: user.id.clone(),
                display_name: user.display_name.clone(),
                email: user.email.clone(),
                college: user.college.clone(),
                photo_url: user.photo_url.clone(),
                points: 0,
                aura: 0,
                streak: 0,
                badge_count: 0,
                created_at: Utc::now(),
            });
        Ok(record.clone())
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, AppError> {
        let state = self.state.read().await;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| user_not_found(user_id))?
            .validated()
    }

    async fn apply_award(&self, event: &AwardEvent) -> Result<AwardOutcome, AppError> {
        self.state.write().await.apply(event)
    }

    async fn top_users(&self, limit: i64) -> Result<Vec<UserRecord>, AppError> {
        let state = self.state.read().await;
        let mut users: Vec<UserRecord> = state
            .users
            .values()
            .filter(|u| u.points > 0)
            .cloned()
            .collect();
        users.sort_by(leaderboard_order);
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn rank_of(&self, user: &UserRecord) -> Result<Option<u32>, AppError> {
        if user.points <= 0 {
            return Ok(None);
        }
        let state = self.state.read().await;
        let ahead = state
            .users
            .values()
            .filter(|o| o.points > 0 && is_ahead(o, user))
            .count();
        Ok(Some(ahead as u32 + 1))
    }

    async fn list_awards(&self, user_id: &str, limit: i64) -> Result<Vec<AwardRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .awards
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn create_contest(&self, c: &NewContest) -> Result<Contest, AppError> {
        let mut state = self.state.write().await;
        state.next_contest_id += 1;
        let contest = Contest {
            id: state.next_contest_id,
            kind: c.kind.clone(),
            title: c.title.clone(),
            description: c.description.clone(),
            theme: c.theme.clone(),
            requirements: Json(c.requirements.clone()),
            host_id: c.host_id.clone(),
            base_reward: c.base_reward,
            reward_first: c.rewards.first,
            reward_second: c.rewards.second,
            reward_third: c.rewards.third,
            max_participants: c.max_participants,
            registration_deadline: c.registration_deadline,
            starts_at: c.starts_at,
            ends_at: c.ends_at,
            status: STATUS_ACTIVE.to_string(),
            created_at: Utc::now(),
        };
        state.contests.push(contest.clone());
        Ok(contest)
    }

    async fn list_contests(&self, kind: Option<&str>) -> Result<Vec<Contest>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .contests
            .iter()
            .rev()
            .filter(|c| kind.is_none_or(|k| c.kind == k))
            .cloned()
            .collect())
    }

    async fn get_contest(&self, id: i64) -> Result<Contest, AppError> {
        self.state.read().await.contest(id).cloned()
    }

    async fn close_contest(&self, id: i64) -> Result<Contest, AppError> {
        let mut state = self.state.write().await;
        let contest = state
            .contests
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| contest_not_found(id))?;
        contest.status = STATUS_COMPLETED.to_string();
        Ok(contest.clone())
    }

    async fn register_participant(
        &self,
        contest_id: i64,
        user_id: &str,
        req: &RegisterRequest,
    ) -> Result<Participant, AppError> {
        let mut state = self.state.write().await;
        let max = state.contest(contest_id)?.max_participants;

        let registered = state.participants.iter().filter(|p| p.contest_id == contest_id);
        if registered.clone().any(|p| p.user_id == user_id) {
            return Err(AppError::Conflict("Already registered for this contest".to_string()));
        }
        if registered.count() >= max.max(0) as usize {
            return Err(AppError::Conflict("Contest is full".to_string()));
        }

        let participant = Participant {
            contest_id,
            user_id: user_id.to_string(),
            display_name: req.display_name.clone(),
            team_name: req.team_name.clone(),
            contact_email: req.contact_email.clone(),
            wallet_address: req.wallet_address.clone(),
            github_profile_url: req.github_profile_url.clone(),
            github_project_url: req.github_project_url.clone(),
            project_idea: req.project_idea.clone(),
            submission: None,
            submitted_at: None,
            registered_at: Utc::now(),
        };
        state.participants.push(participant.clone());
        Ok(participant)
    }

    async fn get_participant(&self, contest_id: i64, user_id: &str) -> Result<Participant, AppError> {
        let state = self.state.read().await;
        state
            .participants
            .iter()
            .find(|p| p.contest_id == contest_id && p.user_id == user_id)
            .cloned()
            .ok_or_else(participant_not_found)
    }

    async fn list_participants(&self, contest_id: i64) -> Result<Vec<Participant>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.contest_id == contest_id)
            .cloned()
            .collect())
    }

    async fn count_participants(&self, contest_id: i64) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.contest_id == contest_id)
            .count() as i64)
    }

    async fn save_submission(
        &self,
        contest_id: i64,
        user_id: &str,
        submission: &ProjectSubmission,
    ) -> Result<Participant, AppError> {
        let mut state = self.state.write().await;
        let participant = state.participant_mut(contest_id, user_id)?;
        participant.submission = Some(Json(submission.clone()));
        participant.submitted_at = Some(Utc::now());
        Ok(participant.clone())
    }

    async fn assign_winner(
        &self,
        winner: &NewWinner,
        award: &AwardEvent,
    ) -> Result<(Winner, AwardOutcome), AppError> {
        let mut state = self.state.write().await;
        let placed = state.winners.iter().filter(|w| w.contest_id == winner.contest_id);
        if placed.clone().any(|w| w.rank == winner.rank.as_str()) {
            return Err(AppError::Conflict(format!(
                "The {} place is already taken",
                winner.rank
            )));
        }
        if placed.clone().any(|w| w.user_id == winner.user_id) {
            return Err(AppError::Conflict(
                "This participant has already been placed".to_string(),
            ));
        }

        // Nothing is written unless the award lands too.
        let outcome = state.apply(award)?;
        if !outcome.applied() {
            return Err(AppError::Conflict("This placement was already rewarded".to_string()));
        }

        let row = Winner {
            contest_id: winner.contest_id,
            rank: winner.rank.as_str().to_string(),
            user_id: winner.user_id.clone(),
            display_name: winner.display_name.clone(),
            aura_awarded: winner.aura_awarded,
            tx_hash: None,
            rail_error: None,
            awarded_at: Utc::now(),
        };
        state.winners.push(row.clone());
        Ok((row, outcome))
    }

    async fn record_payout(
        &self,
        contest_id: i64,
        rank: RankSlot,
        tx_hash: Option<&str>,
        rail_error: Option<&str>,
    ) -> Result<Winner, AppError> {
        let mut state = self.state.write().await;
        let winner = state
            .winners
            .iter_mut()
            .find(|w| w.contest_id == contest_id && w.rank == rank.as_str())
            .ok_or_else(|| AppError::NotFound(format!("No {} place winner", rank)))?;
        winner.tx_hash = tx_hash.map(str::to_string);
        winner.rail_error = rail_error.map(str::to_string);
        Ok(winner.clone())
    }

    async fn list_winners(&self, contest_id: i64) -> Result<Vec<Winner>, AppError> {
        let state = self.state.read().await;
        let mut winners: Vec<Winner> = state
            .winners
            .iter()
            .filter(|w| w.contest_id == contest_id)
            .cloned()
            .collect();
        winners.sort_by_key(|w| rank_order(&w.rank));
        Ok(winners)
    }
}
