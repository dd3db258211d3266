// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, types::Json};

use super::{
    ContestStore, UserStore, check_award, contest_not_found, participant_not_found, user_not_found,
};
use crate::{
    error::AppError,
    models::{
        award::{AwardEvent, AwardOutcome, AwardRecord, LedgerField},
        contest::{
            Contest, NewContest, NewWinner, Participant, ProjectSubmission, RankSlot,
            RegisterRequest, STATUS_COMPLETED, Winner,
        },
        user::{NewUser, UserRecord},
    },
};

const USER_COLUMNS: &str = "id, display_name, email, college, photo_url, points, aura, streak, badge_count, created_at";

const CONTEST_COLUMNS: &str = "id, kind, title, description, theme, requirements, host_id, base_reward, \
    reward_first, reward_second, reward_third, max_participants, registration_deadline, starts_at, \
    ends_at, status, created_at";

const PARTICIPANT_COLUMNS: &str = "contest_id, user_id, display_name, team_name, contact_email, \
    wallet_address, github_profile_url, github_project_url, project_idea, submission, submitted_at, \
    registered_at";

const WINNER_COLUMNS: &str =
    "contest_id, rank, user_id, display_name, aura_awarded, tx_hash, rail_error, awarded_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// SQLSTATE numeric_value_out_of_range.
fn is_out_of_range(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("22003"))
}

fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.constraint().map(str::to_string),
        _ => None,
    }
}

/// Increment + event insert on an open transaction. The caller commits.
async fn award_in_tx(conn: &mut PgConnection, event: &AwardEvent) -> Result<AwardOutcome, AppError> {
    check_award(event)?;

    let sql = match event.source.field() {
        LedgerField::Points => "UPDATE users SET points = points + $1 WHERE id = $2 RETURNING points",
        LedgerField::Aura => "UPDATE users SET aura = aura + $1 WHERE id = $2 RETURNING aura",
    };

    // The row lock taken here serializes concurrent awards for this user.
    let total: i64 = sqlx::query_scalar(sql)
        .bind(event.amount)
        .bind(&event.user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            if is_out_of_range(&e) {
                AppError::Validation("Award would overflow the balance".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| user_not_found(&event.user_id))?;

    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO award_events (user_id, source, amount, metadata, dedupe_key)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, dedupe_key) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&event.user_id)
    .bind(event.source.as_str())
    .bind(event.amount)
    .bind(Json(event.metadata.clone()))
    .bind(event.dedupe_key.as_deref())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(match inserted {
        Some(_) => AwardOutcome::Applied { total },
        None => AwardOutcome::Duplicate {
            total: total - event.amount,
        },
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn ensure_user(&self, user: &NewUser) -> Result<UserRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, display_name, email, college, photo_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                email = COALESCE(EXCLUDED.email, users.email),
                college = COALESCE(EXCLUDED.college, users.college),
                photo_url = COALESCE(EXCLUDED.photo_url, users.photo_url)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&user.id)
            .bind(&user.display_name)
            .bind(&user.email)
            .bind(&user.college)
            .bind(&user.photo_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert user {}: {:?}", user.id, e);
                AppError::from(e)
            })?;
        record.validated()
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| user_not_found(user_id))?
            .validated()
    }

    async fn apply_award(&self, event: &AwardEvent) -> Result<AwardOutcome, AppError> {
        let mut tx = self.pool.begin().await?;
        let outcome = award_in_tx(&mut tx, event).await?;
        match outcome {
            AwardOutcome::Applied { .. } => tx.commit().await?,
            AwardOutcome::Duplicate { .. } => tx.rollback().await?,
        }
        Ok(outcome)
    }

    async fn top_users(&self, limit: i64) -> Result<Vec<UserRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users
            WHERE points > 0
            ORDER BY points DESC, created_at ASC, id COLLATE "C" ASC
            LIMIT $1
            "#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch leaderboard: {:?}", e);
                AppError::from(e)
            })?;
        users.into_iter().map(UserRecord::validated).collect()
    }

    async fn rank_of(&self, user: &UserRecord) -> Result<Option<u32>, AppError> {
        if user.points <= 0 {
            return Ok(None);
        }
        let ahead: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users o
            WHERE o.points > 0
              AND (o.points > $1
                   OR (o.points = $1 AND (o.created_at < $2
                       OR (o.created_at = $2 AND o.id COLLATE "C" < $3 COLLATE "C"))))
            "#,
        )
        .bind(user.points)
        .bind(user.created_at)
        .bind(&user.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(ahead as u32 + 1))
    }

    async fn list_awards(&self, user_id: &str, limit: i64) -> Result<Vec<AwardRecord>, AppError> {
        let awards = sqlx::query_as::<_, AwardRecord>(
            r#"
            SELECT id, user_id, source, amount, metadata, created_at
            FROM award_events
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(awards)
    }
}

#[async_trait]
impl ContestStore for PgStore {
    async fn create_contest(&self, c: &NewContest) -> Result<Contest, AppError> {
        let sql = format!(
            r#"
            INSERT INTO contests (kind, title, description, theme, requirements, host_id, base_reward,
                reward_first, reward_second, reward_third, max_participants,
                registration_deadline, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            CONTEST_COLUMNS
        );
        let contest = sqlx::query_as::<_, Contest>(&sql)
            .bind(&c.kind)
            .bind(&c.title)
            .bind(&c.description)
            .bind(&c.theme)
            .bind(Json(c.requirements.clone()))
            .bind(&c.host_id)
            .bind(c.base_reward)
            .bind(c.rewards.first)
            .bind(c.rewards.second)
            .bind(c.rewards.third)
            .bind(c.max_participants)
            .bind(c.registration_deadline)
            .bind(c.starts_at)
            .bind(c.ends_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create contest: {:?}", e);
                AppError::from(e)
            })?;
        Ok(contest)
    }

    async fn list_contests(&self, kind: Option<&str>) -> Result<Vec<Contest>, AppError> {
        let sql = format!(
            "SELECT {} FROM contests WHERE ($1::TEXT IS NULL OR kind = $1) ORDER BY created_at DESC, id DESC",
            CONTEST_COLUMNS
        );
        let contests = sqlx::query_as::<_, Contest>(&sql)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        Ok(contests)
    }

    async fn get_contest(&self, id: i64) -> Result<Contest, AppError> {
        let sql = format!("SELECT {} FROM contests WHERE id = $1", CONTEST_COLUMNS);
        sqlx::query_as::<_, Contest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| contest_not_found(id))
    }

    async fn close_contest(&self, id: i64) -> Result<Contest, AppError> {
        let sql = format!(
            "UPDATE contests SET status = $2 WHERE id = $1 RETURNING {}",
            CONTEST_COLUMNS
        );
        sqlx::query_as::<_, Contest>(&sql)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| contest_not_found(id))
    }

    async fn register_participant(
        &self,
        contest_id: i64,
        user_id: &str,
        req: &RegisterRequest,
    ) -> Result<Participant, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the contest row so concurrent registrations see a stable count.
        let max: i32 = sqlx::query_scalar("SELECT max_participants FROM contests WHERE id = $1 FOR UPDATE")
            .bind(contest_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| contest_not_found(contest_id))?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contest_participants WHERE contest_id = $1")
            .bind(contest_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= i64::from(max) {
            return Err(AppError::Conflict("Contest is full".to_string()));
        }

        let sql = format!(
            r#"
            INSERT INTO contest_participants (contest_id, user_id, display_name, team_name, contact_email,
                wallet_address, github_profile_url, github_project_url, project_idea)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PARTICIPANT_COLUMNS
        );
        let participant = sqlx::query_as::<_, Participant>(&sql)
            .bind(contest_id)
            .bind(user_id)
            .bind(&req.display_name)
            .bind(&req.team_name)
            .bind(&req.contact_email)
            .bind(&req.wallet_address)
            .bind(&req.github_profile_url)
            .bind(&req.github_project_url)
            .bind(&req.project_idea)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Already registered for this contest".to_string())
                } else {
                    tracing::error!("Failed to register participant: {:?}", e);
                    AppError::from(e)
                }
            })?;

        tx.commit().await?;
        Ok(participant)
    }

    async fn get_participant(&self, contest_id: i64, user_id: &str) -> Result<Participant, AppError> {
        let sql = format!(
            "SELECT {} FROM contest_participants WHERE contest_id = $1 AND user_id = $2",
            PARTICIPANT_COLUMNS
        );
        sqlx::query_as::<_, Participant>(&sql)
            .bind(contest_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(participant_not_found)
    }

    async fn list_participants(&self, contest_id: i64) -> Result<Vec<Participant>, AppError> {
        let sql = format!(
            "SELECT {} FROM contest_participants WHERE contest_id = $1 ORDER BY registered_at ASC",
            PARTICIPANT_COLUMNS
        );
        let participants = sqlx::query_as::<_, Participant>(&sql)
            .bind(contest_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(participants)
    }

    async fn count_participants(&self, contest_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM contest_participants WHERE contest_id = $1")
            .bind(contest_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn save_submission(
        &self,
        contest_id: i64,
        user_id: &str,
        submission: &ProjectSubmission,
    ) -> Result<Participant, AppError> {
        let sql = format!(
            r#"
            UPDATE contest_participants
            SET submission = $3, submitted_at = CURRENT_TIMESTAMP
            WHERE contest_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            PARTICIPANT_COLUMNS
        );
        sqlx::query_as::<_, Participant>(&sql)
            .bind(contest_id)
            .bind(user_id)
            .bind(Json(submission.clone()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(participant_not_found)
    }

    async fn assign_winner(
        &self,
        winner: &NewWinner,
        award: &AwardEvent,
    ) -> Result<(Winner, AwardOutcome), AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO contest_winners (contest_id, rank, user_id, display_name, aura_awarded)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            WINNER_COLUMNS
        );
        let row = sqlx::query_as::<_, Winner>(&sql)
            .bind(winner.contest_id)
            .bind(winner.rank.as_str())
            .bind(&winner.user_id)
            .bind(&winner.display_name)
            .bind(winner.aura_awarded)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    if violated_constraint(&e).as_deref() == Some("contest_winners_pkey") {
                        AppError::Conflict(format!("The {} place is already taken", winner.rank))
                    } else {
                        AppError::Conflict("This participant has already been placed".to_string())
                    }
                } else {
                    tracing::error!("Failed to record winner: {:?}", e);
                    AppError::from(e)
                }
            })?;

        let outcome = award_in_tx(&mut tx, award).await?;
        if !outcome.applied() {
            return Err(AppError::Conflict("This placement was already rewarded".to_string()));
        }

        tx.commit().await?;
        Ok((row, outcome))
    }

    async fn record_payout(
        &self,
        contest_id: i64,
        rank: RankSlot,
        tx_hash: Option<&str>,
        rail_error: Option<&str>,
    ) -> Result<Winner, AppError> {
        let sql = format!(
            r#"
            UPDATE contest_winners SET tx_hash = $3, rail_error = $4
            WHERE contest_id = $1 AND rank = $2
            RETURNING {}
            "#,
            WINNER_COLUMNS
        );
        sqlx::query_as::<_, Winner>(&sql)
            .bind(contest_id)
            .bind(rank.as_str())
            .bind(tx_hash)
            .bind(rail_error)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No {} place winner", rank)))
    }

    async fn list_winners(&self, contest_id: i64) -> Result<Vec<Winner>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM contest_winners WHERE contest_id = $1
            ORDER BY CASE rank WHEN 'first' THEN 1 WHEN 'second' THEN 2 ELSE 3 END
            "#,
            WINNER_COLUMNS
        );
        let winners = sqlx::query_as::<_, Winner>(&sql)
            .bind(contest_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(winners)
    }
}
