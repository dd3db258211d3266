// src/handlers/contest.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::contest::{
        Contest, ContestDetail, ContestListParams, CreateContestRequest, KIND_HACKATHON,
        KIND_IDEATHON, NewContest, NewWinner, ProjectSubmission, RailStatus, RankingRewards,
        RegisterRequest, SelectWinnerRequest, SelectWinnerResponse,
    },
    services::{rail::RewardMemo, rules},
    state::AppState,
    utils::{
        html::{clean_optional, clean_text},
        jwt::Claims,
    },
};

const DEFAULT_MAX_PARTICIPANTS: i32 = 100;

fn require_host(contest: &Contest, claims: &Claims) -> Result<(), AppError> {
    if contest.host_id != claims.sub {
        return Err(AppError::Forbidden(
            "Only the host can manage this contest".to_string(),
        ));
    }
    Ok(())
}

fn require_active(contest: &Contest) -> Result<(), AppError> {
    if !contest.is_active() {
        return Err(AppError::Conflict("Contest has been closed".to_string()));
    }
    Ok(())
}

fn non_blank(field: &str, value: String) -> Result<String, AppError> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(value)
}

/// Hosts a new hackathon or ideathon. The caller becomes its host.
///
/// Missing per-rank rewards default to 100%, 60% and 30% of the base reward.
pub async fn create_contest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateContestRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    if let (Some(start), Some(end)) = (req.starts_at, req.ends_at) {
        if end <= start {
            return Err(AppError::Validation(
                "Contest must end after it starts".to_string(),
            ));
        }
    }
    let host = state.store.get_user(&claims.sub).await?;

    let new_contest = NewContest {
        kind: req.kind,
        title: non_blank("title", clean_text(&req.title))?,
        description: non_blank("description", clean_text(&req.description))?,
        theme: clean_optional(req.theme.as_deref()),
        requirements: req
            .requirements
            .iter()
            .map(|r| clean_text(r))
            .filter(|r| !r.is_empty())
            .collect(),
        host_id: host.id,
        base_reward: req.base_reward,
        rewards: RankingRewards::resolve(
            req.base_reward,
            req.first_place,
            req.second_place,
            req.third_place,
        )?,
        max_participants: req.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
        registration_deadline: req.registration_deadline,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
    };

    let contest = state.store.create_contest(&new_contest).await?;
    tracing::info!("User {} is hosting {} {}", contest.host_id, contest.kind, contest.id);

    Ok((StatusCode::CREATED, Json(contest)))
}

/// Lists contests, newest first. `?kind=` restricts to one kind and
/// `?open=true` to contests still taking registrations.
pub async fn list_contests(
    State(state): State<AppState>,
    Query(params): Query<ContestListParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(kind) = params.kind.as_deref() {
        if kind != KIND_HACKATHON && kind != KIND_IDEATHON {
            return Err(AppError::Validation(format!("Unknown contest kind '{}'", kind)));
        }
    }

    let now = chrono::Utc::now();
    let contests: Vec<Contest> = state
        .store
        .list_contests(params.kind.as_deref())
        .await?
        .into_iter()
        .filter(|c| !params.open || c.registration_open(now))
        .collect();

    Ok(Json(contests))
}

pub async fn get_contest(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let contest = state.store.get_contest(id).await?;
    let participant_count = state.store.count_participants(id).await?;
    let winners = state.store.list_winners(id).await?;

    Ok(Json(ContestDetail {
        contest,
        participant_count,
        winners,
    }))
}

/// Registers the caller.
///
/// Hackathons additionally need a wallet address (for on-chain rewards)
/// and GitHub profile and project links.
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let contest = state.store.get_contest(id).await?;
    if !contest.registration_open(chrono::Utc::now()) {
        return Err(AppError::Conflict("Registration is closed".to_string()));
    }
    if contest.is_hackathon()
        && (req.wallet_address.is_none()
            || req.github_profile_url.is_none()
            || req.github_project_url.is_none())
    {
        return Err(AppError::Validation(
            "Hackathons require a wallet address, a GitHub profile and a GitHub project".to_string(),
        ));
    }
    state.store.get_user(&claims.sub).await?;

    let req = RegisterRequest {
        display_name: non_blank("display_name", clean_text(&req.display_name))?,
        team_name: clean_optional(req.team_name.as_deref()),
        project_idea: clean_optional(req.project_idea.as_deref()),
        ..req
    };
    let participant = state.store.register_participant(id, &claims.sub, &req).await?;
    tracing::info!("User {} registered for contest {}", claims.sub, id);

    Ok((StatusCode::CREATED, Json(participant)))
}

/// Participant list with contact details. Host only.
pub async fn list_participants(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let contest = state.store.get_contest(id).await?;
    require_host(&contest, &claims)?;
    Ok(Json(state.store.list_participants(id).await?))
}

/// Stores the caller's project. Resubmitting replaces it.
pub async fn submit_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<ProjectSubmission>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let contest = state.store.get_contest(id).await?;
    require_active(&contest)?;
    if contest.is_hackathon() && req.repo_url.is_none() {
        return Err(AppError::Validation(
            "Hackathon submissions need a GitHub repository".to_string(),
        ));
    }

    let submission = ProjectSubmission {
        project_title: non_blank("project_title", clean_text(&req.project_title))?,
        description: non_blank("description", clean_text(&req.description))?,
        tech_stack: clean_optional(req.tech_stack.as_deref()),
        ..req
    };
    let participant = state
        .store
        .save_submission(id, &claims.sub, &submission)
        .await?;

    Ok(Json(participant))
}

/// Places a participant on a podium slot. Host only.
///
/// * The winner row and the AURA award are written together; a filled slot
///   or an already placed participant is a conflict.
/// * Then, if the participant left a wallet, the reward rail is called. A
///   rail failure is stored on the winner and reported, but the off-chain
///   award stands.
pub async fn select_winner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SelectWinnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let contest = state.store.get_contest(id).await?;
    require_host(&contest, &claims)?;
    require_active(&contest)?;
    let participant = state.store.get_participant(id, &req.user_id).await?;

    let award = rules::contest_award(&participant.user_id, &contest, req.rank);
    let new_winner = NewWinner {
        contest_id: id,
        rank: req.rank,
        user_id: participant.user_id.clone(),
        display_name: participant.display_name.clone(),
        aura_awarded: award.amount,
    };
    let (mut winner, outcome) = state.store.assign_winner(&new_winner, &award).await?;
    tracing::info!(
        "Contest {}: {} place goes to {} (+{} AURA)",
        id,
        req.rank,
        winner.user_id,
        winner.aura_awarded
    );

    let Some(wallet) = participant.wallet_address.as_deref() else {
        return Ok(Json(SelectWinnerResponse {
            winner,
            aura_total: outcome.total(),
            rail: RailStatus::Skipped,
        }));
    };

    let memo = RewardMemo {
        contest: contest.title.clone(),
        reason: req.rank.label().to_string(),
    };
    let (rail, tx_hash, rail_error) = match state.rail.award(wallet, award.amount, &memo).await {
        Ok(receipt) => {
            let hash = receipt.tx_hash;
            (RailStatus::Confirmed { tx_hash: hash.clone() }, Some(hash), None)
        }
        Err(e) => {
            let error = e.public_message();
            tracing::warn!("Reward rail failed for contest {} {}: {}", id, req.rank, error);
            (RailStatus::Failed { error: error.clone() }, None, Some(error))
        }
    };

    match state
        .store
        .record_payout(id, req.rank, tx_hash.as_deref(), rail_error.as_deref())
        .await
    {
        Ok(updated) => winner = updated,
        Err(e) => tracing::error!("Failed to store payout state for contest {}: {}", id, e),
    }

    Ok(Json(SelectWinnerResponse {
        winner,
        aura_total: outcome.total(),
        rail,
    }))
}

/// Marks the contest completed. Host only.
pub async fn close_contest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let contest = state.store.get_contest(id).await?;
    require_host(&contest, &claims)?;
    require_active(&contest)?;
    let contest = state.store.close_contest(id).await?;
    tracing::info!("Contest {} closed", id);
    Ok(Json(contest))
}
