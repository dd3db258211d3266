// src/services/rules.rs
//
// Award rules: pure mappings from a completed action to a ledger delta.
// They depend only on feature configuration, never on the user's history.

use crate::{
    error::AppError,
    models::{
        award::{AwardEvent, AwardMetadata, AwardSource},
        contest::{Contest, RankSlot, RankingRewards},
        problem::{CodingProblem, Language},
        quiz::{QuizOutcome, TechStack},
    },
};

/// Dedupe key that makes a problem pay out once per user.
pub fn problem_dedupe_key(problem_id: i64) -> String {
    format!("coding-problem:{}", problem_id)
}

/// Dedupe key for a contest placement.
pub fn contest_dedupe_key(contest_id: i64, rank: RankSlot) -> String {
    format!("contest:{}:{}", contest_id, rank)
}

/// All test cases of `problem` passed: award its fixed points.
pub fn coding_problem_award(user_id: &str, problem: &CodingProblem, language: Language) -> AwardEvent {
    AwardEvent {
        user_id: user_id.to_string(),
        source: AwardSource::CodingProblem,
        amount: problem.points,
        metadata: AwardMetadata::Problem {
            problem_id: problem.id,
            title: problem.title.clone(),
            difficulty: problem.difficulty.clone(),
            language: language.as_str().to_string(),
        },
        dedupe_key: Some(problem_dedupe_key(problem.id)),
    }
}

/// Points earned for `correct` answers on `stack`. Timed-out questions
/// count as wrong and earn nothing.
pub fn quiz_outcome(stack: &TechStack, correct: u32) -> QuizOutcome {
    QuizOutcome {
        score: correct,
        total_questions: stack.questions.len() as u32,
        points_earned: i64::from(correct) * stack.points_per_question,
    }
}

/// Award for a completed quiz attempt, `None` when nothing was earned.
pub fn quiz_award(user_id: &str, stack: &TechStack, outcome: &QuizOutcome) -> Option<AwardEvent> {
    if outcome.points_earned <= 0 {
        return None;
    }
    Some(AwardEvent {
        user_id: user_id.to_string(),
        source: AwardSource::QuizStack,
        amount: outcome.points_earned,
        metadata: AwardMetadata::Quiz {
            stack_id: stack.id.clone(),
            score: outcome.score,
            total_questions: outcome.total_questions,
            difficulty: stack.difficulty.clone(),
        },
        dedupe_key: None,
    })
}

impl RankingRewards {
    /// Host-configured per-rank values, defaulting to 100% / 60% / 30% of
    /// `base` (rounded down) when unset.
    ///
    /// Every slot must pay something, or it could never be awarded.
    pub fn resolve(
        base: i64,
        first: Option<i64>,
        second: Option<i64>,
        third: Option<i64>,
    ) -> Result<Self, AppError> {
        let share = |percent: i64| {
            base.checked_mul(percent)
                .map(|v| v / 100)
                .ok_or_else(|| AppError::Validation(format!("Base reward {} is too large", base)))
        };
        let rewards = Self {
            first: first.unwrap_or(base),
            second: match second {
                Some(v) => v,
                None => share(60)?,
            },
            third: match third {
                Some(v) => v,
                None => share(30)?,
            },
        };

        for rank in [RankSlot::First, RankSlot::Second, RankSlot::Third] {
            let amount = rewards.for_rank(rank);
            if amount <= 0 {
                return Err(AppError::Validation(format!(
                    "The {} place reward must be positive, got {}",
                    rank, amount
                )));
            }
        }
        Ok(rewards)
    }

    pub fn for_rank(&self, rank: RankSlot) -> i64 {
        match rank {
            RankSlot::First => self.first,
            RankSlot::Second => self.second,
            RankSlot::Third => self.third,
        }
    }
}

/// AURA award for placing `rank` in `contest`.
pub fn contest_award(user_id: &str, contest: &Contest, rank: RankSlot) -> AwardEvent {
    let source = if contest.is_hackathon() {
        AwardSource::HackathonRank
    } else {
        AwardSource::IdeathonRank
    };
    AwardEvent {
        user_id: user_id.to_string(),
        source,
        amount: contest.rewards().for_rank(rank),
        metadata: AwardMetadata::ContestRank {
            contest_id: contest.id,
            contest_title: contest.title.clone(),
            rank: rank.as_str().to_string(),
        },
        dedupe_key: Some(contest_dedupe_key(contest.id, rank)),
    }
}
