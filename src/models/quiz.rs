// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A technology stack quiz from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechStack {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub points_per_question: i64,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

/// DTO for listing stacks (excludes questions and answers).
#[derive(Debug, Serialize)]
pub struct PublicStack {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub points_per_question: i64,
    pub total_questions: usize,
}

impl From<&TechStack> for PublicStack {
    fn from(stack: &TechStack) -> Self {
        Self {
            id: stack.id.clone(),
            name: stack.name.clone(),
            description: stack.description.clone(),
            difficulty: stack.difficulty.clone(),
            points_per_question: stack.points_per_question,
            total_questions: stack.questions.len(),
        }
    }
}

/// DTO for sending a question to the client (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
}

/// Answer and explanation, shown once the question is revealed.
#[derive(Debug, Serialize)]
pub struct RevealedAnswer {
    pub correct_answer: usize,
    pub explanation: String,
    /// Index chosen by the user, `-1` when the question timed out.
    pub selected: i64,
    pub correct: bool,
}

/// Snapshot of a quiz session as returned by every session endpoint.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: uuid::Uuid,
    pub stack_id: String,
    pub phase: &'static str,
    pub question_index: Option<usize>,
    pub total_questions: usize,
    pub seconds_remaining: Option<u32>,
    pub score: u32,
    pub question: Option<PublicQuestion>,
    pub revealed: Option<RevealedAnswer>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, max = 50))]
    pub stack_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option: usize,
}

/// Final result handed to the award rules when a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    pub score: u32,
    pub total_questions: u32,
    pub points_earned: i64,
}

/// Response of the final `next` call.
#[derive(Debug, Serialize)]
pub struct CompletedQuiz {
    pub stack_id: String,
    #[serde(flatten)]
    pub outcome: QuizOutcome,
    pub answers: Vec<i64>,
    pub total_points: i64,
}

/// Response of `POST /api/quiz/sessions/{id}/next`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextResponse {
    Question { session: SessionView },
    Completed { result: CompletedQuiz },
}
