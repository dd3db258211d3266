// src/models/problem.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Languages accepted by the code arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Java,
    Cpp,
    C,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }

    /// Judge0 language id.
    pub fn judge0_id(&self) -> u32 {
        match self {
            Language::Javascript => 63,
            Language::Python => 71,
            Language::Java => 62,
            Language::Cpp => 54,
            Language::C => 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

/// A coding problem from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingProblem {
    pub id: i64,
    pub title: String,
    /// 'easy', 'medium' or 'hard'.
    pub difficulty: String,
    pub points: i64,
    pub time_limit: String,
    pub memory_limit: String,
    pub description: String,
    pub input_format: String,
    pub output_format: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub starter_code: HashMap<Language, String>,
    /// Source patterns used by the pattern judge. Every group needs one hit.
    #[serde(default)]
    pub patterns: Vec<Vec<String>>,
}

/// Problem listing entry.
#[derive(Debug, Serialize)]
pub struct ProblemSummary {
    pub id: i64,
    pub title: String,
    pub difficulty: String,
    pub points: i64,
}

impl From<&CodingProblem> for ProblemSummary {
    fn from(p: &CodingProblem) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            difficulty: p.difficulty.clone(),
            points: p.points,
        }
    }
}

/// Full problem as shown in the editor (no pattern hints).
#[derive(Debug, Serialize)]
pub struct ProblemDetail<'a> {
    pub id: i64,
    pub title: &'a str,
    pub difficulty: &'a str,
    pub points: i64,
    pub time_limit: &'a str,
    pub memory_limit: &'a str,
    pub description: &'a str,
    pub input_format: &'a str,
    pub output_format: &'a str,
    pub examples: &'a [TestCase],
    pub starter_code: &'a HashMap<Language, String>,
}

impl<'a> From<&'a CodingProblem> for ProblemDetail<'a> {
    fn from(p: &'a CodingProblem) -> Self {
        Self {
            id: p.id,
            title: &p.title,
            difficulty: &p.difficulty,
            points: p.points,
            time_limit: &p.time_limit,
            memory_limit: &p.memory_limit,
            description: &p.description,
            input_format: &p.input_format,
            output_format: &p.output_format,
            examples: &p.test_cases,
            starter_code: &p.starter_code,
        }
    }
}

/// DTO for `POST /api/problems/{id}/submit`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitCodeRequest {
    pub language: Language,
    #[validate(length(max = 65536, message = "Source code is too large."))]
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestCaseResult {
    pub test_case: usize,
    pub passed: bool,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub error: Option<String>,
}

/// Outcome of judging one submission.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub all_passed: bool,
    pub results: Vec<TestCaseResult>,
}

impl Verdict {
    pub fn from_results(results: Vec<TestCaseResult>) -> Self {
        let all_passed = !results.is_empty() && results.iter().all(|r| r.passed);
        Self { all_passed, results }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitCodeResponse {
    pub verdict: Verdict,
    pub points_awarded: i64,
    pub already_solved: bool,
    pub total_points: Option<i64>,
}
