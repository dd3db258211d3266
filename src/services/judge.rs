// src/services/judge.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    models::problem::{CodingProblem, Language, TestCaseResult, Verdict},
};

/// Decides whether a submission solves a problem.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn run(
        &self,
        problem: &CodingProblem,
        language: Language,
        source: &str,
    ) -> Result<Verdict, AppError>;
}

fn require_source(source: &str) -> Result<(), AppError> {
    if source.trim().is_empty() {
        return Err(AppError::Validation("Please write some code first!".to_string()));
    }
    Ok(())
}

/// Demo judge: inspects the source text instead of executing it.
///
/// A problem passes when every pattern group has at least one
/// case-insensitive match in the source. Results are all-or-nothing.
pub struct PatternJudge;

impl PatternJudge {
    pub fn matches(problem: &CodingProblem, source: &str) -> bool {
        let haystack = source.to_lowercase();
        !problem.patterns.is_empty()
            && problem.patterns.iter().all(|group| {
                group
                    .iter()
                    .any(|needle| haystack.contains(&needle.to_lowercase()))
            })
    }
}

#[async_trait]
impl Judge for PatternJudge {
    async fn run(
        &self,
        problem: &CodingProblem,
        _language: Language,
        source: &str,
    ) -> Result<Verdict, AppError> {
        require_source(source)?;
        let passed = Self::matches(problem, source);
        let results = problem
            .test_cases
            .iter()
            .enumerate()
            .map(|(i, case)| TestCaseResult {
                test_case: i + 1,
                passed,
                input: case.input.clone(),
                expected: case.expected.clone(),
                actual: if passed {
                    case.expected.clone()
                } else {
                    "Wrong output".to_string()
                },
                error: None,
            })
            .collect();
        Ok(Verdict::from_results(results))
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionStatus {
    id: u32,
    description: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionResult {
    status: SubmissionStatus,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
}

/// Runs every test case on a Judge0-compatible execution service.
pub struct Judge0Judge {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_wait: Duration,
    poll_interval: Duration,
}

impl Judge0Judge {
    /// Each HTTP call is capped at `max_wait`, as is the polling loop.
    pub fn new(base_url: &str, api_key: Option<String>, max_wait: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(max_wait)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build Judge0 client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_wait,
            poll_interval: Duration::from_secs(1),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => {
                let host = reqwest::Url::parse(&self.base_url)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_default();
                builder
                    .header("X-RapidAPI-Key", key)
                    .header("X-RapidAPI-Host", host)
            }
            None => builder,
        }
    }

    async fn submit(&self, language: Language, source: &str, stdin: &str) -> Result<String, AppError> {
        let url = format!("{}/submissions?base64_encoded=false&wait=false", self.base_url);
        let resp = self
            .request(self.http.post(url))
            .json(&json!({
                "source_code": source,
                "language_id": language.judge0_id(),
                "stdin": stdin,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<SubmissionToken>().await?.token)
    }

    /// Polls until the submission leaves the queue or the wait bound is hit.
    async fn wait_for(&self, token: &str) -> Result<SubmissionResult, AppError> {
        let url = format!("{}/submissions/{}?base64_encoded=false", self.base_url, token);
        let deadline = tokio::time::Instant::now() + self.max_wait;
        loop {
            let result: SubmissionResult = self
                .request(self.http.get(&url))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            // 1 = In Queue, 2 = Processing
            if result.status.id > 2 {
                return Ok(result);
            }
            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(AppError::Upstream("Execution timeout".to_string()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Judge for Judge0Judge {
    async fn run(
        &self,
        problem: &CodingProblem,
        language: Language,
        source: &str,
    ) -> Result<Verdict, AppError> {
        require_source(source)?;
        let mut results = Vec::with_capacity(problem.test_cases.len());
        for (i, case) in problem.test_cases.iter().enumerate() {
            let token = self.submit(language, source, &case.input).await?;
            let outcome = self.wait_for(&token).await?;
            let actual = outcome.stdout.unwrap_or_default().trim().to_string();
            let error = outcome
                .stderr
                .or(outcome.compile_output)
                .filter(|e| !e.trim().is_empty());
            results.push(TestCaseResult {
                test_case: i + 1,
                passed: actual == case.expected.trim(),
                input: case.input.clone(),
                expected: case.expected.clone(),
                actual,
                error: error.or_else(|| {
                    // 3 = Accepted; anything else is worth surfacing.
                    (outcome.status.id != 3).then(|| outcome.status.description.clone())
                }),
            });
        }
        Ok(Verdict::from_results(results))
    }
}
