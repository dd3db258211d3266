// src/catalog.rs

use serde::Deserialize;

use crate::{
    error::AppError,
    models::{problem::CodingProblem, quiz::TechStack},
};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Quiz stacks and coding problems offered by the arena.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub stacks: Vec<TechStack>,
    pub problems: Vec<CodingProblem>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, AppError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a JSON file on disk.
    pub fn from_path(path: &str) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Internal(format!("cannot read catalog {}: {}", path, e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn stack(&self, id: &str) -> Result<&TechStack, AppError> {
        self.stacks
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Quiz stack '{}' not found", id)))
    }

    pub fn problem(&self, id: i64) -> Result<&CodingProblem, AppError> {
        self.problems
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Problem {} not found", id)))
    }

    /// Award rules rely on these, so a bad catalog fails at startup.
    fn check(&self) -> Result<(), AppError> {
        for stack in &self.stacks {
            if stack.points_per_question <= 0 || stack.questions.is_empty() {
                return Err(AppError::Validation(format!(
                    "stack '{}' needs questions and positive points",
                    stack.id
                )));
            }
            if let Some(q) = stack
                .questions
                .iter()
                .find(|q| q.correct_answer >= q.options.len())
            {
                return Err(AppError::Validation(format!(
                    "question {} of stack '{}' has no valid answer",
                    q.id, stack.id
                )));
            }
        }
        if let Some(p) = self
            .problems
            .iter()
            .find(|p| p.points <= 0 || p.test_cases.is_empty())
        {
            return Err(AppError::Validation(format!(
                "problem {} needs test cases and positive points",
                p.id
            )));
        }
        Ok(())
    }
}
