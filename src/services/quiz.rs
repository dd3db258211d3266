// src/services/quiz.rs
//
// Single-attempt quiz state machine. Time only advances through `tick`,
// so the machine itself is deterministic; `services::sessions` drives it.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::quiz::{PublicQuestion, QuizOutcome, RevealedAnswer, SessionView, TechStack},
    services::rules,
};

/// Recorded response for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Selected(usize),
    /// The countdown reached zero first.
    TimedOut,
}

impl Answer {
    /// Selected index, or the `-1` sentinel for a timeout.
    pub fn index(&self) -> i64 {
        match self {
            Answer::Selected(i) => *i as i64,
            Answer::TimedOut => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NotStarted,
    InProgress { question: usize, seconds_remaining: u32 },
    AnswerRevealed { question: usize },
    Completed,
}

impl QuizPhase {
    pub fn name(&self) -> &'static str {
        match self {
            QuizPhase::NotStarted => "not_started",
            QuizPhase::InProgress { .. } => "in_progress",
            QuizPhase::AnswerRevealed { .. } => "answer_revealed",
            QuizPhase::Completed => "completed",
        }
    }
}

/// What a selection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Recorded { correct: bool },
    /// The question was already answered or timed out.
    Ignored,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Counting { seconds_remaining: u32 },
    TimedOut,
    /// No countdown is running; the ticker should stop.
    Idle,
}

/// Result of `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion { question: usize },
    Completed(QuizOutcome),
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    user_id: String,
    stack: TechStack,
    seconds_per_question: u32,
    phase: QuizPhase,
    answers: Vec<Answer>,
    correct: u32,
}

impl QuizSession {
    pub fn new(user_id: &str, stack: TechStack, seconds_per_question: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            stack,
            seconds_per_question: seconds_per_question.max(1),
            phase: QuizPhase::NotStarted,
            answers: Vec::new(),
            correct: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn stack(&self) -> &TechStack {
        &self.stack
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn score(&self) -> u32 {
        self.correct
    }

    pub fn start(&mut self) -> Result<(), AppError> {
        if self.phase != QuizPhase::NotStarted {
            return Err(AppError::Conflict("Quiz already started".to_string()));
        }
        self.phase = QuizPhase::InProgress {
            question: 0,
            seconds_remaining: self.seconds_per_question,
        };
        Ok(())
    }

    /// First selection (or timeout) for a question is final.
    pub fn select(&mut self, option: usize) -> Result<Selection, AppError> {
        match self.phase {
            QuizPhase::InProgress { question, .. } => {
                let q = &self.stack.questions[question];
                if option >= q.options.len() {
                    return Err(AppError::Validation(format!(
                        "Option {} does not exist for this question",
                        option
                    )));
                }
                let correct = option == q.correct_answer;
                if correct {
                    self.correct += 1;
                }
                self.answers.push(Answer::Selected(option));
                self.phase = QuizPhase::AnswerRevealed { question };
                Ok(Selection::Recorded { correct })
            }
            QuizPhase::AnswerRevealed { .. } => Ok(Selection::Ignored),
            QuizPhase::NotStarted => Err(AppError::Conflict("Quiz has not started".to_string())),
            QuizPhase::Completed => Err(AppError::Conflict("Quiz is already completed".to_string())),
        }
    }

    /// One second of the countdown.
    pub fn tick(&mut self) -> Tick {
        match self.phase {
            QuizPhase::InProgress { question, seconds_remaining } => {
                let left = seconds_remaining.saturating_sub(1);
                if left == 0 {
                    self.answers.push(Answer::TimedOut);
                    self.phase = QuizPhase::AnswerRevealed { question };
                    Tick::TimedOut
                } else {
                    self.phase = QuizPhase::InProgress { question, seconds_remaining: left };
                    Tick::Counting { seconds_remaining: left }
                }
            }
            _ => Tick::Idle,
        }
    }

    /// Moves past a revealed answer.
    pub fn next(&mut self) -> Result<Advance, AppError> {
        let QuizPhase::AnswerRevealed { question } = self.phase else {
            return Err(AppError::Conflict(
                "The current question has not been answered yet".to_string(),
            ));
        };
        if question + 1 < self.stack.questions.len() {
            self.phase = QuizPhase::InProgress {
                question: question + 1,
                seconds_remaining: self.seconds_per_question,
            };
            Ok(Advance::NextQuestion { question: question + 1 })
        } else {
            self.phase = QuizPhase::Completed;
            Ok(Advance::Completed(rules::quiz_outcome(&self.stack, self.correct)))
        }
    }

    pub fn view(&self) -> SessionView {
        let (question_index, seconds_remaining) = match self.phase {
            QuizPhase::InProgress { question, seconds_remaining } => {
                (Some(question), Some(seconds_remaining))
            }
            QuizPhase::AnswerRevealed { question } => (Some(question), None),
            _ => (None, None),
        };

        let question = question_index.map(|i| {
            let q = &self.stack.questions[i];
            PublicQuestion {
                id: q.id,
                question: q.question.clone(),
                options: q.options.clone(),
            }
        });

        let revealed = match (self.phase, self.answers.last()) {
            (QuizPhase::AnswerRevealed { question }, Some(answer)) => {
                let q = &self.stack.questions[question];
                Some(RevealedAnswer {
                    correct_answer: q.correct_answer,
                    explanation: q.explanation.clone(),
                    selected: answer.index(),
                    correct: *answer == Answer::Selected(q.correct_answer),
                })
            }
            _ => None,
        };

        SessionView {
            id: self.id,
            stack_id: self.stack.id.clone(),
            phase: self.phase.name(),
            question_index,
            total_questions: self.stack.questions.len(),
            seconds_remaining,
            score: self.correct,
            question,
            revealed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn session(stack_id: &str) -> QuizSession {
        let catalog = Catalog::builtin().unwrap();
        let stack = catalog.stack(stack_id).unwrap().clone();
        QuizSession::new("user-1", stack, 30)
    }

    fn correct_option(s: &QuizSession) -> usize {
        match s.phase() {
            QuizPhase::InProgress { question, .. } => s.stack().questions[question].correct_answer,
            other => panic!("not in progress: {:?}", other),
        }
    }

    fn wrong_option(s: &QuizSession) -> usize {
        (correct_option(s) + 1) % 4
    }

    #[test]
    fn frontend_scenario_scores_three_of_five() {
        let mut s = session("frontend");
        s.start().unwrap();

        // q1 correct
        let opt = correct_option(&s);
        assert_eq!(s.select(opt).unwrap(), Selection::Recorded { correct: true });
        s.next().unwrap();
        // q2 correct
        let opt = correct_option(&s);
        s.select(opt).unwrap();
        s.next().unwrap();
        // q3 times out
        for _ in 0..29 {
            assert!(matches!(s.tick(), Tick::Counting { .. }));
        }
        assert_eq!(s.tick(), Tick::TimedOut);
        s.next().unwrap();
        // q4 correct
        let opt = correct_option(&s);
        s.select(opt).unwrap();
        s.next().unwrap();
        // q5 wrong
        let opt = wrong_option(&s);
        assert_eq!(s.select(opt).unwrap(), Selection::Recorded { correct: false });

        let outcome = match s.next().unwrap() {
            Advance::Completed(outcome) => outcome,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.points_earned, 30);
        assert_eq!(s.answers()[2], Answer::TimedOut);
        assert_eq!(s.answers()[2].index(), -1);
        assert_eq!(s.phase(), QuizPhase::Completed);
    }

    #[test]
    fn first_answer_is_final() {
        let mut s = session("backend");
        s.start().unwrap();
        let wrong = wrong_option(&s);
        let right = correct_option(&s);
        s.select(wrong).unwrap();
        assert_eq!(s.select(right).unwrap(), Selection::Ignored);
        assert_eq!(s.score(), 0);
        assert_eq!(s.answers().len(), 1);
    }

    #[test]
    fn ticks_after_reveal_are_idle() {
        let mut s = session("devops");
        s.start().unwrap();
        let opt = correct_option(&s);
        s.select(opt).unwrap();
        assert_eq!(s.tick(), Tick::Idle);
        assert_eq!(s.answers().len(), 1);
    }

    #[test]
    fn cannot_skip_an_unanswered_question() {
        let mut s = session("mobile");
        assert!(matches!(s.next(), Err(AppError::Conflict(_))));
        s.start().unwrap();
        assert!(matches!(s.next(), Err(AppError::Conflict(_))));
        assert!(matches!(s.start(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut s = session("blockchain");
        s.start().unwrap();
        assert!(matches!(s.select(9), Err(AppError::Validation(_))));
        assert!(matches!(s.phase(), QuizPhase::InProgress { .. }));
    }

    #[test]
    fn view_hides_answer_until_revealed() {
        let mut s = session("ai-ml");
        s.start().unwrap();
        let view = s.view();
        assert_eq!(view.phase, "in_progress");
        assert_eq!(view.seconds_remaining, Some(30));
        assert!(view.revealed.is_none());

        s.select(0).unwrap();
        let view = s.view();
        assert_eq!(view.phase, "answer_revealed");
        assert!(view.revealed.is_some());
    }
}
