// src/services/sessions.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::AbortHandle};
use uuid::Uuid;

use crate::{
    error::AppError,
    identity::{IdentityEvent, Subscription},
    models::quiz::{QuizOutcome, SessionView, TechStack},
    services::{
        quiz::{Advance, Answer, QuizPhase, QuizSession, Tick},
        rules,
    },
};

const TICK: Duration = Duration::from_secs(1);

/// Pending countdown task. Dropping it cancels the next tick.
struct Ticker(AbortHandle);

impl Drop for Ticker {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Slot {
    session: QuizSession,
    ticker: Option<Ticker>,
    // Set while a completed attempt is being paid out.
    finishing: bool,
}

/// A session that just finished, handed to the award rules.
#[derive(Debug)]
pub struct FinishedQuiz {
    pub stack: TechStack,
    pub outcome: QuizOutcome,
    pub answers: Vec<Answer>,
}

/// Result of `QuizSessions::next`.
#[derive(Debug)]
pub enum NextStep {
    Question(SessionView),
    Finished(FinishedQuiz),
}

/// In-process registry of live quiz sessions.
///
/// Sessions are foreground-only: nothing here is persisted, and a session
/// disappears when it completes, is abandoned or its owner signs out.
#[derive(Clone)]
pub struct QuizSessions {
    slots: Arc<Mutex<HashMap<Uuid, Slot>>>,
    seconds_per_question: u32,
}

impl QuizSessions {
    pub fn new(seconds_per_question: u32) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            seconds_per_question,
        }
    }

    pub async fn create(&self, user_id: &str, stack: TechStack) -> SessionView {
        let session = QuizSession::new(user_id, stack, self.seconds_per_question);
        let view = session.view();
        self.slots.lock().await.insert(
            session.id(),
            Slot {
                session,
                ticker: None,
                finishing: false,
            },
        );
        view
    }

    pub async fn view(&self, id: Uuid, user_id: &str) -> Result<SessionView, AppError> {
        let slots = self.slots.lock().await;
        let slot = owned(&slots, id, user_id)?;
        Ok(slot.session.view())
    }

    pub async fn start(&self, id: Uuid, user_id: &str) -> Result<SessionView, AppError> {
        let mut slots = self.slots.lock().await;
        let slot = owned_mut(&mut slots, id, user_id)?;
        slot.session.start()?;
        slot.ticker = Some(self.spawn_ticker(id));
        Ok(slot.session.view())
    }

    pub async fn answer(&self, id: Uuid, user_id: &str, option: usize) -> Result<SessionView, AppError> {
        let mut slots = self.slots.lock().await;
        let slot = owned_mut(&mut slots, id, user_id)?;
        slot.session.select(option)?;
        if !matches!(slot.session.phase(), QuizPhase::InProgress { .. }) {
            slot.ticker = None;
        }
        Ok(slot.session.view())
    }

    /// Advances past a revealed answer.
    ///
    /// A completed session stays registered until `finish` removes it, so a
    /// failed payout can be retried with another `next`. Only one caller at
    /// a time gets the finished result.
    pub async fn next(&self, id: Uuid, user_id: &str) -> Result<NextStep, AppError> {
        let mut slots = self.slots.lock().await;
        let slot = owned_mut(&mut slots, id, user_id)?;
        let outcome = if slot.session.phase() == QuizPhase::Completed {
            if slot.finishing {
                return Err(AppError::Conflict(
                    "Quiz result is already being recorded".to_string(),
                ));
            }
            rules::quiz_outcome(slot.session.stack(), slot.session.score())
        } else {
            match slot.session.next()? {
                Advance::NextQuestion { .. } => {
                    slot.ticker = Some(self.spawn_ticker(id));
                    return Ok(NextStep::Question(slot.session.view()));
                }
                Advance::Completed(outcome) => outcome,
            }
        };

        slot.ticker = None;
        slot.finishing = true;
        Ok(NextStep::Finished(FinishedQuiz {
            stack: slot.session.stack().clone(),
            outcome,
            answers: slot.session.answers().to_vec(),
        }))
    }

    /// Drops a completed session once its result is recorded.
    pub async fn finish(&self, id: Uuid) {
        self.slots.lock().await.remove(&id);
    }

    /// Hands a completed session back for another `next` after a failed payout.
    pub async fn release(&self, id: Uuid) {
        if let Some(slot) = self.slots.lock().await.get_mut(&id) {
            slot.finishing = false;
        }
    }

    /// Discards a session and its pending tick.
    pub async fn abandon(&self, id: Uuid, user_id: &str) -> Result<(), AppError> {
        let mut slots = self.slots.lock().await;
        owned(&slots, id, user_id)?;
        slots.remove(&id);
        Ok(())
    }

    /// Tears down every session of `user_id`. Returns how many were dropped.
    pub async fn end_for_user(&self, user_id: &str) -> usize {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| slot.session.user_id() != user_id);
        before - slots.len()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ends sessions of users who sign out, for as long as the hub lives.
    pub fn watch_sign_outs(&self, mut subscription: Subscription) -> tokio::task::JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if let IdentityEvent::SignedOut { user_id } = event {
                    let dropped = sessions.end_for_user(&user_id).await;
                    if dropped > 0 {
                        tracing::info!("Dropped {} quiz session(s) of signed-out user {}", dropped, user_id);
                    }
                }
            }
        })
    }

    fn spawn_ticker(&self, id: Uuid) -> Ticker {
        let slots = Arc::clone(&self.slots);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                let mut guard = slots.lock().await;
                let Some(slot) = guard.get_mut(&id) else {
                    break;
                };
                match slot.session.tick() {
                    Tick::Counting { .. } => continue,
                    Tick::TimedOut => {
                        tracing::debug!("Quiz session {} question timed out", id);
                        // Self-abort only lands at the next yield, and we return first.
                        slot.ticker = None;
                        break;
                    }
                    Tick::Idle => break,
                }
            }
        });
        Ticker(handle.abort_handle())
    }
}

fn owned<'a>(slots: &'a HashMap<Uuid, Slot>, id: Uuid, user_id: &str) -> Result<&'a Slot, AppError> {
    match slots.get(&id) {
        Some(slot) if slot.session.user_id() == user_id => Ok(slot),
        _ => Err(AppError::NotFound("Quiz session not found".to_string())),
    }
}

fn owned_mut<'a>(
    slots: &'a mut HashMap<Uuid, Slot>,
    id: Uuid,
    user_id: &str,
) -> Result<&'a mut Slot, AppError> {
    match slots.get_mut(&id) {
        Some(slot) if slot.session.user_id() == user_id => Ok(slot),
        _ => Err(AppError::NotFound("Quiz session not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Catalog, identity::IdentityHub};

    fn frontend() -> TechStack {
        Catalog::builtin().unwrap().stack("frontend").unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_question_times_out_with_sentinel() {
        let sessions = QuizSessions::new(30);
        let view = sessions.create("u1", frontend()).await;
        sessions.start(view.id, "u1").await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let view = sessions.view(view.id, "u1").await.unwrap();
        assert_eq!(view.seconds_remaining, Some(20));

        tokio::time::sleep(Duration::from_secs(25)).await;
        let view = sessions.view(view.id, "u1").await.unwrap();
        assert_eq!(view.phase, "answer_revealed");
        let revealed = view.revealed.unwrap();
        assert_eq!(revealed.selected, -1);
        assert!(!revealed.correct);

        // The session still advances after a timeout.
        match sessions.next(view.id, "u1").await.unwrap() {
            NextStep::Question(next) => assert_eq!(next.question_index, Some(1)),
            NextStep::Finished(_) => panic!("quiz should continue"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn answering_cancels_the_pending_tick() {
        let sessions = QuizSessions::new(30);
        let id = sessions.create("u1", frontend()).await.id;
        sessions.start(id, "u1").await.unwrap();
        sessions.answer(id, "u1", 0).await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        let view = sessions.view(id, "u1").await.unwrap();
        assert_eq!(view.phase, "answer_revealed");
        assert_eq!(view.revealed.unwrap().selected, 0);

        sessions.next(id, "u1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let view = sessions.view(id, "u1").await.unwrap();
        assert_eq!(view.seconds_remaining, Some(25));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_removes_the_session() {
        let sessions = QuizSessions::new(30);
        let stack = frontend();
        let answers: Vec<usize> = stack.questions.iter().map(|q| q.correct_answer).collect();
        let id = sessions.create("u1", stack).await.id;
        sessions.start(id, "u1").await.unwrap();

        let mut finished = None;
        for option in answers {
            sessions.answer(id, "u1", option).await.unwrap();
            if let NextStep::Finished(done) = sessions.next(id, "u1").await.unwrap() {
                finished = Some(done);
            }
        }

        let done = finished.expect("quiz should finish");
        assert_eq!(done.outcome.score, 5);
        assert_eq!(done.outcome.points_earned, 50);

        sessions.finish(id).await;
        assert!(sessions.is_empty().await);
        assert!(matches!(sessions.view(id, "u1").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn released_result_can_be_collected_again() {
        let sessions = QuizSessions::new(30);
        let stack = frontend();
        let answers: Vec<usize> = stack.questions.iter().map(|q| q.correct_answer).collect();
        let id = sessions.create("u1", stack).await.id;
        sessions.start(id, "u1").await.unwrap();

        let mut finished = None;
        for option in answers {
            sessions.answer(id, "u1", option).await.unwrap();
            if let NextStep::Finished(done) = sessions.next(id, "u1").await.unwrap() {
                finished = Some(done);
            }
        }
        assert_eq!(finished.unwrap().outcome.points_earned, 50);

        // A second caller cannot collect while the payout is in flight.
        assert!(matches!(sessions.next(id, "u1").await, Err(AppError::Conflict(_))));

        // Payout failed: the same result is handed out again.
        sessions.release(id).await;
        match sessions.next(id, "u1").await.unwrap() {
            NextStep::Finished(again) => {
                assert_eq!(again.outcome.score, 5);
                assert_eq!(again.outcome.points_earned, 50);
                assert_eq!(again.answers.len(), 5);
            }
            NextStep::Question(_) => panic!("quiz should stay completed"),
        }
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_belong_to_their_owner() {
        let sessions = QuizSessions::new(30);
        let id = sessions.create("u1", frontend()).await.id;
        assert!(matches!(sessions.start(id, "u2").await, Err(AppError::NotFound(_))));
        assert!(matches!(sessions.abandon(id, "u2").await, Err(AppError::NotFound(_))));
        sessions.abandon(id, "u1").await.unwrap();
        assert!(sessions.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_tears_down_sessions() {
        let hub = IdentityHub::new();
        let sessions = QuizSessions::new(30);
        let _watcher = sessions.watch_sign_outs(hub.subscribe());

        let mine = sessions.create("u1", frontend()).await.id;
        sessions.start(mine, "u1").await.unwrap();
        sessions.create("u2", frontend()).await;

        hub.publish(IdentityEvent::SignedOut {
            user_id: "u1".to_string(),
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sessions.len().await, 1);
        assert!(matches!(sessions.view(mine, "u1").await, Err(AppError::NotFound(_))));
    }
}
