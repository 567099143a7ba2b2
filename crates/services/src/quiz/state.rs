use std::sync::Arc;

use catapult_core::model::{Cat, Question, QuizHistory, QuizMode, QuizResult, SessionId, UserId};
use catapult_core::scoring::{ScoreInput, ScoringPolicy};
use catapult_core::time::format_countdown;
use catapult_core::{Clock, QuizSettings};
use rand::rngs::StdRng;
use serde::Serialize;
use storage::repository::HistoryRepository;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::generator::QuestionGenerator;
use crate::error::{GenerateError, SessionError};

//
// ─── SNAPSHOT TYPES ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Loading,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    /// Every question was answered.
    Completed,
    /// The countdown reached zero.
    TimeExpired,
}

/// Whether the terminal result has reached the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PersistStatus {
    NotStarted,
    Persisted,
    /// The append failed; the result is held in memory until `retry_persist`.
    Pending(String),
}

/// Recoverable problem the caller may act on with `retry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionIssue {
    DataUnavailable { attempts: u32 },
    Storage(String),
}

/// What happened to one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnswerOutcome {
    Accepted {
        correct: bool,
        correct_answer: String,
    },
    /// Dropped without touching state.
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IgnoredReason {
    NotRunning,
    NoQuestion,
    UnknownOption,
}

/// Read-only copy of a session, published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub mode: QuizMode,
    pub phase: SessionPhase,
    pub question: Option<Question>,
    pub points: u32,
    pub question_index: u32,
    pub question_count: u32,
    pub remaining_secs: u32,
    pub last_answer: Option<String>,
    pub result: Option<QuizResult>,
    pub termination: Option<TerminationReason>,
    pub persist: PersistStatus,
    pub history: Option<QuizHistory>,
    pub issue: Option<SessionIssue>,
    pub cancelled: bool,
}

impl SessionSnapshot {
    /// Countdown as `m:ss`.
    #[must_use]
    pub fn remaining_display(&self) -> String {
        format_countdown(self.remaining_secs)
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.phase == SessionPhase::Terminated
    }

    /// Best score for this user and mode, once the result is persisted.
    #[must_use]
    pub fn best_result(&self) -> Option<f64> {
        self.history.as_ref().map(QuizHistory::best_result)
    }
}

//
// ─── SESSION CORE ──────────────────────────────────────────────────────────────
//

/// Collaborators a session core needs. Grouped to keep `SessionCore::new` short.
pub(crate) struct CoreDeps {
    pub clock: Clock,
    pub settings: QuizSettings,
    pub scoring: Arc<dyn ScoringPolicy>,
    pub generator: Arc<dyn QuestionGenerator>,
    pub history: Arc<dyn HistoryRepository>,
}

/// Mutable session state. Every method runs under the session mutex, so tick
/// and answer transitions never interleave.
pub(crate) struct SessionCore {
    id: SessionId,
    user: UserId,
    mode: QuizMode,
    deps: CoreDeps,
    rng: StdRng,
    snapshots: watch::Sender<SessionSnapshot>,

    phase: SessionPhase,
    pool: Vec<Cat>,
    question: Option<Question>,
    points: u32,
    question_index: u32,
    remaining_secs: u32,
    last_answer: Option<String>,
    result: Option<QuizResult>,
    termination: Option<TerminationReason>,
    persist: PersistStatus,
    history: Option<QuizHistory>,
    issue: Option<SessionIssue>,
    cancelled: bool,
}

impl SessionCore {
    pub(crate) fn new(
        id: SessionId,
        user: UserId,
        mode: QuizMode,
        pool: Vec<Cat>,
        deps: CoreDeps,
        rng: StdRng,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let remaining_secs = deps.settings.time_budget_secs();
        let initial = SessionSnapshot {
            session_id: id,
            user_id: user,
            mode,
            phase: SessionPhase::Loading,
            question: None,
            points: 0,
            question_index: 0,
            question_count: deps.settings.question_count(),
            remaining_secs,
            last_answer: None,
            result: None,
            termination: None,
            persist: PersistStatus::NotStarted,
            history: None,
            issue: None,
            cancelled: false,
        };
        let (snapshots, rx) = watch::channel(initial);
        let core = Self {
            id,
            user,
            mode,
            deps,
            rng,
            snapshots,
            phase: SessionPhase::Loading,
            pool,
            question: None,
            points: 0,
            question_index: 0,
            remaining_secs,
            last_answer: None,
            result: None,
            termination: None,
            persist: PersistStatus::NotStarted,
            history: None,
            issue: None,
            cancelled: false,
        };
        (core, rx)
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            user_id: self.user,
            mode: self.mode,
            phase: self.phase,
            question: self.question.clone(),
            points: self.points,
            question_index: self.question_index,
            question_count: self.deps.settings.question_count(),
            remaining_secs: self.remaining_secs,
            last_answer: self.last_answer.clone(),
            result: self.result.clone(),
            termination: self.termination,
            persist: self.persist.clone(),
            history: self.history.clone(),
            issue: self.issue.clone(),
            cancelled: self.cancelled,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    /// Draw the next question. On failure the question is cleared and the
    /// issue is recorded for the caller.
    async fn advance(&mut self) -> Result<(), GenerateError> {
        match self.deps.generator.generate(&self.pool, &mut self.rng).await {
            Ok(question) => {
                self.question = Some(question);
                self.issue = None;
                if self.phase == SessionPhase::Loading {
                    self.phase = SessionPhase::Running;
                    info!(pool = self.pool.len(), "session running");
                }
                Ok(())
            }
            Err(err) => {
                self.question = None;
                self.issue = Some(match &err {
                    GenerateError::DataUnavailable { attempts } => SessionIssue::DataUnavailable {
                        attempts: *attempts,
                    },
                    other => SessionIssue::Storage(other.to_string()),
                });
                Err(err)
            }
        }
    }

    /// First question. A failure leaves the session in `Loading`.
    pub(crate) async fn begin(&mut self) {
        let _ = self.advance().await;
        self.publish();
    }

    /// Re-run generation after a failure. No-op while a question is showing.
    pub(crate) async fn retry(&mut self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Terminated || self.cancelled {
            return Err(SessionError::Closed);
        }
        if self.question.is_some() {
            return Ok(());
        }
        let outcome = self.advance().await;
        self.publish();
        outcome.map_err(SessionError::from)
    }

    pub(crate) async fn on_tick(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.terminate(TerminationReason::TimeExpired).await;
        }
        self.publish();
    }

    pub(crate) async fn on_answer(&mut self, option: String) -> AnswerOutcome {
        if self.phase != SessionPhase::Running {
            return AnswerOutcome::Ignored(IgnoredReason::NotRunning);
        }
        let Some(question) = self.question.as_ref() else {
            return AnswerOutcome::Ignored(IgnoredReason::NoQuestion);
        };
        if !question.has_option(&option) {
            debug!(option = %option, "answer not among options");
            return AnswerOutcome::Ignored(IgnoredReason::UnknownOption);
        }

        let correct = question.is_correct(&option);
        let correct_answer = question.correct_answer().to_owned();
        if correct {
            self.points += 1;
        }
        self.question_index += 1;
        self.last_answer = Some(option);
        debug!(
            correct,
            points = self.points,
            index = self.question_index,
            "answer applied"
        );

        if self.question_index >= self.deps.settings.question_count() {
            self.terminate(TerminationReason::Completed).await;
        } else {
            let _ = self.advance().await;
        }
        self.publish();

        AnswerOutcome::Accepted {
            correct,
            correct_answer,
        }
    }

    /// Enter `Terminated`. Only the first call computes and persists a result.
    async fn terminate(&mut self, reason: TerminationReason) {
        if self.result.is_some() {
            return;
        }
        self.phase = SessionPhase::Terminated;
        self.termination = Some(reason);
        self.question = None;

        let input = ScoreInput::new(self.points, self.remaining_secs, &self.deps.settings);
        let result = QuizResult::clamped(self.deps.scoring.score(input), self.deps.clock.now());
        info!(
            ?reason,
            points = self.points,
            remaining_secs = self.remaining_secs,
            score = result.score(),
            "session terminated"
        );
        self.result = Some(result);
        let _ = self.persist_once().await;
    }

    async fn persist_once(&mut self) -> Result<QuizHistory, SessionError> {
        let Some(result) = self.result.as_ref() else {
            return Err(SessionError::NotTerminated);
        };
        match self.deps.history.append(self.user, self.mode, result).await {
            Ok(history) => {
                self.persist = PersistStatus::Persisted;
                self.history = Some(history.clone());
                Ok(history)
            }
            Err(err) => {
                error!(%err, "failed to persist quiz result");
                self.persist = PersistStatus::Pending(err.to_string());
                Err(SessionError::PersistenceFailure(err))
            }
        }
    }

    /// One more append attempt for a pending result.
    pub(crate) async fn retry_persist(&mut self) -> Result<QuizHistory, SessionError> {
        if self.result.is_none() {
            return Err(SessionError::NotTerminated);
        }
        if let (PersistStatus::Persisted, Some(history)) = (&self.persist, &self.history) {
            return Ok(history.clone());
        }
        let outcome = self.persist_once().await;
        self.publish();
        outcome
    }

    pub(crate) fn mark_cancelled(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            info!("session cancelled");
            self.publish();
        }
    }
}
