use std::sync::Arc;

use catapult_core::model::{QuizHistory, QuizMode, SessionId, UserId};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::time::{Instant, interval_at};
use tracing::{Instrument, Span, debug};

use super::state::{AnswerOutcome, SessionCore, SessionPhase, SessionSnapshot};
use crate::error::SessionError;

/// Input accepted by the session's event task.
#[derive(Debug)]
pub(crate) enum QuizEvent {
    AnswerSubmitted {
        option: String,
        reply: oneshot::Sender<AnswerOutcome>,
    },
    Cancel,
}

/// Handle to one live quiz session.
///
/// Two background tasks drive the session: a countdown timer and a single
/// consumer of answer events. Both go through the same mutex. Dropping the
/// handle cancels both.
pub struct QuizSession {
    id: SessionId,
    user: UserId,
    mode: QuizMode,
    core: Arc<Mutex<SessionCore>>,
    events: mpsc::Sender<QuizEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel: watch::Sender<bool>,
}

impl QuizSession {
    /// Spawn the timer and event tasks for a core that has already run
    /// `begin`.
    pub(crate) fn spawn(
        core: SessionCore,
        snapshots: watch::Receiver<SessionSnapshot>,
        tick: std::time::Duration,
        event_capacity: usize,
        span: Span,
    ) -> Self {
        let snapshot = core.snapshot();
        let core = Arc::new(Mutex::new(core));
        let (events_tx, events_rx) = mpsc::channel(event_capacity.max(1));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tokio::spawn(
            run_timer(Arc::clone(&core), tick, cancel_rx.clone()).instrument(span.clone()),
        );
        tokio::spawn(
            run_events(Arc::clone(&core), events_rx, cancel_tx.clone(), cancel_rx)
                .instrument(span),
        );

        Self {
            id: snapshot.session_id,
            user: snapshot.user_id,
            mode: snapshot.mode,
            core,
            events: events_tx,
            snapshots,
            cancel: cancel_tx,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Submit an answer. Answers for a stale or finished question come back as
    /// `AnswerOutcome::Ignored`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after the session was cancelled.
    pub async fn answer(&self, option: impl Into<String>) -> Result<AnswerOutcome, SessionError> {
        let (reply, outcome) = oneshot::channel();
        self.events
            .send(QuizEvent::AnswerSubmitted {
                option: option.into(),
                reply,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        outcome.await.map_err(|_| SessionError::Closed)
    }

    /// Wait until the session terminates. The returned snapshot already
    /// reflects the persistence attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the session is cancelled first.
    pub async fn wait_for_terminal(&self) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| s.phase == SessionPhase::Terminated || s.cancelled)
            .await
            .map_err(|_| SessionError::Closed)?
            .clone();
        if snapshot.phase == SessionPhase::Terminated {
            Ok(snapshot)
        } else {
            Err(SessionError::Closed)
        }
    }

    /// Re-run question generation after `DataUnavailable`.
    ///
    /// # Errors
    ///
    /// Returns the generation error again if the retry also fails, or
    /// `SessionError::Closed` once the session has ended.
    pub async fn retry(&self) -> Result<(), SessionError> {
        self.core.lock().await.retry().await
    }

    /// Retry a pending history append once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PersistenceFailure` if the append fails again, or
    /// `SessionError::NotTerminated` while the session is still running.
    pub async fn retry_persist(&self) -> Result<QuizHistory, SessionError> {
        self.core.lock().await.retry_persist().await
    }

    /// Abandon the session without producing a result.
    pub fn cancel(&self) {
        if !*self.cancel.borrow() {
            let _ = self.events.try_send(QuizEvent::Cancel);
            self.cancel.send_replace(true);
        }
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn run_timer(
    core: Arc<Mutex<SessionCore>>,
    period: std::time::Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let mut core = core.lock().await;
                core.on_tick().await;
                if core.phase() == SessionPhase::Terminated {
                    break;
                }
            }
        }
    }
    debug!("timer stopped");
}

async fn run_events(
    core: Arc<Mutex<SessionCore>>,
    mut events: mpsc::Receiver<QuizEvent>,
    cancel_tx: watch::Sender<bool>,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            event = events.recv() => match event {
                Some(QuizEvent::AnswerSubmitted { option, reply }) => {
                    let outcome = core.lock().await.on_answer(option).await;
                    let _ = reply.send(outcome);
                }
                Some(QuizEvent::Cancel) | None => {
                    cancel_tx.send_replace(true);
                    break;
                }
            },
        }
    }
    core.lock().await.mark_cancelled();
    debug!("event loop stopped");
}
