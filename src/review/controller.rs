use async_trait::async_trait;
use tokio::sync::broadcast::{
    self,
    error::TryRecvError,
};
use tracing::{
    info,
    warn,
};

use super::{
    ledger::Grade,
    session::{
        Advance,
        ReviewSession,
        SessionSnapshot,
        SessionState,
    },
    submission::{
        SubmissionCoordinator,
        SubmissionEndpoint,
        SubmissionReport,
    },
};
use crate::core::{
    Subject,
    WanipopError,
};

/// Supplies the subjects of one review session
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn fetch_review_batch(&self) -> Result<Vec<Subject>, WanipopError>;
}

/// External "reset-session" event. Every subscriber restarts its session when triggered.
#[derive(Clone)]
pub struct ResetSignal {
    sender: broadcast::Sender<()>,
}

impl Default for ResetSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(4);
        Self { sender }
    }

    /// Returns how many subscribers were notified
    pub fn trigger(&self) -> usize {
        self.sender.send(()).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

/// Drives a session against the item source and the submission endpoint.
/// The UI forwards attempts, flips and advances here and reads snapshots back.
pub struct ReviewController<S, E> {
    source: S,
    coordinator: SubmissionCoordinator<E>,
    session: ReviewSession,
    reset_rx: Option<broadcast::Receiver<()>>,
}

impl<S: ReviewSource, E: SubmissionEndpoint> ReviewController<S, E> {
    pub fn new(source: S, coordinator: SubmissionCoordinator<E>) -> Self {
        Self { source, coordinator, session: ReviewSession::new(), reset_rx: None }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Clears the session and loads a new batch. If fetching fails the session
    /// stays empty in `Loading`.
    pub async fn start(&mut self) -> Result<(), WanipopError> {
        self.session.reset();
        info!("Fetching review batch...");
        let batch = self.source.fetch_review_batch().await?;
        self.session.initialize(batch);
        Ok(())
    }

    pub fn submit_attempt(&mut self, attempt: &str) -> Result<bool, WanipopError> {
        self.session.submit_attempt(attempt)
    }

    pub fn flip(&mut self) -> Result<Grade, WanipopError> {
        self.session.flip()
    }

    pub fn advance(&mut self) -> Result<Advance, WanipopError> {
        self.session.advance()
    }

    /// Single submission pass without automatic retries.
    pub async fn submit(&mut self) -> Result<SessionState, WanipopError> {
        self.coordinator.submit(&mut self.session).await
    }

    /// Submits the finished session, retrying failures per the coordinator's policy.
    pub async fn finish(&mut self) -> Result<SubmissionReport, WanipopError> {
        self.coordinator.submit_until_settled(&mut self.session).await
    }

    /// One more retry pass for a session left with unresolved failures.
    pub async fn retry_failed(&mut self) -> Result<SessionState, WanipopError> {
        self.coordinator.retry_failed(&mut self.session).await
    }

    pub fn subscribe_reset(&mut self, signal: &ResetSignal) {
        self.reset_rx = Some(signal.subscribe());
    }

    pub fn unsubscribe_reset(&mut self) {
        self.reset_rx = None;
    }

    /// Restarts the session if a reset was signalled since the last check.
    pub async fn poll_reset(&mut self) -> Result<bool, WanipopError> {
        let Some(rx) = self.reset_rx.as_mut() else {
            return Ok(false);
        };

        let mut signalled = false;
        loop {
            match rx.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => signalled = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    warn!("Reset signal closed, unsubscribing");
                    self.reset_rx = None;
                    break;
                }
            }
        }

        if signalled {
            info!("Reset signal received");
            self.start().await?;
        }
        Ok(signalled)
    }
}
