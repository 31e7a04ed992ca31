use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{
    debug,
    info,
    warn,
};

use super::session::{
    ReviewSession,
    SessionState,
};
use crate::core::{
    ReviewSubmission,
    SubmissionOutcome,
    WanipopError,
};

/// Remote service that stores review outcomes. Every submitted item gets its
/// own success or failure entry back.
#[async_trait]
pub trait SubmissionEndpoint: Send + Sync {
    async fn submit_outcomes(&self, outcomes: Vec<ReviewSubmission>) -> Vec<SubmissionOutcome>;
}

/// Replaces entries of `results` in place with the response entry for the same
/// assignment. Entries missing from the response are left as they were.
pub fn update_study_results(
    results: &mut [SubmissionOutcome],
    response: Vec<SubmissionOutcome>,
) -> usize {
    let mut replaced = 0;
    for outcome in response {
        match results.iter_mut().find(|r| r.assignment_id() == outcome.assignment_id()) {
            Some(slot) => {
                *slot = outcome;
                replaced += 1;
            }
            None => debug!("Ignoring result for unknown assignment {}", outcome.assignment_id()),
        }
    }
    replaced
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total submission passes, the first one included
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn allows_retry(&self, retry_passes: u32) -> bool {
        retry_passes + 1 < self.max_attempts
    }

    /// Wait before retry pass `retry_pass` (1-based): doubles each pass up to `max_backoff`.
    pub fn backoff_for(&self, retry_pass: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_pass.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub succeeded: usize,
    pub unresolved: usize,
    pub retry_passes: u32,
}

pub struct SubmissionCoordinator<E> {
    endpoint: E,
    policy: RetryPolicy,
}

impl<E: SubmissionEndpoint> SubmissionCoordinator<E> {
    pub fn new(endpoint: E, policy: RetryPolicy) -> Self {
        Self { endpoint, policy }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Sends the whole ledger and stores the response as the session's results.
    pub async fn submit(&self, session: &mut ReviewSession) -> Result<SessionState, WanipopError> {
        let payload = session.begin_submission()?;
        info!("Submitting {} reviews", payload.len());
        let response = self.endpoint.submit_outcomes(payload).await;
        session.record_results(response)
    }

    /// Resends only the subjects whose last submission failed.
    pub async fn retry_failed(
        &self,
        session: &mut ReviewSession,
    ) -> Result<SessionState, WanipopError> {
        let payload = session.begin_retry()?;
        info!("Retrying {} failed reviews", payload.len());
        let response = self.endpoint.submit_outcomes(payload).await;
        session.record_results(response)
    }

    /// Submits, then retries failures with backoff until everything is saved or
    /// the policy runs out of attempts.
    pub async fn submit_until_settled(
        &self,
        session: &mut ReviewSession,
    ) -> Result<SubmissionReport, WanipopError> {
        let mut state = self.submit(session).await?;

        while state == SessionState::PartialFailure {
            let passes = session.retry_passes();
            if !self.policy.allows_retry(passes) {
                session.abandon_retries()?;
                break;
            }

            let wait = self.policy.backoff_for(passes + 1);
            warn!(
                "{} reviews failed to save, retrying in {:?}",
                session.unresolved().count(),
                wait
            );
            sleep(wait).await;
            state = self.retry_failed(session).await?;
        }

        let unresolved = session.unresolved().count();
        Ok(SubmissionReport {
            succeeded: session.results().len() - unresolved,
            unresolved,
            retry_passes: session.retry_passes(),
        })
    }
}
