pub mod api;
pub mod types;

use std::{
    collections::HashMap,
    sync::atomic::{
        AtomicUsize,
        Ordering,
    },
};

pub use api::WaniKaniClient;
use async_trait::async_trait;
use chrono::{
    DateTime,
    Utc,
};
use futures::future::join_all;
use rand::{
    seq::SliceRandom,
    Rng,
};
use tracing::{
    info,
    warn,
};
use types::{
    AssignmentData,
    Resource,
    SubjectData,
    SummaryData,
    TimeBucket,
};

use crate::{
    core::{
        ReviewSubmission,
        Subject,
        SubmissionOutcome,
        WanipopError,
    },
    review::{
        ReviewSource,
        SubmissionEndpoint,
    },
};

fn first_available_bucket(summary: &SummaryData, now: DateTime<Utc>) -> Option<&TimeBucket> {
    summary
        .reviews
        .iter()
        .find(|bucket| bucket.available_at <= now && !bucket.subject_ids.is_empty())
}

pub fn has_available_reviews(summary: &SummaryData, now: DateTime<Utc>) -> bool {
    first_available_bucket(summary, now).is_some()
}

/// Subject ids of the first review bucket that is already due, shuffled and
/// cut down to `batch_size`.
pub fn pick_review_ids<R: Rng + ?Sized>(
    summary: &SummaryData,
    now: DateTime<Utc>,
    batch_size: usize,
    rng: &mut R,
) -> Option<Vec<u64>> {
    let bucket = first_available_bucket(summary, now)?;
    let mut ids = bucket.subject_ids.clone();
    ids.shuffle(rng);
    ids.truncate(batch_size);
    Some(ids)
}

/// Joins assignments and subjects on the subject id. Subjects without an
/// assignment are dropped; the order follows `subject_ids`.
pub fn build_subjects(
    subject_ids: &[u64],
    assignments: Vec<Resource<AssignmentData>>,
    subjects: Vec<Resource<SubjectData>>,
) -> Vec<Subject> {
    let assignments: HashMap<u64, Resource<AssignmentData>> =
        assignments.into_iter().map(|a| (a.data.subject_id, a)).collect();
    let mut subjects: HashMap<u64, Resource<SubjectData>> =
        subjects.into_iter().map(|s| (s.id, s)).collect();

    subject_ids
        .iter()
        .filter_map(|subject_id| {
            let subject = subjects.remove(subject_id)?;
            let Some(assignment) = assignments.get(subject_id) else {
                warn!("No assignment for subject {subject_id}, skipping");
                return None;
            };

            Some(Subject {
                subject_id: subject.id,
                assignment_id: assignment.id,
                subject_type: assignment.data.subject_type,
                characters: subject.data.characters,
                meanings: subject.data.meanings,
                readings: subject.data.readings,
                meaning_mnemonic: subject.data.meaning_mnemonic,
                reading_mnemonic: subject.data.reading_mnemonic,
            })
        })
        .collect()
}

/// Loads review batches from the summary endpoint
pub struct WaniKaniSource {
    client: WaniKaniClient,
    batch_size: AtomicUsize,
}

impl WaniKaniSource {
    pub fn new(client: WaniKaniClient, batch_size: usize) -> Self {
        Self { client, batch_size: AtomicUsize::new(batch_size.max(1)) }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.load(Ordering::Relaxed)
    }

    /// Applies from the next fetched batch
    pub fn set_batch_size(&self, batch_size: usize) {
        self.batch_size.store(batch_size.max(1), Ordering::Relaxed);
    }
}

#[async_trait]
impl ReviewSource for WaniKaniSource {
    async fn fetch_review_batch(&self) -> Result<Vec<Subject>, WanipopError> {
        let summary = self.client.fetch_summary().await?;
        let ids = {
            let mut rng = rand::rng();
            pick_review_ids(&summary, Utc::now(), self.batch_size(), &mut rng)
        };
        let ids = ids.ok_or(WanipopError::NoReviewsAvailable)?;

        let assignments = self.client.fetch_assignments_for_subjects(&ids).await?;
        let subjects = self.client.fetch_subjects(&ids).await?;
        let batch = build_subjects(&ids, assignments, subjects);
        info!("Loaded {} subjects for review", batch.len());
        Ok(batch)
    }
}

#[async_trait]
impl SubmissionEndpoint for WaniKaniClient {
    async fn submit_outcomes(&self, outcomes: Vec<ReviewSubmission>) -> Vec<SubmissionOutcome> {
        let requests = outcomes.iter().map(|payload| self.submit_review(payload));
        let responses = join_all(requests).await;

        outcomes
            .into_iter()
            .zip(responses)
            .map(|(payload, response)| match response {
                Ok(review) => SubmissionOutcome::Success(review),
                Err(e) => {
                    warn!("Review for assignment {} failed: {e}", payload.assignment_id);
                    SubmissionOutcome::Failure { payload, error: e.to_string() }
                }
            })
            .collect()
    }
}
