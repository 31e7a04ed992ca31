//! Fixtures shared by the review tests

use std::{
    collections::HashMap,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::DateTime;

use super::{
    controller::ReviewSource,
    session::ReviewSession,
    submission::SubmissionEndpoint,
};
use crate::core::{
    Meaning,
    Reading,
    ReviewSubmission,
    SrsStage,
    Subject,
    SubjectType,
    SubmissionOutcome,
    SubmittedReview,
    WanipopError,
};

pub fn radical(subject_id: u64, meaning: &str) -> Subject {
    Subject {
        subject_id,
        assignment_id: subject_id + 1000,
        subject_type: SubjectType::Radical,
        characters: None,
        meanings: vec![Meaning { meaning: meaning.to_string(), primary: true, accepted_answer: true }],
        readings: None,
        meaning_mnemonic: None,
        reading_mnemonic: None,
    }
}

pub fn kanji(subject_id: u64, meaning: &str, reading: &str) -> Subject {
    Subject {
        subject_type: SubjectType::Kanji,
        characters: Some("火".to_string()),
        readings: Some(vec![Reading {
            reading: reading.to_string(),
            primary: true,
            accepted_answer: true,
            kind: Some("onyomi".to_string()),
        }]),
        ..radical(subject_id, meaning)
    }
}

pub fn success(payload: &ReviewSubmission) -> SubmissionOutcome {
    SubmissionOutcome::Success(SubmittedReview {
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        assignment_id: payload.assignment_id,
        subject_id: payload.assignment_id.saturating_sub(1000),
        starting_srs_stage: SrsStage::Apprentice2,
        ending_srs_stage: SrsStage::Apprentice3,
        incorrect_meaning_answers: payload.incorrect_meaning_answers,
        incorrect_reading_answers: payload.incorrect_reading_answers,
    })
}

pub fn failure(payload: &ReviewSubmission, error: &str) -> SubmissionOutcome {
    SubmissionOutcome::Failure { payload: payload.clone(), error: error.to_string() }
}

/// Answers every remaining task correctly
pub fn answer_all(session: &mut ReviewSession) {
    while let Some(task) = session.current_task() {
        let answer = task.expected_answers()[0].clone();
        session.submit_attempt(&answer).unwrap();
        session.advance().unwrap();
    }
}

/// Fails each listed assignment for the given number of calls, then saves it
#[derive(Default)]
pub struct FlakyEndpoint {
    failures_left: Mutex<HashMap<u64, u32>>,
    calls: Mutex<Vec<Vec<u64>>>,
}

impl FlakyEndpoint {
    pub fn failing(failures: &[(u64, u32)]) -> Self {
        Self { failures_left: Mutex::new(failures.iter().copied().collect()), calls: Mutex::default() }
    }

    pub fn calls(&self) -> Vec<Vec<u64>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionEndpoint for FlakyEndpoint {
    async fn submit_outcomes(&self, outcomes: Vec<ReviewSubmission>) -> Vec<SubmissionOutcome> {
        self.calls.lock().unwrap().push(outcomes.iter().map(|o| o.assignment_id).collect());

        let mut failures_left = self.failures_left.lock().unwrap();
        outcomes
            .iter()
            .map(|payload| match failures_left.get_mut(&payload.assignment_id) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    failure(payload, "service unavailable")
                }
                _ => success(payload),
            })
            .collect()
    }
}

/// Leaves the listed assignments out of its first response
pub struct DroppingEndpoint {
    dropped: Vec<u64>,
    calls: Mutex<Vec<Vec<u64>>>,
}

impl DroppingEndpoint {
    pub fn dropping(assignment_ids: &[u64]) -> Self {
        Self { dropped: assignment_ids.to_vec(), calls: Mutex::default() }
    }

    pub fn calls(&self) -> Vec<Vec<u64>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionEndpoint for DroppingEndpoint {
    async fn submit_outcomes(&self, outcomes: Vec<ReviewSubmission>) -> Vec<SubmissionOutcome> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(outcomes.iter().map(|o| o.assignment_id).collect());
        let first_call = calls.len() == 1;

        outcomes
            .iter()
            .filter(|payload| !(first_call && self.dropped.contains(&payload.assignment_id)))
            .map(success)
            .collect()
    }
}

/// Hands out the queued batches in order, then empty ones
#[derive(Default)]
pub struct BatchSource {
    batches: Mutex<Vec<Result<Vec<Subject>, WanipopError>>>,
}

impl BatchSource {
    pub fn new(mut batches: Vec<Result<Vec<Subject>, WanipopError>>) -> Self {
        batches.reverse();
        Self { batches: Mutex::new(batches) }
    }
}

#[async_trait]
impl ReviewSource for BatchSource {
    async fn fetch_review_batch(&self) -> Result<Vec<Subject>, WanipopError> {
        self.batches.lock().unwrap().pop().unwrap_or_else(|| Ok(Vec::new()))
    }
}
