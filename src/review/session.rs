use std::collections::HashSet;

use tracing::{
    debug,
    info,
    warn,
};

use super::{
    catalog::SubjectCatalog,
    evaluator::evaluate,
    ledger::{
        Grade,
        ResultLedger,
    },
    queue::ReviewQueue,
    submission::update_study_results,
};
use crate::core::{
    utils::NormalizeAnswer,
    InputMode,
    KanaComparator,
    ReviewSubmission,
    ReviewTask,
    ScriptComparator,
    Subject,
    SubjectType,
    SubmissionOutcome,
    WanipopError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Reviewing,
    Submitting,
    PartialFailure,
    Retrying,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Presenting,
    Graded { correct: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next,
    Requeued,
    Exhausted,
}

/// Read-only view handed to the UI layer
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub task_state: TaskState,
    pub characters: Option<String>,
    pub subject_type: Option<SubjectType>,
    pub placeholder: Option<String>,
    pub input_mode: Option<InputMode>,
    pub expected_answers: Vec<String>,
    pub grading_in_progress: bool,
    pub remaining: usize,
    pub results: Vec<SubmissionOutcome>,
}

/// Owns the catalog, queue and ledger of one review session. Every mutation goes
/// through the methods below and a failed call leaves all of them untouched.
pub struct ReviewSession {
    catalog: SubjectCatalog,
    queue: ReviewQueue,
    ledger: ResultLedger,
    results: Vec<SubmissionOutcome>,
    state: SessionState,
    task_state: TaskState,
    retry_passes: u32,
    /// Payload of the pass currently waiting on the endpoint
    in_flight: Vec<ReviewSubmission>,
    comparator: Box<dyn ScriptComparator + Send + Sync>,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::with_comparator(Box::new(KanaComparator))
    }

    pub fn with_comparator(comparator: Box<dyn ScriptComparator + Send + Sync>) -> Self {
        Self {
            catalog: SubjectCatalog::default(),
            queue: ReviewQueue::new(),
            ledger: ResultLedger::new(),
            results: Vec::new(),
            state: SessionState::Loading,
            task_state: TaskState::Presenting,
            retry_passes: 0,
            in_flight: Vec::new(),
            comparator,
        }
    }

    /// Replaces everything with a fresh session built from `batch`.
    pub fn initialize(&mut self, batch: Vec<Subject>) {
        let (catalog, subjects) = SubjectCatalog::populate(batch);
        let queue = ReviewQueue::initialize(&subjects);

        self.catalog = catalog;
        self.queue = queue;
        self.ledger = ResultLedger::new();
        self.results = Vec::new();
        self.task_state = TaskState::Presenting;
        self.retry_passes = 0;
        self.in_flight = Vec::new();
        self.state = if self.queue.is_empty() {
            warn!("Review batch produced no tasks");
            SessionState::Loading
        } else {
            SessionState::Reviewing
        };

        info!("Session initialized with {} subjects, {} tasks", self.catalog.len(), self.queue.len());
    }

    pub fn reset(&mut self) {
        info!("Resetting review session");
        self.initialize(Vec::new());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn task_state(&self) -> TaskState {
        self.task_state
    }

    pub fn current_task(&self) -> Option<&ReviewTask> {
        self.queue.current()
    }

    pub fn placeholder(&self) -> Option<String> {
        self.current_task().map(ReviewTask::placeholder)
    }

    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    pub fn results(&self) -> &[SubmissionOutcome] {
        &self.results
    }

    pub fn retry_passes(&self) -> u32 {
        self.retry_passes
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &SubmissionOutcome> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// An empty queue only means the session is done once something was graded;
    /// before that it just has not been filled yet.
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && !self.ledger.is_empty()
    }

    pub fn grading_in_progress(&self) -> bool {
        matches!(self.state, SessionState::Submitting | SessionState::Retrying)
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), WanipopError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WanipopError::InvalidState { operation, state: format!("{:?}", self.state) })
        }
    }

    pub fn submit_attempt(&mut self, attempt: &str) -> Result<bool, WanipopError> {
        self.expect_state("submit an answer", &[SessionState::Reviewing])?;
        if matches!(self.task_state, TaskState::Graded { .. }) {
            return Err(WanipopError::AlreadyGraded);
        }
        let task = self.queue.current().cloned().ok_or(WanipopError::NoCurrentTask)?;
        if attempt.normalize_answer().is_empty() {
            return Err(WanipopError::EmptyAttempt);
        }

        let correct = evaluate(&task, attempt, self.comparator.as_ref())?;
        self.ledger.record(&task, correct, attempt);
        self.task_state = TaskState::Graded { correct };

        debug!("Graded {} as {}", task.placeholder(), if correct { "correct" } else { "incorrect" });
        Ok(correct)
    }

    /// Overrides the grade on record for the current task. The task then
    /// advances or requeues according to the flipped grade.
    pub fn flip(&mut self) -> Result<Grade, WanipopError> {
        self.expect_state("flip a grade", &[SessionState::Reviewing])?;
        if self.task_state == TaskState::Presenting {
            return Err(WanipopError::NotGraded);
        }
        let (subject_id, dimension) = self
            .queue
            .current()
            .map(|t| (t.subject_id(), t.dimension))
            .ok_or(WanipopError::NoCurrentTask)?;

        let grade = self.ledger.flip(subject_id, dimension)?;
        self.task_state = TaskState::Graded { correct: grade == Grade::Correct };
        Ok(grade)
    }

    pub fn advance(&mut self) -> Result<Advance, WanipopError> {
        self.expect_state("advance", &[SessionState::Reviewing])?;
        let correct = match self.task_state {
            TaskState::Graded { correct } => correct,
            TaskState::Presenting => return Err(WanipopError::NotGraded),
        };

        let step = if correct {
            self.queue.advance();
            Advance::Next
        } else {
            self.queue.requeue();
            Advance::Requeued
        };
        self.task_state = TaskState::Presenting;

        if self.is_exhausted() {
            info!("All tasks answered, {} subjects ready to submit", self.ledger.len());
            self.state = SessionState::Submitting;
            return Ok(Advance::Exhausted);
        }
        Ok(step)
    }

    /// Payload for every graded subject. Only valid once the queue is exhausted.
    pub fn begin_submission(&mut self) -> Result<Vec<ReviewSubmission>, WanipopError> {
        self.expect_state("submit results", &[SessionState::Submitting])?;
        self.in_flight = self.ledger.to_submission_payload();
        Ok(self.in_flight.clone())
    }

    /// Payload for the subjects whose last submission failed, rebuilt from the ledger.
    pub fn begin_retry(&mut self) -> Result<Vec<ReviewSubmission>, WanipopError> {
        self.expect_state("retry failed submissions", &[SessionState::PartialFailure])?;

        let failed: HashSet<u64> = self.unresolved().map(SubmissionOutcome::assignment_id).collect();
        let mut payload = self.ledger.payload_for(&failed);

        // Failures the ledger cannot rebuild are resent as they were
        for outcome in self.unresolved() {
            if let SubmissionOutcome::Failure { payload: original, .. } = outcome {
                if !payload.iter().any(|p| p.assignment_id == original.assignment_id) {
                    payload.push(original.clone());
                }
            }
        }

        self.state = SessionState::Retrying;
        self.in_flight = payload.clone();
        Ok(payload)
    }

    /// Stores the endpoint's response. Anything sent but missing from the
    /// response is recorded as a failure so it gets retried.
    pub fn record_results(
        &mut self,
        mut response: Vec<SubmissionOutcome>,
    ) -> Result<SessionState, WanipopError> {
        self.expect_state(
            "record submission results",
            &[SessionState::Submitting, SessionState::Retrying],
        )?;

        for payload in std::mem::take(&mut self.in_flight) {
            if !response.iter().any(|r| r.assignment_id() == payload.assignment_id) {
                warn!("No response for assignment {}", payload.assignment_id);
                response.push(SubmissionOutcome::Failure {
                    payload,
                    error: "no response from endpoint".to_string(),
                });
            }
        }

        if self.state == SessionState::Retrying {
            update_study_results(&mut self.results, response);
            self.retry_passes += 1;
        } else {
            self.results = response;
        }

        let failures = self.unresolved().count();
        self.state = if failures == 0 {
            SessionState::Completed
        } else {
            SessionState::PartialFailure
        };

        info!(
            "Submission results: {} saved, {} failed",
            self.results.len() - failures,
            failures
        );
        Ok(self.state)
    }

    /// Stops retrying; remaining failures stay in the results as unresolved.
    pub fn abandon_retries(&mut self) -> Result<(), WanipopError> {
        self.expect_state("stop retrying", &[SessionState::PartialFailure])?;
        warn!(
            "Giving up on {} reviews after {} retry passes",
            self.unresolved().count(),
            self.retry_passes
        );
        self.state = SessionState::Completed;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let task = self.current_task();
        let expected_answers = match (task, self.task_state) {
            (Some(task), TaskState::Graded { .. }) => task.expected_answers(),
            _ => Vec::new(),
        };

        SessionSnapshot {
            state: self.state,
            task_state: self.task_state,
            characters: task.and_then(|t| t.subject.characters.clone()),
            subject_type: task.map(|t| t.subject.subject_type),
            placeholder: task.map(ReviewTask::placeholder),
            input_mode: task.map(ReviewTask::input_mode),
            expected_answers,
            grading_in_progress: self.grading_in_progress(),
            remaining: self.queue.len(),
            results: self.results.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::Dimension,
        review::testing::{
            failure,
            kanji,
            radical,
            success,
        },
    };

    fn session_with(batch: Vec<Subject>) -> ReviewSession {
        let mut session = ReviewSession::new();
        session.initialize(batch);
        session
    }

    #[test]
    fn test_radical_session_reaches_submitting() {
        let mut session = session_with(vec![radical(1, "ground")]);
        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(session.placeholder().as_deref(), Some("Radical Meaning"));

        assert!(session.submit_attempt("ground").unwrap());
        assert_eq!(session.ledger().get(1).unwrap().meaning, Grade::Correct);

        assert_eq!(session.advance().unwrap(), Advance::Exhausted);
        assert!(session.is_exhausted());
        assert_eq!(session.state(), SessionState::Submitting);
        assert!(session.grading_in_progress());

        // The transition into Submitting happens once
        assert!(matches!(session.advance(), Err(WanipopError::InvalidState { .. })));
        assert!(matches!(session.submit_attempt("ground"), Err(WanipopError::InvalidState { .. })));
        assert_eq!(session.state(), SessionState::Submitting);
    }

    #[test]
    fn test_kanji_with_wrong_meaning() {
        let mut session = session_with(vec![kanji(2, "fire", "か")]);

        assert_eq!(session.current_task().unwrap().dimension, Dimension::Meaning);
        assert!(!session.submit_attempt("water").unwrap());
        assert_eq!(session.advance().unwrap(), Advance::Requeued);

        assert_eq!(session.placeholder().as_deref(), Some("Kanji Reading"));
        assert!(session.submit_attempt("か").unwrap());
        assert_eq!(session.advance().unwrap(), Advance::Next);

        // Requeued meaning comes back and is now answered correctly
        assert_eq!(session.current_task().unwrap().dimension, Dimension::Meaning);
        assert!(session.submit_attempt("fire").unwrap());
        assert_eq!(session.advance().unwrap(), Advance::Exhausted);

        let payload = session.begin_submission().unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].incorrect_meaning_answers, 1);
        assert_eq!(payload[0].incorrect_reading_answers, 0);
    }

    #[test]
    fn test_flip_decides_advance_or_requeue() {
        let mut session = session_with(vec![radical(1, "ground"), radical(3, "stick")]);

        assert!(!session.submit_attempt("gorund").unwrap());
        assert_eq!(session.flip().unwrap(), Grade::Correct);
        assert_eq!(session.task_state(), TaskState::Graded { correct: true });
        assert_eq!(session.advance().unwrap(), Advance::Next);
        assert_eq!(session.ledger().get(3).unwrap().meaning, Grade::Correct);

        assert!(session.submit_attempt("ground").unwrap());
        assert_eq!(session.flip().unwrap(), Grade::Incorrect);
        assert_eq!(session.advance().unwrap(), Advance::Requeued);
        assert_eq!(session.state(), SessionState::Reviewing);
    }

    #[test]
    fn test_precondition_failures_leave_state_alone() {
        let mut session = ReviewSession::new();
        assert!(matches!(session.submit_attempt("x"), Err(WanipopError::InvalidState { .. })));
        assert!(!session.is_exhausted());
        assert_eq!(session.state(), SessionState::Loading);

        let mut session = session_with(vec![radical(1, "ground")]);
        assert!(matches!(session.flip(), Err(WanipopError::NotGraded)));
        assert!(matches!(session.advance(), Err(WanipopError::NotGraded)));
        assert!(matches!(session.submit_attempt("   "), Err(WanipopError::EmptyAttempt)));
        assert!(session.ledger().is_empty());

        session.submit_attempt("ground").unwrap();
        assert!(matches!(session.submit_attempt("ground"), Err(WanipopError::AlreadyGraded)));
        assert!(matches!(session.begin_submission(), Err(WanipopError::InvalidState { .. })));
        assert_eq!(session.queue().len(), 1);
    }

    #[test]
    fn test_empty_batch_stays_loading() {
        let session = session_with(Vec::new());
        assert_eq!(session.state(), SessionState::Loading);
        assert!(session.current_task().is_none());
        assert!(!session.is_exhausted());
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut session = session_with(vec![kanji(2, "fire", "か")]);
        session.submit_attempt("fire").unwrap();
        session.reset();

        assert_eq!(session.state(), SessionState::Loading);
        assert!(session.queue().is_empty());
        assert!(session.ledger().is_empty());
        assert!(session.catalog().is_empty());
        assert_eq!(session.task_state(), TaskState::Presenting);
    }

    #[test]
    fn test_partial_failure_then_retry_merges_by_assignment() {
        let mut session = session_with(vec![radical(1, "ground"), radical(3, "stick")]);
        for answer in ["stick", "ground"] {
            session.submit_attempt(answer).unwrap();
            session.advance().unwrap();
        }

        let payload = session.begin_submission().unwrap();
        let state = session
            .record_results(vec![success(&payload[0]), failure(&payload[1], "timeout")])
            .unwrap();
        assert_eq!(state, SessionState::PartialFailure);

        let retry = session.begin_retry().unwrap();
        assert_eq!(retry, vec![payload[1].clone()]);
        assert!(session.grading_in_progress());

        let state = session.record_results(vec![success(&retry[0])]).unwrap();
        assert_eq!(state, SessionState::Completed);
        assert_eq!(session.results()[0], success(&payload[0]));
        assert_eq!(session.results()[1], success(&payload[1]));
        assert_eq!(session.retry_passes(), 1);
    }

    #[test]
    fn test_missing_response_entries_become_failures() {
        let mut session = session_with(vec![radical(1, "ground"), radical(3, "stick")]);
        for answer in ["stick", "ground"] {
            session.submit_attempt(answer).unwrap();
            session.advance().unwrap();
        }

        let payload = session.begin_submission().unwrap();
        let state = session.record_results(vec![success(&payload[0])]).unwrap();
        assert_eq!(state, SessionState::PartialFailure);
        assert_eq!(session.results().len(), 2);
        assert_eq!(session.results()[1], failure(&payload[1], "no response from endpoint"));

        assert_eq!(session.begin_retry().unwrap(), vec![payload[1].clone()]);
        assert_eq!(session.record_results(Vec::new()).unwrap(), SessionState::PartialFailure);
        assert_eq!(session.unresolved().count(), 1);
    }

    #[test]
    fn test_abandoned_retries_keep_failures_visible() {
        let mut session = session_with(vec![radical(1, "ground")]);
        session.submit_attempt("ground").unwrap();
        session.advance().unwrap();

        let payload = session.begin_submission().unwrap();
        session.record_results(vec![failure(&payload[0], "500")]).unwrap();
        session.abandon_retries().unwrap();

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.unresolved().count(), 1);
        assert_eq!(session.ledger().len(), 1);
    }

    #[test]
    fn test_snapshot_reveals_answers_only_after_grading() {
        let mut session = session_with(vec![kanji(2, "fire", "か")]);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.placeholder.as_deref(), Some("Kanji Meaning"));
        assert_eq!(snapshot.input_mode, Some(InputMode::Romaji));
        assert!(snapshot.expected_answers.is_empty());
        assert_eq!(snapshot.remaining, 2);

        session.submit_attempt("fire").unwrap();
        assert_eq!(session.snapshot().expected_answers, vec!["fire".to_string()]);
    }
}
