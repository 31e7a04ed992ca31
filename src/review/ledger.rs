use std::collections::{
    BTreeMap,
    HashSet,
};

use tracing::{
    debug,
    info,
};

use crate::core::{
    Dimension,
    ReviewSubmission,
    ReviewTask,
    WanipopError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grade {
    Correct,
    Incorrect,
    #[default]
    Unset,
}

impl Grade {
    fn from_correct(correct: bool) -> Self {
        if correct {
            Grade::Correct
        } else {
            Grade::Incorrect
        }
    }

    /// 0 only for an exact `Correct`, so unset dimensions count as a miss
    pub fn incorrect_flag(&self) -> u8 {
        match self {
            Grade::Correct => 0,
            Grade::Incorrect | Grade::Unset => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub subject_id: u64,
    pub assignment_id: u64,
    pub characters: Option<String>,
    pub meaning: Grade,
    pub reading: Grade,
    pub meaning_attempt: Option<String>,
    pub reading_attempt: Option<String>,
}

impl ReviewOutcome {
    fn new(task: &ReviewTask) -> Self {
        Self {
            subject_id: task.subject.subject_id,
            assignment_id: task.subject.assignment_id,
            characters: task.subject.characters.clone(),
            meaning: Grade::Unset,
            reading: Grade::Unset,
            meaning_attempt: None,
            reading_attempt: None,
        }
    }

    pub fn grade(&self, dimension: Dimension) -> Grade {
        match dimension {
            Dimension::Meaning => self.meaning,
            Dimension::Reading => self.reading,
        }
    }

    fn grade_mut(&mut self, dimension: Dimension) -> &mut Grade {
        match dimension {
            Dimension::Meaning => &mut self.meaning,
            Dimension::Reading => &mut self.reading,
        }
    }

    pub fn attempt(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Meaning => self.meaning_attempt.as_deref(),
            Dimension::Reading => self.reading_attempt.as_deref(),
        }
    }

    fn set_attempt(&mut self, dimension: Dimension, attempt: &str) {
        let slot = match dimension {
            Dimension::Meaning => &mut self.meaning_attempt,
            Dimension::Reading => &mut self.reading_attempt,
        };
        *slot = Some(attempt.to_string());
    }

    pub fn to_submission(&self) -> ReviewSubmission {
        ReviewSubmission {
            assignment_id: self.assignment_id,
            incorrect_meaning_answers: self.meaning.incorrect_flag(),
            incorrect_reading_answers: self.reading.incorrect_flag(),
            created_at: None,
        }
    }
}

/// First-attempt grades per subject, keyed by subject id
#[derive(Debug, Default, Clone)]
pub struct ResultLedger {
    entries: BTreeMap<u64, ReviewOutcome>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the grade only if this dimension has none yet; the attempt text
    /// is always kept as the latest one. Returns the grade now on record.
    pub fn record(&mut self, task: &ReviewTask, correct: bool, attempt: &str) -> Grade {
        let entry =
            self.entries.entry(task.subject_id()).or_insert_with(|| ReviewOutcome::new(task));

        let grade = entry.grade_mut(task.dimension);
        if *grade == Grade::Unset {
            *grade = Grade::from_correct(correct);
            debug!("Recorded {:?} {} for subject {}", grade, task.dimension, task.subject_id());
        } else {
            debug!(
                "Subject {} already graded {:?} on {}, keeping first grade",
                task.subject_id(),
                grade,
                task.dimension
            );
        }
        let grade = *grade;

        entry.set_attempt(task.dimension, attempt);
        grade
    }

    pub fn flip(&mut self, subject_id: u64, dimension: Dimension) -> Result<Grade, WanipopError> {
        let grade = self
            .entries
            .get_mut(&subject_id)
            .map(|entry| entry.grade_mut(dimension))
            .filter(|grade| **grade != Grade::Unset)
            .ok_or(WanipopError::EntryNotFound { subject_id, dimension })?;

        *grade = match *grade {
            Grade::Correct => Grade::Incorrect,
            _ => Grade::Correct,
        };
        info!("Flipped {} of subject {} to {:?}", dimension, subject_id, grade);
        Ok(*grade)
    }

    pub fn get(&self, subject_id: u64) -> Option<&ReviewOutcome> {
        self.entries.get(&subject_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewOutcome> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_submission_payload(&self) -> Vec<ReviewSubmission> {
        self.entries.values().map(ReviewOutcome::to_submission).collect()
    }

    pub fn payload_for(&self, assignment_ids: &HashSet<u64>) -> Vec<ReviewSubmission> {
        self.entries
            .values()
            .filter(|entry| assignment_ids.contains(&entry.assignment_id))
            .map(ReviewOutcome::to_submission)
            .collect()
    }
}
