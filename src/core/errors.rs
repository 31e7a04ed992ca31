use thiserror::Error;

use super::models::Dimension;

#[derive(Error, Debug)]
pub enum WanipopError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("API returned {status} for {url}")]
    Api { status: u16, url: String },

    #[error("No WaniKani API key set")]
    MissingApiKey,

    #[error("No reviews available right now")]
    NoReviewsAvailable,

    #[error("No review task is currently presented")]
    NoCurrentTask,

    #[error("The current task has not been graded yet")]
    NotGraded,

    #[error("The current task has already been graded")]
    AlreadyGraded,

    #[error("Answer attempt is empty")]
    EmptyAttempt,

    #[error("No {dimension} grade recorded for subject {subject_id}")]
    EntryNotFound { subject_id: u64, dimension: Dimension },

    #[error("Subject {subject_id} has a reading task but no readings")]
    MissingReadings { subject_id: u64 },

    #[error("Cannot {operation} while session is {state}")]
    InvalidState { operation: &'static str, state: String },

    #[error("WanipopError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for WanipopError {
    fn from(error: std::io::Error) -> Self {
        WanipopError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for WanipopError {
    fn from(error: reqwest::Error) -> Self {
        WanipopError::Reqwest(Box::new(error))
    }
}
