pub mod catalog;
pub mod controller;
pub mod evaluator;
pub mod ledger;
pub mod queue;
pub mod session;
pub mod submission;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::SubjectCatalog;
pub use controller::{
    ResetSignal,
    ReviewController,
    ReviewSource,
};
pub use evaluator::evaluate;
pub use ledger::{
    Grade,
    ResultLedger,
    ReviewOutcome,
};
pub use queue::ReviewQueue;
pub use session::{
    Advance,
    ReviewSession,
    SessionSnapshot,
    SessionState,
    TaskState,
};
pub use submission::{
    update_study_results,
    RetryPolicy,
    SubmissionCoordinator,
    SubmissionEndpoint,
    SubmissionReport,
};
