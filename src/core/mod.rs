pub mod errors;
pub mod models;
pub mod script;
pub mod utils;

pub use errors::WanipopError;
pub use models::{
    Dimension,
    InputMode,
    Meaning,
    Reading,
    ReviewSubmission,
    ReviewTask,
    SrsStage,
    SrsTier,
    Subject,
    SubjectType,
    SubmissionOutcome,
    SubmittedReview,
};
pub use script::{
    KanaComparator,
    ScriptComparator,
};
