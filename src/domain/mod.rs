pub mod error;
pub mod model;

pub use error::{PassExecutionFailure, PlanError};
pub use model::{
    AudioExtraction, AudioMode, DownloadPlan, DownloadRequest, JobOutcome, JobStatus, PassKind,
    PassResult, PassSpec, ProgressEvent, ProgressPhase, QualityTier, SubtitleRequest,
};
