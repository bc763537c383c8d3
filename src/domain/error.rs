use std::path::PathBuf;

use thiserror::Error;

use super::model::PassKind;

/// Reasons a request is rejected before any download starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Please enter a video URL")]
    EmptyUrl,

    #[error("Invalid save location: {}", .0.display())]
    InvalidDestination(PathBuf),

    #[error("ffmpeg is not installed or not in PATH. Video and audio merging will fail.")]
    MergeToolUnavailable,
}

/// The engine raised an error mid-download. `message` is the engine's own text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} download failed: {message}")]
pub struct PassExecutionFailure {
    pub kind: PassKind,
    pub message: String,
}
