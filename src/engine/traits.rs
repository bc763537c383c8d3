use thiserror::Error;

use super::models::{EngineInvocation, EngineReport, RawProgress};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Failed to start {binary}: {message}")]
    Spawn { binary: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    /// Non-zero exit; `message` is the engine's last error line, untouched.
    #[error("{message}")]
    Failed { code: Option<i32>, message: String },

    #[error("Engine finished without reporting the downloaded file")]
    MissingReport,

    #[error("Invalid engine report: {0}")]
    MalformedReport(String),
}

/// External extraction/download engine.
///
/// `run` blocks until the pass is done. `on_progress` is called on the
/// calling thread while it runs.
pub trait MediaEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    fn run(
        &self,
        invocation: &EngineInvocation,
        on_progress: &mut dyn FnMut(RawProgress),
    ) -> Result<EngineReport, EngineError>;
}
