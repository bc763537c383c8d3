pub mod download_coordinator;
pub mod orchestrator;
pub mod plan_builder;
pub mod progress;
pub mod reconciler;

pub use download_coordinator::{DownloadCoordinator, JobEvent};
