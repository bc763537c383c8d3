pub mod client;
pub mod models;
pub mod probe;
pub mod traits;

pub use client::YtDlpEngine;
pub use models::{EngineInvocation, EngineReport, RawProgress};
pub use probe::Capabilities;
pub use traits::{EngineError, MediaEngine};
