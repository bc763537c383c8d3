use std::sync::Mutex;

use futures::channel::mpsc::UnboundedSender;

use crate::{
    domain::{ProgressEvent, ProgressPhase},
    engine::RawProgress,
    utils::parse_percent,
};

use super::download_coordinator::JobEvent;

/// Sink for progress events. Called on the engine's thread while a pass runs,
/// so implementations only update state.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub phase: Option<ProgressPhase>,
    pub percent: f32,
}

impl From<ProgressEvent> for ProgressSnapshot {
    fn from(event: ProgressEvent) -> Self {
        Self {
            phase: Some(event.phase),
            percent: event.percent,
        }
    }
}

/// Keeps the latest event for callers that poll.
#[derive(Debug)]
pub struct ProgressTracker {
    state: Mutex<ProgressSnapshot>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            state: Mutex::new(ProgressSnapshot {
                phase: None,
                percent: 0.0,
            }),
        }
    }
}

impl ProgressTracker {
    pub fn snapshot(&self) -> ProgressSnapshot {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl ProgressReporter for ProgressTracker {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut guard) = self.state.lock() {
            *guard = ProgressSnapshot::from(event);
        }
    }
}

/// Forwards events to the UI as `JobEvent::Progress`, skipping repeats of
/// the last event sent.
pub struct ChannelReporter {
    sender: UnboundedSender<JobEvent>,
    latest: ProgressTracker,
}

impl ChannelReporter {
    pub fn new(sender: UnboundedSender<JobEvent>) -> Self {
        Self {
            sender,
            latest: ProgressTracker::default(),
        }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: ProgressEvent) {
        if self.latest.snapshot() == ProgressSnapshot::from(event) {
            return;
        }
        self.latest.report(event);

        // Receiver gone means the UI no longer cares.
        let _ = self.sender.unbounded_send(JobEvent::Progress(event));
    }
}

/// Turns raw engine progress for one pass into canonical events.
///
/// Downloading percentages never go backwards, unparsable ones are dropped,
/// and the engine's per-stream `finished` markers are absorbed: the single
/// terminal event comes from [`PassProgress::finish`].
#[derive(Debug, Default)]
pub struct PassProgress {
    last_percent: f32,
}

impl PassProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, raw: &RawProgress) -> Option<ProgressEvent> {
        if !raw.status.eq_ignore_ascii_case("downloading") {
            return None;
        }

        let percent = parse_percent(&raw.percent)?.max(self.last_percent);
        self.last_percent = percent;
        Some(ProgressEvent::downloading(percent))
    }

    pub fn finish(&mut self) -> ProgressEvent {
        self.last_percent = 100.0;
        ProgressEvent::finished()
    }
}
