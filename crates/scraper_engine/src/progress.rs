use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;
use url::Url;

use crate::types::LinkStatus;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Aggregate view over a job's links at one point in time.
///
/// Invariant at every emitted event:
/// `processed = successful + skipped + failed <= total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub processed: u32,
    pub total: u32,
    pub current_url: String,
    pub successful: u32,
    pub skipped: u32,
    pub failed: u32,
    pub cancelled: u32,
}

/// One entry in a job's append-only progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Update(ProgressSnapshot),
    Complete(ProgressSnapshot),
}

impl ProgressEvent {
    pub fn snapshot(&self) -> &ProgressSnapshot {
        match self {
            ProgressEvent::Update(s) | ProgressEvent::Complete(s) => s,
        }
    }
}

/// Job-scoped state machine turning link transitions into a live event
/// stream. Observers only ever read; counters move forward only.
pub struct ProgressTracker {
    state: Mutex<ProgressSnapshot>,
    events: broadcast::Sender<ProgressEvent>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(ProgressSnapshot::default()),
            events,
        }
    }

    /// Subscribes to the live stream. Events sent before the call are not
    /// replayed; pair with [`ProgressTracker::snapshot`] to catch up.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().expect("progress lock").clone()
    }

    /// Fixes the denominator once discovery finishes. Called before any
    /// link transition.
    pub fn set_total(&self, total: u32) {
        let mut state = self.state.lock().expect("progress lock");
        state.total = total;
        let _ = self.events.send(ProgressEvent::Update(state.clone()));
    }

    pub(crate) fn link_started(&self, url: &Url) {
        let mut state = self.state.lock().expect("progress lock");
        state.current_url = url.to_string();
        let _ = self.events.send(ProgressEvent::Update(state.clone()));
    }

    /// Records a terminal transition. Counter bumps and the matching event
    /// go out under one lock, so observers see `processed` move
    /// monotonically no matter how completions interleave.
    pub(crate) fn link_finished(&self, status: LinkStatus) {
        let mut state = self.state.lock().expect("progress lock");
        match status {
            LinkStatus::Succeeded => {
                state.successful += 1;
                state.processed += 1;
            }
            LinkStatus::Skipped => {
                state.skipped += 1;
                state.processed += 1;
            }
            LinkStatus::Failed => {
                state.failed += 1;
                state.processed += 1;
            }
            LinkStatus::Cancelled => {
                state.cancelled += 1;
            }
            LinkStatus::Pending | LinkStatus::Fetching => {
                debug_assert!(false, "link_finished called with non-terminal status");
                return;
            }
        }
        debug_assert_eq!(
            state.processed,
            state.successful + state.skipped + state.failed
        );
        debug_assert!(state.processed <= state.total);
        let _ = self.events.send(ProgressEvent::Update(state.clone()));
    }

    /// Emits the final completion marker. Called exactly once per job.
    pub(crate) fn complete(&self) {
        let state = self.state.lock().expect("progress lock");
        let _ = self.events.send(ProgressEvent::Complete(state.clone()));
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
