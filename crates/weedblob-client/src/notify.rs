use std::sync::Mutex;

/// A committed change to the blob set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobEvent {
    /// A blob was stored under `key`.
    Stored { key: String, size: u64 },
    /// The blob under `key` was removed.
    Removed { key: String },
}

/// Receives blob change notifications from the host framework.
///
/// Called synchronously after the index commit of a successful Put or
/// Delete, never for a failed or rolled-back operation.
pub trait BlobHub: Send + Sync {
    fn notify(&self, event: &BlobEvent);
}

/// Hub that ignores every event.
pub struct NoOpHub;

impl BlobHub for NoOpHub {
    fn notify(&self, _event: &BlobEvent) {}
}

/// Hub that records every event it receives.
///
/// Meant for tests and for embedders that want to inspect changes after the
/// fact. Events accumulate without bound; production hosts should supply
/// their own [`BlobHub`].
#[derive(Debug, Default)]
pub struct RecordingHub {
    events: Mutex<Vec<BlobEvent>>,
}

impl RecordingHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<BlobEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl BlobHub for RecordingHub {
    fn notify(&self, event: &BlobEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
