//! Single-slot latest-frame buffer
//!
//! Shared between the frame-processing path (writer) and a presentation task
//! (reader). A publish replaces the whole frame under the lock; readers get an
//! `Arc` to a complete frame and never see a partial write.

use super::MediaFrame;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct SlotState {
    frame: Option<Arc<MediaFrame>>,
    version: u64,
    closed: bool,
}

/// Latest-frame slot with replace, don't queue semantics
#[derive(Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame. Returns `false` once the slot is closed.
    pub fn publish(&self, frame: MediaFrame) -> bool {
        let frame = Arc::new(frame);
        let previous = {
            let mut state = self.inner.lock();
            if state.closed {
                return false;
            }
            state.version += 1;
            state.frame.replace(frame)
        };
        drop(previous);
        true
    }

    /// Most recently published frame
    pub fn latest(&self) -> Option<Arc<MediaFrame>> {
        self.inner.lock().frame.clone()
    }

    /// Number of frames published so far
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// Stop accepting frames; the last frame stays readable
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
