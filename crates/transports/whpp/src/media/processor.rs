//! Pluggable frame-processing hook

use super::{FrameSlot, MediaFrame};

/// Transforms inbound video frames before they are forwarded.
///
/// A processor may also publish a derived frame to `slot` for an observer
/// such as a re-streaming endpoint.
pub trait FrameProcessor: Send + Sync + 'static {
    fn process(&self, frame: MediaFrame, slot: &FrameSlot) -> MediaFrame;
}

/// Forwards frames unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl FrameProcessor for PassThrough {
    fn process(&self, frame: MediaFrame, _slot: &FrameSlot) -> MediaFrame {
        frame
    }
}

/// Forwards frames unchanged and publishes each one as the latest frame
#[derive(Debug, Default, Clone, Copy)]
pub struct PublishLatest;

impl FrameProcessor for PublishLatest {
    fn process(&self, frame: MediaFrame, slot: &FrameSlot) -> MediaFrame {
        slot.publish(frame.clone());
        frame
    }
}
