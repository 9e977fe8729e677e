//! Inbound media
//!
//! Remote tracks are handed to a [`FrameSink`]. Sinks that re-publish frames
//! to another task go through the single-slot [`FrameSlot`].

pub mod frame_slot;
pub mod processor;
pub mod sink;
pub mod track;

pub use frame_slot::FrameSlot;
pub use processor::{FrameProcessor, PassThrough, PublishLatest};
pub use sink::{FrameSink, MediaBlackhole, ProcessingSink};
pub use track::{MediaFrame, RemoteTrack, RtcRemoteTrack, TrackKind};
