//! Remote media tracks

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// Media kind of a remote track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One unit of inbound media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFrame {
    pub kind: TrackKind,
    /// RTP payload
    pub payload: Bytes,
    /// RTP timestamp
    pub timestamp: u32,
    /// RTP sequence number (for packet loss detection)
    pub sequence_number: u16,
}

/// Inbound media track delivered by the peer connection
#[async_trait]
pub trait RemoteTrack: Send + Sync {
    fn id(&self) -> String;

    fn kind(&self) -> TrackKind;

    /// Next frame, or `None` once the track has ended cleanly.
    ///
    /// A read error also ends the track for the reader.
    async fn read_frame(&self) -> Result<Option<MediaFrame>>;
}

/// [`RemoteTrack`] over a webrtc-rs `TrackRemote`
pub struct RtcRemoteTrack {
    track: Arc<TrackRemote>,
    kind: TrackKind,
}

impl RtcRemoteTrack {
    pub fn new(track: Arc<TrackRemote>) -> Self {
        let kind = match track.kind() {
            RTPCodecType::Video => TrackKind::Video,
            _ => TrackKind::Audio,
        };
        Self { track, kind }
    }
}

#[async_trait]
impl RemoteTrack for RtcRemoteTrack {
    fn id(&self) -> String {
        self.track.id()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    async fn read_frame(&self) -> Result<Option<MediaFrame>> {
        match self.track.read_rtp().await {
            Ok((packet, _attributes)) => Ok(Some(MediaFrame {
                kind: self.kind,
                payload: packet.payload,
                timestamp: packet.header.timestamp,
                sequence_number: packet.header.sequence_number,
            })),
            Err(e) => Err(Error::MediaTrackError(format!(
                "Failed to read RTP from track {}: {}",
                self.track.id(),
                e
            ))),
        }
    }
}
