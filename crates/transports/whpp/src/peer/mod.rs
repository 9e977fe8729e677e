//! Peer connection seam
//!
//! The coordinator drives a [`PeerConnectionFacade`] and consumes its
//! lifecycle as [`PeerEvent`]s from a channel. [`RtcPeerConnection`] is the
//! webrtc-rs backed implementation.

pub mod connection;
pub mod state;

use crate::media::RemoteTrack;
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub use connection::RtcPeerConnection;
pub use state::{IceConnectionState, IceGatheringState, PeerConnectionState};

/// SDP description type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

/// Event pushed by the peer connection
#[derive(Clone)]
pub enum PeerEvent {
    /// A remote media track arrived
    Track(Arc<dyn RemoteTrack>),
    ConnectionState(PeerConnectionState),
    IceConnectionState(IceConnectionState),
    IceGatheringState(IceGatheringState),
}

impl fmt::Debug for PeerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerEvent::Track(track) => f
                .debug_struct("Track")
                .field("id", &track.id())
                .field("kind", &track.kind())
                .finish(),
            PeerEvent::ConnectionState(s) => f.debug_tuple("ConnectionState").field(s).finish(),
            PeerEvent::IceConnectionState(s) => {
                f.debug_tuple("IceConnectionState").field(s).finish()
            }
            PeerEvent::IceGatheringState(s) => f.debug_tuple("IceGatheringState").field(s).finish(),
        }
    }
}

/// Description negotiation on an underlying WebRTC engine.
///
/// SDP is passed through as opaque strings.
#[async_trait]
pub trait PeerConnectionFacade: Send + Sync {
    async fn set_remote_description(&self, sdp: String, sdp_type: SdpType) -> Result<()>;

    /// Generate a local answer to the current remote offer
    async fn create_answer(&self) -> Result<String>;

    async fn set_local_description(&self, sdp: String) -> Result<()>;

    /// Current local description, including any gathered candidates
    async fn local_description(&self) -> Option<String>;

    async fn close(&self) -> Result<()>;
}
