//! Connection lifecycle observations pushed by the peer connection

use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

/// Peer connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// ICE connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Failed,
    Disconnected,
    Closed,
}

/// ICE gathering state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceGatheringState {
    New,
    Gathering,
    Complete,
}

impl PeerConnectionState {
    /// Map the engine state; `Unspecified` has no counterpart
    pub fn from_rtc(state: RTCPeerConnectionState) -> Option<Self> {
        match state {
            RTCPeerConnectionState::New => Some(Self::New),
            RTCPeerConnectionState::Connecting => Some(Self::Connecting),
            RTCPeerConnectionState::Connected => Some(Self::Connected),
            RTCPeerConnectionState::Disconnected => Some(Self::Disconnected),
            RTCPeerConnectionState::Failed => Some(Self::Failed),
            RTCPeerConnectionState::Closed => Some(Self::Closed),
            RTCPeerConnectionState::Unspecified => None,
        }
    }
}

impl IceConnectionState {
    pub fn from_rtc(state: RTCIceConnectionState) -> Option<Self> {
        match state {
            RTCIceConnectionState::New => Some(Self::New),
            RTCIceConnectionState::Checking => Some(Self::Checking),
            RTCIceConnectionState::Connected => Some(Self::Connected),
            RTCIceConnectionState::Completed => Some(Self::Completed),
            RTCIceConnectionState::Failed => Some(Self::Failed),
            RTCIceConnectionState::Disconnected => Some(Self::Disconnected),
            RTCIceConnectionState::Closed => Some(Self::Closed),
            RTCIceConnectionState::Unspecified => None,
        }
    }
}

impl IceGatheringState {
    /// The gatherer's `Closed` is reported through the connection states instead
    pub fn from_rtc(state: RTCIceGathererState) -> Option<Self> {
        match state {
            RTCIceGathererState::New => Some(Self::New),
            RTCIceGathererState::Gathering => Some(Self::Gathering),
            RTCIceGathererState::Complete => Some(Self::Complete),
            RTCIceGathererState::Closed | RTCIceGathererState::Unspecified => None,
        }
    }
}
