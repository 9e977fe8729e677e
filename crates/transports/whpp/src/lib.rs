//! WHPP viewer for RemoteMedia
//!
//! Negotiates a receive-only WebRTC session with a broadcaster over the WHPP
//! HTTP signaling exchange and consumes the resulting audio/video tracks.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  Broadcaster channel (HTTP + WebRTC)                   │
//! │  ↑ POST create / PUT answer / PATCH candidates         │
//! │  WhppSession (owns HTTP client + session URL)          │
//! │  ↑                                                     │
//! │  NegotiationCoordinator (single control loop)          │
//! │  ├─ PeerConnectionFacade (webrtc-rs)                   │
//! │  │   └─ PeerEvent channel (tracks, state changes)      │
//! │  └─ FrameSink (blackhole / processing)                 │
//! │      └─ FrameSlot (latest frame for observers)         │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use whpp_viewer::WhppViewerConfig;
//!
//! let config = WhppViewerConfig::new("https://broadcaster.example.com/channel/demo")
//!     .with_media_timeout(600);
//!
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Async Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use whpp_viewer::{
//!     MediaBlackhole, NegotiationCoordinator, RtcPeerConnection, WhppSession, WhppViewerConfig,
//! };
//!
//! # async fn example() -> whpp_viewer::Result<()> {
//! let config = WhppViewerConfig::default();
//! let session = WhppSession::from_config(&config)?;
//! let (peer, events) = RtcPeerConnection::new(&config).await?;
//!
//! let mut coordinator =
//!     NegotiationCoordinator::new(session, Arc::new(peer), events, Arc::new(MediaBlackhole::new()));
//! let state = coordinator.run(tokio::time::sleep(std::time::Duration::from_secs(600))).await?;
//! println!("finished in {:?}", state);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod media;
pub mod negotiation;
pub mod peer;
pub mod signaling;

pub use config::{TurnServerConfig, WhppViewerConfig};
pub use error::{Error, Result, SignalingError, SignalingResult};
pub use media::{
    FrameProcessor, FrameSink, FrameSlot, MediaBlackhole, MediaFrame, ProcessingSink,
    PublishLatest, RemoteTrack, TrackKind,
};
pub use negotiation::{NegotiationCoordinator, NegotiationState};
pub use peer::{
    IceConnectionState, IceGatheringState, PeerConnectionFacade, PeerConnectionState, PeerEvent,
    RtcPeerConnection, SdpType,
};
pub use signaling::{CandidateDelivery, CreatedSession, WhppSession};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
