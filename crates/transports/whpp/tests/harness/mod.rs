//! Test harness for WHPP viewer integration tests
//!
//! - [`MockBroadcaster`]: in-process axum server playing the broadcaster's
//!   signaling endpoint with scripted statuses, recording every request
//! - [`ScriptedPeer`]: in-memory [`PeerConnectionFacade`] that counts calls
//! - [`ScriptedSink`]: frame sink that releases peer events once started

#![allow(dead_code)]

pub mod broadcaster;
pub mod peer;
pub mod sink;

pub use broadcaster::{BroadcasterScript, LocationMode, MockBroadcaster, RecordedRequest};
pub use peer::ScriptedPeer;
pub use sink::ScriptedSink;

/// Enable logging for a test; repeated calls are ignored
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub const OFFER_SDP: &str = "v=0...offer-sdp";
pub const ANSWER_SDP: &str = "v=0...answer-sdp";
