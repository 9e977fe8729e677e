//! webrtc-rs backed peer connection

use super::{
    IceConnectionState, IceGatheringState, PeerConnectionFacade, PeerConnectionState, PeerEvent,
    SdpType,
};
use crate::config::WhppViewerConfig;
use crate::media::{RemoteTrack, RtcRemoteTrack};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection as WebRTCPeerConnection;

/// Receiving peer connection
///
/// Every engine callback is forwarded as a [`PeerEvent`] on the channel
/// returned by [`RtcPeerConnection::new`].
pub struct RtcPeerConnection {
    /// Unique identifier for this connection instance
    connection_id: String,

    peer_connection: Arc<WebRTCPeerConnection>,
}

impl RtcPeerConnection {
    /// Create a peer connection using the ICE servers from `config`
    #[instrument(skip(config))]
    pub async fn new(
        config: &WhppViewerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PeerEvent>)> {
        let connection_id = uuid::Uuid::new_v4().to_string();

        info!("Creating peer connection: connection_id={}", connection_id);

        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::WebRtcError(format!("Failed to register codecs: {}", e)))?;

        let interceptor_registry =
            register_default_interceptors(Default::default(), &mut media_engine).map_err(|e| {
                Error::WebRtcError(format!("Failed to register interceptors: {}", e))
            })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers(config),
            ..Default::default()
        };

        let peer_connection =
            Arc::new(api.new_peer_connection(rtc_config).await.map_err(|e| {
                Error::WebRtcError(format!("Failed to create peer connection: {}", e))
            })?);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        forward_events(&peer_connection, events_tx);

        Ok((
            Self {
                connection_id,
                peer_connection,
            },
            events_rx,
        ))
    }

    /// Get the connection ID
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }
}

/// STUN servers first, then TURN servers with credentials
fn ice_servers(config: &WhppViewerConfig) -> Vec<RTCIceServer> {
    config
        .stun_servers
        .iter()
        .map(|url| RTCIceServer {
            urls: vec![url.clone()],
            ..Default::default()
        })
        .chain(config.turn_servers.iter().map(|turn| RTCIceServer {
            urls: vec![turn.url.clone()],
            username: turn.username.clone(),
            credential: turn.credential.clone(),
            ..Default::default()
        }))
        .collect()
}

/// Register engine callbacks that push onto `events`.
///
/// A closed receiver just drops the event.
fn forward_events(
    peer_connection: &Arc<WebRTCPeerConnection>,
    events: mpsc::UnboundedSender<PeerEvent>,
) {
    let tx = events.clone();
    peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
        let remote: Arc<dyn RemoteTrack> = Arc::new(RtcRemoteTrack::new(track));
        info!(track_id = %remote.id(), kind = ?remote.kind(), "Receiving track");
        let _ = tx.send(PeerEvent::Track(remote));
        Box::pin(async {})
    }));

    let tx = events.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            if let Some(state) = PeerConnectionState::from_rtc(s) {
                let _ = tx.send(PeerEvent::ConnectionState(state));
            }
            Box::pin(async {})
        },
    ));

    let tx = events.clone();
    peer_connection.on_ice_connection_state_change(Box::new(
        move |s: RTCIceConnectionState| {
            if let Some(state) = IceConnectionState::from_rtc(s) {
                let _ = tx.send(PeerEvent::IceConnectionState(state));
            }
            Box::pin(async {})
        },
    ));

    let tx = events;
    peer_connection.on_ice_gathering_state_change(Box::new(move |s: RTCIceGathererState| {
        if let Some(state) = IceGatheringState::from_rtc(s) {
            let _ = tx.send(PeerEvent::IceGatheringState(state));
        }
        Box::pin(async {})
    }));
}

#[async_trait]
impl PeerConnectionFacade for RtcPeerConnection {
    async fn set_remote_description(&self, sdp: String, sdp_type: SdpType) -> Result<()> {
        debug!(
            "Setting remote {:?} for connection {}",
            sdp_type, self.connection_id
        );

        let description = match sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(sdp),
            SdpType::Answer => RTCSessionDescription::answer(sdp),
        }
        .map_err(|e| Error::SdpError(format!("Failed to parse remote description: {}", e)))?;

        self.peer_connection
            .set_remote_description(description)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set remote description: {}", e)))
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to create answer: {}", e)))?;

        Ok(answer.sdp)
    }

    async fn set_local_description(&self, sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp)
            .map_err(|e| Error::SdpError(format!("Failed to parse answer: {}", e)))?;

        self.peer_connection
            .set_local_description(answer)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set local description: {}", e)))
    }

    async fn local_description(&self) -> Option<String> {
        self.peer_connection
            .local_description()
            .await
            .map(|desc| desc.sdp)
    }

    async fn close(&self) -> Result<()> {
        info!("Closing peer connection {}", self.connection_id);

        self.peer_connection.close().await.map_err(|e| {
            Error::PeerConnectionError(format!("Failed to close connection: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TurnServerConfig;

    #[test]
    fn test_ice_servers_from_config() {
        let config = WhppViewerConfig::default().with_turn_servers(vec![TurnServerConfig {
            url: "turn:turn.example.com:3478".to_string(),
            username: "user".to_string(),
            credential: "pass".to_string(),
        }]);

        let servers = ice_servers(&config);
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].urls, vec!["stun:stun.l.google.com:19302"]);
        assert_eq!(servers[1].username, "user");
        assert_eq!(servers[1].credential, "pass");
    }

    #[tokio::test]
    async fn test_new_connection_has_no_local_description() {
        let (pc, _events) = RtcPeerConnection::new(&WhppViewerConfig::default())
            .await
            .unwrap();
        assert!(pc.local_description().await.is_none());
        assert!(!pc.connection_id().is_empty());
        pc.close().await.unwrap();
    }
}
