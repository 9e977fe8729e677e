//! Negotiation coordinator
//!
//! Drives the peer connection from remote offer to local answer to ICE
//! completion, calling the signaling session at each transition, then
//! consumes peer events on a single control loop until shutdown.
//!
//! ```text
//! Idle -> OfferReceived -> AnswerSent -> (CandidatesSent)* -> Active -> {Closed | Failed}
//! ```

use crate::media::FrameSink;
use crate::peer::{
    IceConnectionState, IceGatheringState, PeerConnectionFacade, PeerConnectionState, PeerEvent,
    SdpType,
};
use crate::signaling::{CandidateDelivery, WhppSession};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferReceived,
    AnswerSent,
    CandidatesSent,
    /// Connected and receiving media; persists until shutdown or failure
    Active,
    Closed,
    Failed,
}

impl NegotiationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationState::Closed | NegotiationState::Failed)
    }
}

/// Runs one viewer negotiation
pub struct NegotiationCoordinator {
    session: WhppSession,
    peer: Arc<dyn PeerConnectionFacade>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    sink: Arc<dyn FrameSink>,
    state: NegotiationState,
    accepting_tracks: bool,
    peer_closed: bool,
    shut_down: bool,
    candidates_sent: u32,
}

impl NegotiationCoordinator {
    pub fn new(
        session: WhppSession,
        peer: Arc<dyn PeerConnectionFacade>,
        events: mpsc::UnboundedReceiver<PeerEvent>,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            session,
            peer,
            events,
            sink,
            state: NegotiationState::Idle,
            accepting_tracks: true,
            peer_closed: false,
            shut_down: false,
            candidates_sent: 0,
        }
    }

    /// Get the current negotiation state
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Number of candidate PATCHes the broadcaster accepted
    pub fn candidates_sent(&self) -> u32 {
        self.candidates_sent
    }

    pub fn session(&self) -> &WhppSession {
        &self.session
    }

    fn transition(&mut self, next: NegotiationState) {
        if self.state != next {
            debug!("Negotiation state transition: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Create the session, answer the remote offer and start the sink.
    ///
    /// Peer events keep being observed while each step is in flight: ICE
    /// gathering that completes before a local description exists is not
    /// trickled, and a `failed` state closes the peer connection at once and
    /// aborts with [`Error::ConnectionFailure`]. Other events are handled after
    /// the answer has been sent.
    ///
    /// Only session creation, local SDP and connection failures are returned;
    /// a rejected answer is logged and negotiation continues.
    #[instrument(skip(self), fields(root_url = %self.session.root_url()))]
    pub async fn negotiate(&mut self) -> Result<()> {
        let peer = Arc::clone(&self.peer);
        let mut backlog = Vec::new();

        let created = match observe(
            self.session.create(),
            &mut self.events,
            peer.as_ref(),
            &mut backlog,
        )
        .await
        {
            Ok(created) => created?,
            Err(source) => return self.abort(source).await,
        };
        self.transition(NegotiationState::OfferReceived);

        match observe(
            peer.set_remote_description(created.offer, SdpType::Offer),
            &mut self.events,
            peer.as_ref(),
            &mut backlog,
        )
        .await
        {
            Ok(result) => result?,
            Err(source) => return self.abort(source).await,
        }

        let answer = match observe(
            peer.create_answer(),
            &mut self.events,
            peer.as_ref(),
            &mut backlog,
        )
        .await
        {
            Ok(answer) => answer?,
            Err(source) => return self.abort(source).await,
        };

        match observe(
            peer.set_local_description(answer),
            &mut self.events,
            peer.as_ref(),
            &mut backlog,
        )
        .await
        {
            Ok(result) => result?,
            Err(source) => return self.abort(source).await,
        }

        let local = peer.local_description().await.ok_or_else(|| {
            Error::SdpError("No local description after setting answer".to_string())
        })?;

        let delivered = match observe(
            self.session.send_answer(&local),
            &mut self.events,
            peer.as_ref(),
            &mut backlog,
        )
        .await
        {
            Ok(delivered) => delivered,
            Err(source) => return self.abort(source).await,
        };
        match delivered {
            Ok(()) => info!("Answer delivered"),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => warn!(error = %e, "Answer delivery failed, continuing"),
        }
        self.transition(NegotiationState::AnswerSent);

        self.sink.start().await?;

        for event in backlog {
            if let Err(e) = self.handle_event(event).await {
                warn!(error = %e, "Failed to handle peer event");
            }
        }

        Ok(())
    }

    /// A failure observed mid-negotiation ends it
    async fn abort(&mut self, source: &str) -> Result<()> {
        self.fail(source).await;
        Err(Error::ConnectionFailure(format!(
            "{} failed during negotiation",
            source
        )))
    }

    /// React to one peer event
    pub async fn handle_event(&mut self, event: PeerEvent) -> Result<()> {
        match event {
            PeerEvent::Track(track) => {
                if !self.accepting_tracks {
                    debug!("Shutting down, dropping track {}", track.id());
                    return Ok(());
                }
                info!(track_id = %track.id(), kind = ?track.kind(), "Track received");
                self.sink.add_track(track).await?;
            }
            PeerEvent::ConnectionState(state) => {
                info!("Connection state is {:?}", state);
                match state {
                    PeerConnectionState::Failed => self.fail("peer connection").await,
                    PeerConnectionState::Connected => self.activate(),
                    _ => {}
                }
            }
            PeerEvent::IceConnectionState(state) => {
                info!("ICE connection state is {:?}", state);
                if state == IceConnectionState::Failed {
                    self.fail("ICE connection").await;
                }
            }
            PeerEvent::IceGatheringState(state) => {
                info!("ICE gathering state is {:?}", state);
                if state == IceGatheringState::Complete {
                    self.deliver_candidates().await;
                }
            }
        }
        Ok(())
    }

    fn activate(&mut self) {
        if matches!(
            self.state,
            NegotiationState::AnswerSent | NegotiationState::CandidatesSent
        ) {
            self.transition(NegotiationState::Active);
        }
    }

    /// Trickle the local description once gathering completes.
    ///
    /// Skipped when gathering finishes before a local description exists.
    async fn deliver_candidates(&mut self) {
        if self.peer_closed {
            return;
        }

        let Some(local) = self.peer.local_description().await else {
            debug!("ICE gathering complete before local description, not sending candidates");
            return;
        };

        match self.session.send_candidates(&local).await {
            Ok(CandidateDelivery::Accepted) => {
                self.candidates_sent += 1;
                if self.state == NegotiationState::AnswerSent {
                    self.transition(NegotiationState::CandidatesSent);
                }
            }
            Ok(CandidateDelivery::Unsupported) => {
                info!("Broadcaster does not support trickle ICE");
            }
            Err(e) => warn!(error = %e, "Candidate delivery failed"),
        }
    }

    /// Terminal failure: close the peer connection, no reconnection
    async fn fail(&mut self, source: &str) {
        if self.state == NegotiationState::Failed {
            return;
        }
        let failure = Error::ConnectionFailure(format!("{} reported failed", source));
        error!(error = %failure, "Closing peer connection");
        self.close_peer().await;
        self.transition(NegotiationState::Failed);
    }

    async fn close_peer(&mut self) {
        if self.peer_closed {
            return;
        }
        self.peer_closed = true;
        if let Err(e) = self.peer.close().await {
            warn!(error = %e, "Failed to close peer connection");
        }
    }

    /// Negotiate, then process peer events until `shutdown` resolves, the
    /// event stream ends, or the connection fails.
    ///
    /// Cleanup always runs. Returns the final state, or the negotiation error.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<NegotiationState>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let negotiated = tokio::select! {
            result = self.negotiate() => Some(result),
            _ = &mut shutdown => None,
        };

        match negotiated {
            None => {
                info!("Shutdown requested during negotiation");
                self.shutdown().await;
                return Ok(self.state);
            }
            Some(Err(e)) => {
                error!(error = %e, "Negotiation failed");
                self.shutdown().await;
                return Err(e);
            }
            Some(Ok(())) => {}
        }

        while self.state != NegotiationState::Failed {
            let event = tokio::select! {
                event = self.events.recv() => event,
                _ = &mut shutdown => {
                    info!("Shutdown signal received, cleaning up...");
                    break;
                }
            };

            match event {
                Some(event) => {
                    if let Err(e) = self.handle_event(event).await {
                        warn!(error = %e, "Failed to handle peer event");
                    }
                }
                None => {
                    debug!("Peer event stream closed");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(self.state)
    }

    /// Stop taking tracks and frames, close the peer connection, destroy the
    /// session, release the sink. Each step runs even if an earlier one failed.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.accepting_tracks = false;
        if let Err(e) = self.sink.stop_intake().await {
            warn!(error = %e, "Failed to stop frame intake");
        }
        self.close_peer().await;
        self.session.destroy().await;
        if let Err(e) = self.sink.stop().await {
            warn!(error = %e, "Failed to stop frame sink");
        }

        if self.state != NegotiationState::Failed {
            self.transition(NegotiationState::Closed);
        }
        info!(state = ?self.state, "Negotiation shut down");
    }
}

/// Drive one negotiation step while watching the peer event channel.
///
/// Returns the step's output, or the source of a `failed` state seen before
/// the step finished (the step is dropped). Events the step cannot act on
/// yet are queued in `backlog`.
async fn observe<T>(
    step: impl Future<Output = T>,
    events: &mut mpsc::UnboundedReceiver<PeerEvent>,
    peer: &dyn PeerConnectionFacade,
    backlog: &mut Vec<PeerEvent>,
) -> std::result::Result<T, &'static str> {
    tokio::pin!(step);
    loop {
        tokio::select! {
            output = &mut step => return Ok(output),
            Some(event) = events.recv() => match event {
                PeerEvent::ConnectionState(PeerConnectionState::Failed) => {
                    return Err("peer connection");
                }
                PeerEvent::IceConnectionState(IceConnectionState::Failed) => {
                    return Err("ICE connection");
                }
                PeerEvent::IceGatheringState(IceGatheringState::Complete) => {
                    if peer.local_description().await.is_some() {
                        backlog.push(event);
                    } else {
                        debug!("ICE gathering complete before local description, not sending candidates");
                    }
                }
                event => backlog.push(event),
            },
        }
    }
}
