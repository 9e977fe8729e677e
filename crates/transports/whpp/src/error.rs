//! Error types for the WHPP viewer

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for signaling session operations
pub type SignalingResult<T> = std::result::Result<T, SignalingError>;

/// Errors raised by the HTTP signaling session
#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    /// Session creation did not return 201 Created
    #[error("Unexpected status on session create: {status}")]
    UnexpectedStatus { status: u16 },

    /// The broadcaster refused the SDP answer
    #[error("Answer rejected with status {status}")]
    AnswerRejected { status: u16 },

    /// The broadcaster refused the trickled candidates
    #[error("Candidates rejected with status {status}")]
    CandidateRejected { status: u16 },

    /// Answer or candidates sent before a session was created
    #[error("Signaling session not created")]
    NotCreated,

    /// `create` called while a session resource is still held
    #[error("Signaling session already created at {session_url}")]
    AlreadyCreated { session_url: String },

    /// The HTTP client was already released by `destroy`
    #[error("Signaling session already destroyed")]
    Destroyed,

    /// The create response was missing a field or header
    #[error("Invalid signaling response: {0}")]
    InvalidResponse(String),

    /// Request body could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SignalingError {
    /// Whether this error must abort the viewer run.
    ///
    /// Rejected answers/candidates and transport hiccups during delivery are
    /// reported and the negotiation carries on over whatever ICE state exists.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SignalingError::UnexpectedStatus { .. }
                | SignalingError::NotCreated
                | SignalingError::AlreadyCreated { .. }
                | SignalingError::Destroyed
                | SignalingError::InvalidResponse(_)
        )
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SignalingError::UnexpectedStatus { status }
            | SignalingError::AnswerRejected { status }
            | SignalingError::CandidateRejected { status } => Some(*status),
            SignalingError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors that can occur while viewing a WHPP stream
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Signaling session error
    #[error("Signaling error: {0}")]
    Signaling(#[from] SignalingError),

    /// Peer connection or ICE connection reported `failed`
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// SDP negotiation error
    #[error("SDP negotiation error: {0}")]
    SdpError(String),

    /// WebRTC peer connection error
    #[error("Peer connection error: {0}")]
    PeerConnectionError(String),

    /// WebRTC library error
    #[error("WebRTC error: {0}")]
    WebRtcError(String),

    /// Media track error
    #[error("Media track error: {0}")]
    MediaTrackError(String),

}

impl Error {
    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Check if this error came from the signaling session
    pub fn is_signaling_error(&self) -> bool {
        matches!(self, Error::Signaling(_))
    }

    /// Check if this error is a peer-related error
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailure(_)
                | Error::PeerConnectionError(_)
                | Error::SdpError(_)
                | Error::WebRtcError(_)
        )
    }
}
