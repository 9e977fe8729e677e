//! Offer/answer/trickle negotiation
//!
//! Bridges the [`WhppSession`](crate::signaling::WhppSession) and a
//! [`PeerConnectionFacade`](crate::peer::PeerConnectionFacade).

pub mod coordinator;

pub use coordinator::{NegotiationCoordinator, NegotiationState};
