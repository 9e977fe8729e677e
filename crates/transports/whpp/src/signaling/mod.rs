//! WHPP signaling
//!
//! HTTP exchange that creates, updates and releases the broadcaster-side
//! session resource for one viewer.

pub mod protocol;
pub mod session;

pub use protocol::WHPP_CONTENT_TYPE;
pub use session::{CandidateDelivery, CreatedSession, WhppSession};
