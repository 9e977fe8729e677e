//! WHPP message bodies
//!
//! | Step      | Method | Target      | Body                      | Success    |
//! |-----------|--------|-------------|---------------------------|------------|
//! | create    | POST   | root URL    | `{}`                      | 201        |
//! | answer    | PUT    | session URL | `{"answer": <sdp>}`       | 204        |
//! | candidate | PATCH  | session URL | `{"candidate": <sdp>}`    | 204 or 405 |
//! | release   | DELETE | session URL | none                      | 2xx        |

use serde::{Deserialize, Serialize};

/// Content type for answer and candidate updates
pub const WHPP_CONTENT_TYPE: &str = "application/whpp+json";

/// Body of the session-create POST
#[derive(Debug, Default, Serialize)]
pub struct CreateRequest {}

/// Body returned with 201 Created
#[derive(Debug, Deserialize)]
pub struct CreateResponse {
    /// Remote SDP offer, passed through verbatim
    pub offer: String,
}

/// Body of the answer PUT
#[derive(Debug, Serialize)]
pub struct AnswerRequest<'a> {
    pub answer: &'a str,
}

/// Body of the candidate PATCH
#[derive(Debug, Serialize)]
pub struct CandidateRequest<'a> {
    pub candidate: &'a str,
}
