//! WHPP signaling session
//!
//! Owns the HTTP client and the session resource URL for one viewer. The
//! session URL is only known after a successful `create`; every later update
//! targets it, never the root URL.

use super::protocol::{
    AnswerRequest, CandidateRequest, CreateRequest, CreateResponse, WHPP_CONTENT_TYPE,
};
use crate::config::WhppViewerConfig;
use crate::error::{Error, Result, SignalingError, SignalingResult};
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Offer and resource location returned by a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    /// Remote SDP offer, unchanged
    pub offer: String,
    /// Session resource URL from the `Location` header
    pub session_url: String,
}

/// Outcome of a candidate PATCH that the broadcaster did not reject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDelivery {
    /// 204 No Content
    Accepted,
    /// 405 Method Not Allowed: the broadcaster does not take trickled candidates
    Unsupported,
}

/// HTTP signaling session against a WHPP broadcaster channel
pub struct WhppSession {
    root_url: Url,

    /// Set only after `create` succeeds
    session_url: Option<String>,

    /// Remote offer from the last successful `create`
    offer: Option<String>,

    /// `None` once `destroy` has released it
    http: Option<reqwest::Client>,

    auth_token: Option<String>,
}

impl WhppSession {
    /// Create a session for `root_url` with default request settings
    pub fn new(root_url: &str) -> Result<Self> {
        Self::with_options(root_url, Duration::from_secs(10), None)
    }

    /// Create a session from viewer configuration
    pub fn from_config(config: &WhppViewerConfig) -> Result<Self> {
        Self::with_options(
            &config.endpoint_url,
            config.request_timeout(),
            config.auth_token.clone(),
        )
    }

    fn with_options(
        root_url: &str,
        timeout: Duration,
        auth_token: Option<String>,
    ) -> Result<Self> {
        let root_url = Url::parse(root_url)
            .map_err(|e| Error::InvalidConfig(format!("Invalid signaling URL {}: {}", root_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SignalingError::Http)?;

        Ok(Self {
            root_url,
            session_url: None,
            offer: None,
            http: Some(http),
            auth_token,
        })
    }

    /// Signaling root URL
    pub fn root_url(&self) -> &str {
        self.root_url.as_str()
    }

    /// Session resource URL, once created
    pub fn session_url(&self) -> Option<&str> {
        self.session_url.as_deref()
    }

    /// Remote offer, once created
    pub fn offer(&self) -> Option<&str> {
        self.offer.as_deref()
    }

    /// Whether `create` has succeeded and the session is still held
    pub fn is_created(&self) -> bool {
        self.session_url.is_some()
    }

    /// Whether the HTTP client has been released
    pub fn is_destroyed(&self) -> bool {
        self.http.is_none()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Client and session URL for update calls
    fn established(&self) -> SignalingResult<(&reqwest::Client, &str)> {
        let url = self.session_url.as_deref().ok_or(SignalingError::NotCreated)?;
        let http = self.http.as_ref().ok_or(SignalingError::Destroyed)?;
        Ok((http, url))
    }

    /// POST an empty JSON object to the root URL and take the offer.
    ///
    /// Only 201 Created is accepted. On any failure the session URL stays
    /// unset. A held session resource must be destroyed first; a second
    /// `create` fails with [`SignalingError::AlreadyCreated`] without a request.
    #[instrument(skip(self), fields(root_url = %self.root_url))]
    pub async fn create(&mut self) -> SignalingResult<CreatedSession> {
        let http = self.http.as_ref().ok_or(SignalingError::Destroyed)?;
        if let Some(session_url) = &self.session_url {
            return Err(SignalingError::AlreadyCreated {
                session_url: session_url.clone(),
            });
        }

        let response = self
            .authorize(http.post(self.root_url.clone()).json(&CreateRequest::default()))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(SignalingError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let session_url = resolve_location(&self.root_url, response.headers())?;

        let body: CreateResponse = response.json().await.map_err(|e| {
            SignalingError::InvalidResponse(format!("Failed to parse create response: {}", e))
        })?;

        info!(session_url = %session_url, "Signaling session created");

        self.offer = Some(body.offer.clone());
        self.session_url = Some(session_url.clone());

        Ok(CreatedSession {
            offer: body.offer,
            session_url,
        })
    }

    /// PUT the local SDP answer to the session URL.
    ///
    /// Any status other than 204 yields [`SignalingError::AnswerRejected`].
    #[instrument(skip(self, answer), fields(session_url = ?self.session_url))]
    pub async fn send_answer(&self, answer: &str) -> SignalingResult<()> {
        let (http, url) = self.established()?;
        let body = serde_json::to_string(&AnswerRequest { answer })?;

        let response = self
            .authorize(http.put(url).header(CONTENT_TYPE, WHPP_CONTENT_TYPE).body(body))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                debug!("Answer accepted");
                Ok(())
            }
            status => Err(SignalingError::AnswerRejected {
                status: status.as_u16(),
            }),
        }
    }

    /// PATCH trickled candidates (carried as SDP) to the session URL.
    ///
    /// 204 and 405 both succeed; anything else yields
    /// [`SignalingError::CandidateRejected`].
    #[instrument(skip(self, candidates), fields(session_url = ?self.session_url))]
    pub async fn send_candidates(&self, candidates: &str) -> SignalingResult<CandidateDelivery> {
        let (http, url) = self.established()?;
        let body = serde_json::to_string(&CandidateRequest {
            candidate: candidates,
        })?;

        let response = self
            .authorize(http.patch(url).header(CONTENT_TYPE, WHPP_CONTENT_TYPE).body(body))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                debug!("Candidates accepted");
                Ok(CandidateDelivery::Accepted)
            }
            StatusCode::METHOD_NOT_ALLOWED => {
                debug!("Broadcaster does not support trickle ICE");
                Ok(CandidateDelivery::Unsupported)
            }
            status => Err(SignalingError::CandidateRejected {
                status: status.as_u16(),
            }),
        }
    }

    /// Release the session resource and the HTTP client.
    ///
    /// A held session resource is DELETEd best-effort; failures are logged.
    /// Calling this again is a no-op.
    #[instrument(skip(self), fields(session_url = ?self.session_url))]
    pub async fn destroy(&mut self) {
        let Some(http) = self.http.take() else {
            debug!("Signaling session already destroyed");
            return;
        };

        if let Some(url) = self.session_url.take() {
            match self.authorize(http.delete(&url)).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Session resource released");
                }
                Ok(response) => {
                    warn!(status = response.status().as_u16(), "Session release refused");
                }
                Err(e) => {
                    warn!(error = %e, "Session release failed");
                }
            }
        }

        drop(http);
        info!("Signaling session destroyed");
    }
}

/// Read `Location`, resolving a relative reference against the root URL.
///
/// Only absolute http(s) URLs with a host are kept exactly as sent.
fn resolve_location(root_url: &Url, headers: &HeaderMap) -> SignalingResult<String> {
    let raw = headers
        .get(LOCATION)
        .ok_or_else(|| SignalingError::InvalidResponse("Missing Location header".to_string()))?
        .to_str()
        .map_err(|e| SignalingError::InvalidResponse(format!("Invalid Location header: {}", e)))?;

    let resolved = match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            return Ok(raw.to_string());
        }
        // `host:8080/x` parses with scheme `host`; read it as a path instead
        Ok(_) => root_url.join(&format!("./{}", raw)),
        Err(_) => root_url.join(raw),
    };

    resolved
        .map(String::from)
        .map_err(|e| SignalingError::InvalidResponse(format!("Invalid Location {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with_location(location: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_str(location).unwrap());
        headers
    }

    #[test]
    fn test_absolute_location_kept_verbatim() {
        let root = Url::parse("https://host/broadcaster/channel/sthlm").unwrap();
        let headers = headers_with_location("https://host/session/abc");
        assert_eq!(
            resolve_location(&root, &headers).unwrap(),
            "https://host/session/abc"
        );
    }

    #[test]
    fn test_relative_location_resolved_against_root() {
        let root = Url::parse("https://host:8443/broadcaster/channel/sthlm").unwrap();
        let headers = headers_with_location("/broadcaster/channel/sthlm/viewer-1");
        assert_eq!(
            resolve_location(&root, &headers).unwrap(),
            "https://host:8443/broadcaster/channel/sthlm/viewer-1"
        );
    }

    #[test]
    fn test_scheme_like_location_resolved_as_path() {
        let root = Url::parse("https://host:8443/broadcaster/channel/sthlm").unwrap();
        let headers = headers_with_location("viewer:8080/abc");
        assert_eq!(
            resolve_location(&root, &headers).unwrap(),
            "https://host:8443/broadcaster/channel/viewer:8080/abc"
        );
    }

    #[test]
    fn test_missing_location_is_invalid_response() {
        let root = Url::parse("https://host/channel").unwrap();
        let err = resolve_location(&root, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, SignalingError::InvalidResponse(_)));
    }

    #[test]
    fn test_new_session_starts_uncreated() {
        let session = WhppSession::new("http://localhost:8000/channel").unwrap();
        assert!(!session.is_created());
        assert!(!session.is_destroyed());
        assert_eq!(session.root_url(), "http://localhost:8000/channel");
        assert!(session.offer().is_none());
    }

    #[test]
    fn test_invalid_root_url_rejected() {
        let err = WhppSession::new("not a url").err().unwrap();
        assert!(err.is_config_error());
    }
}
