//! Configuration types for the WHPP viewer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default broadcaster channel used when no URL is given
pub const DEFAULT_ENDPOINT_URL: &str =
    "https://broadcaster.lab.sto.eyevinn.technology:8443/broadcaster/channel/sthlm";

/// Main configuration for a viewer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhppViewerConfig {
    /// Signaling root URL (http:// or https://)
    pub endpoint_url: String,

    /// STUN server URLs (at least one required)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// Per-request timeout for signaling calls in milliseconds (default: 10000)
    pub request_timeout_ms: u64,

    /// Ceiling on the media exchange in seconds; `None` runs until interrupted
    pub media_timeout_secs: Option<u64>,

    /// Optional bearer token sent with every signaling request
    pub auth_token: Option<String>,
}

/// TURN server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn: or turns:)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

impl Default for WhppViewerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            stun_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            turn_servers: Vec::new(),
            request_timeout_ms: 10_000,
            media_timeout_secs: None,
            auth_token: None,
        }
    }
}

impl WhppViewerConfig {
    /// Create a default configuration pointed at `endpoint_url`
    pub fn new(endpoint_url: &str) -> Self {
        Self {
            endpoint_url: endpoint_url.to_string(),
            ..Default::default()
        }
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `endpoint_url` is not an http:// or https:// URL
    /// - `stun_servers` is empty
    /// - `request_timeout_ms` is zero
    /// - `media_timeout_secs` is `Some(0)`
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://")
        {
            return Err(Error::InvalidConfig(format!(
                "endpoint_url must start with http:// or https://, got {}",
                self.endpoint_url
            )));
        }

        if url::Url::parse(&self.endpoint_url).is_err() {
            return Err(Error::InvalidConfig(format!(
                "endpoint_url is not a valid URL: {}",
                self.endpoint_url
            )));
        }

        if self.stun_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one STUN server is required".to_string(),
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.media_timeout_secs == Some(0) {
            return Err(Error::InvalidConfig(
                "media_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Signaling request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Media exchange ceiling, if configured
    pub fn media_timeout(&self) -> Option<Duration> {
        self.media_timeout_secs.map(Duration::from_secs)
    }

    /// Add TURN servers to this configuration
    pub fn with_turn_servers(mut self, turn_servers: Vec<TurnServerConfig>) -> Self {
        self.turn_servers = turn_servers;
        self
    }

    /// Set the bearer token for signaling requests
    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    /// Bound the media exchange to `secs` seconds
    pub fn with_media_timeout(mut self, secs: u64) -> Self {
        self.media_timeout_secs = Some(secs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WhppViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.media_timeout().is_none());
    }

    #[test]
    fn test_invalid_endpoint_url_fails() {
        let config = WhppViewerConfig::new("ws://localhost:8080/channel");
        assert!(config.validate().unwrap_err().is_config_error());

        let config = WhppViewerConfig::new("http://");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_stun_servers_fails() {
        let mut config = WhppViewerConfig::default();
        config.stun_servers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_fail() {
        let mut config = WhppViewerConfig::default();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let config = WhppViewerConfig::default().with_media_timeout(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_chain() {
        let config = WhppViewerConfig::new("http://localhost:8000/channel/test")
            .with_auth_token("secret")
            .with_media_timeout(600)
            .with_turn_servers(vec![TurnServerConfig {
                url: "turn:turn.example.com:3478".to_string(),
                username: "user".to_string(),
                credential: "pass".to_string(),
            }]);
        assert!(config.validate().is_ok());
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.media_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.turn_servers.len(), 1);
    }

    #[test]
    fn test_config_serialization() {
        let config = WhppViewerConfig::default().with_media_timeout(30);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: WhppViewerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.endpoint_url, deserialized.endpoint_url);
        assert_eq!(deserialized.media_timeout_secs, Some(30));
    }
}
