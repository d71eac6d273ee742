//! Shared wire types for the Spill voice service.
//!
//! The token server and its clients exchange these structures as JSON. Field
//! names are camelCase on the wire to match the mobile and desktop clients.

use serde::{Deserialize, Serialize};

/// Service name reported by the token server health check.
pub const TOKEN_SERVICE_NAME: &str = "spillitout-token-server";

/// Status string reported by the token server health check.
pub const HEALTHY: &str = "healthy";

/// A request for a room access token.
///
/// Used both as the JSON body of `POST /getToken` and as the query string of
/// `GET /getToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// Name of the room to join.
    pub room_name: String,
    /// Display name of the participant.
    pub participant_name: String,
    /// Unique identity of the participant. Falls back to `participant_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_identity: Option<String>,
}

impl TokenRequest {
    pub fn new(room_name: impl Into<String>, participant_name: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            participant_name: participant_name.into(),
            participant_identity: None,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.participant_identity = Some(identity.into());
        self
    }

    /// Returns the identity the token is issued to.
    ///
    /// An explicit identity wins; a missing or empty one falls back to the
    /// participant name.
    pub fn identity(&self) -> &str {
        match self.participant_identity.as_deref() {
            Some(identity) if !identity.is_empty() => identity,
            _ => &self.participant_name,
        }
    }
}

/// Connection details returned by `/getToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    /// URL of the real-time media server the client connects to.
    pub server_url: String,
    pub room_name: String,
    pub participant_name: String,
    /// Signed access token (JWT).
    pub participant_token: String,
}

/// Body of the token server health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: HEALTHY.to_string(),
            service: TOKEN_SERVICE_NAME.to_string(),
        }
    }
}

/// Logging settings shared by the token server and the agent worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "spill_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Applies `SPILL_LOG_LEVEL` and `SPILL_LOG_JSON` ("true" or "1" enables)
    /// from `env`.
    pub fn apply_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = env("SPILL_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(json) = env("SPILL_LOG_JSON") {
            self.json = json == "true" || json == "1";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_defaults_to_info_text() {
        let logging: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(logging, LoggingConfig::default());
        assert_eq!(logging.level, "info");
        assert!(!logging.json);
    }

    #[test]
    fn logging_environment_overrides() {
        let mut logging = LoggingConfig::default();
        logging.apply_overrides(|key| match key {
            "SPILL_LOG_LEVEL" => Some("spill_agent=debug,info".to_string()),
            "SPILL_LOG_JSON" => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(logging.level, "spill_agent=debug,info");
        assert!(logging.json);

        logging.apply_overrides(|key| (key == "SPILL_LOG_JSON").then(|| "no".to_string()));
        assert!(!logging.json);
        assert_eq!(logging.level, "spill_agent=debug,info");
    }

    #[test]
    fn identity_defaults_to_participant_name() {
        let request = TokenRequest::new("r1", "Alice");
        assert_eq!(request.identity(), "Alice");
    }

    #[test]
    fn explicit_identity_wins() {
        let request = TokenRequest::new("r1", "Alice").with_identity("user-42");
        assert_eq!(request.identity(), "user-42");
    }

    #[test]
    fn empty_identity_falls_back() {
        let request = TokenRequest::new("r1", "Alice").with_identity("");
        assert_eq!(request.identity(), "Alice");
    }

    #[test]
    fn token_request_uses_camel_case() {
        let request: TokenRequest =
            serde_json::from_str(r#"{"roomName":"r1","participantName":"Alice"}"#).unwrap();
        assert_eq!(request.room_name, "r1");
        assert_eq!(request.participant_identity, None);

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("participantIdentity").is_none());
    }

    #[test]
    fn connection_details_wire_names() {
        let details = ConnectionDetails {
            server_url: "wss://example.livekit.cloud".into(),
            room_name: "r1".into(),
            participant_name: "Alice".into(),
            participant_token: "jwt".into(),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["serverUrl"], "wss://example.livekit.cloud");
        assert_eq!(json["roomName"], "r1");
        assert_eq!(json["participantName"], "Alice");
        assert_eq!(json["participantToken"], "jwt");
    }
}
