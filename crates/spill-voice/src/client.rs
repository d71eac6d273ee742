use crate::error::VoiceError;
use spill_types::{ConnectionDetails, TokenRequest};
use std::time::Duration;

/// Request timeout used when talking to the token server.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a deployed token server.
#[derive(Debug, Clone)]
pub struct TokenClient {
    base_url: String,
    http: reqwest::Client,
}

impl TokenClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VoiceError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches connection details for `participant_name` in `room_name`.
    pub async fn fetch_connection_details(
        &self,
        room_name: &str,
        participant_name: &str,
    ) -> Result<ConnectionDetails, VoiceError> {
        self.fetch(&TokenRequest::new(room_name, participant_name))
            .await
    }

    /// Calls `GET /getToken` with the request encoded as query parameters.
    pub async fn fetch(&self, request: &TokenRequest) -> Result<ConnectionDetails, VoiceError> {
        if self.base_url.is_empty() {
            return Err(VoiceError::ServerNotConfigured);
        }

        let url = format!("{}/getToken", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(request)
            .send()
            .await
            .map_err(|e| VoiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "token server rejected request");
            return Err(VoiceError::InvalidResponse(status.as_u16()));
        }

        response
            .json::<ConnectionDetails>()
            .await
            .map_err(|e| VoiceError::Decoding(e.to_string()))
    }
}
