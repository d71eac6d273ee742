use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use spill_types::{ConnectionDetails, TokenRequest};
use std::time::Duration;

/// Mints LiveKit room-join tokens from server-side credentials.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: LiveKitConfig,
}

impl TokenIssuer {
    pub fn new(config: LiveKitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LiveKitConfig {
        &self.config
    }

    pub fn server_url(&self) -> &str {
        &self.config.url
    }

    /// Signs a token granting `identity` the right to join `room_name`.
    ///
    /// The display name is carried in the token's `name` claim. Fails with
    /// [`VoiceError::MissingCredentials`] when the API key or secret is unset.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
    ) -> Result<String, VoiceError> {
        if !self.config.has_credentials() {
            return Err(VoiceError::MissingCredentials);
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_name(participant_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(VoiceError::LiveKit)
    }

    /// Issues connection details for a token request.
    ///
    /// The identity falls back to the participant name when the request does
    /// not carry one.
    pub fn issue(&self, request: &TokenRequest) -> Result<ConnectionDetails, VoiceError> {
        if !self.config.has_credentials() {
            return Err(VoiceError::MissingCredentials);
        }
        if self.config.url.is_empty() {
            return Err(VoiceError::MissingServerUrl);
        }

        let participant_token = self.generate_join_token(
            &request.room_name,
            request.identity(),
            &request.participant_name,
        )?;

        tracing::debug!(
            room = %request.room_name,
            identity = %request.identity(),
            "issued room join token"
        );

        Ok(ConnectionDetails {
            server_url: self.config.url.clone(),
            room_name: request.room_name.clone(),
            participant_name: request.participant_name.clone(),
            participant_token,
        })
    }
}
