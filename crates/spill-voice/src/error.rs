use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit API error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Server configuration error: Missing API credentials")]
    MissingCredentials,

    #[error("Server configuration error: Missing server URL")]
    MissingServerUrl,

    #[error("Token server URL is not configured")]
    ServerNotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from token server: {0}")]
    InvalidResponse(u16),

    #[error("Failed to decode response from token server: {0}")]
    Decoding(String),
}

impl VoiceError {
    /// Returns `true` for errors caused by missing server-side configuration
    /// rather than by the request or the signing step.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::MissingServerUrl)
    }
}
