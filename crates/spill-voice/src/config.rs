use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the LiveKit server URL.
pub const ENV_LIVEKIT_URL: &str = "LIVEKIT_URL";
/// Environment variable holding the LiveKit API key.
pub const ENV_LIVEKIT_API_KEY: &str = "LIVEKIT_API_KEY";
/// Environment variable holding the LiveKit API secret.
pub const ENV_LIVEKIT_API_SECRET: &str = "LIVEKIT_API_SECRET";

fn default_token_ttl_seconds() -> u64 {
    3600
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for LiveKit join tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }

    /// Returns `true` when both the API key and secret are set.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Overrides fields from the standard `LIVEKIT_*` environment variables.
    ///
    /// Unset or empty variables leave the current value untouched.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with a
    /// caller-supplied lookup, so tests do not have to mutate the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_LIVEKIT_URL) {
            self.url = url;
        }
        if let Some(key) = lookup(ENV_LIVEKIT_API_KEY) {
            self.api_key = key;
        }
        if let Some(secret) = lookup(ENV_LIVEKIT_API_SECRET) {
            self.api_secret = secret;
        }
    }
}
