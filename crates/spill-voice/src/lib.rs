//! LiveKit access-token plumbing for the Spill voice service.
//!
//! The token server uses [`TokenIssuer`] to sign room-join credentials from
//! its API key and secret. Clients and operational tooling use
//! [`TokenClient`] to fetch those credentials from a deployed server.

pub mod client;
pub mod config;
pub mod error;
pub mod service;

pub use client::TokenClient;
pub use config::{LiveKitConfig, ENV_LIVEKIT_API_KEY, ENV_LIVEKIT_API_SECRET, ENV_LIVEKIT_URL};
pub use error::VoiceError;
pub use service::TokenIssuer;
