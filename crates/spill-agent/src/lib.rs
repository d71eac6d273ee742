//! Spill voice agent worker.
//!
//! The worker attaches the Spill reflection agent to LiveKit rooms. A
//! platform adapter runs the realtime transport and the STT, LLM and TTS
//! providers, and talks to this worker over a newline-delimited JSON
//! protocol ([`protocol`]). The worker owns the persona, the tool set, the
//! per-session lifecycle ([`session`]) and usage accounting ([`metrics`]).

pub mod bridge;
pub mod config;
pub mod error;
pub mod instructions;
pub mod metrics;
pub mod pipeline;
pub mod protocol;
pub mod session;
pub mod tool;
pub mod weather;
pub mod worker;

pub use bridge::{run_bridge, run_stdio, ChannelBackend};
pub use config::{load_config, AgentConfig};
pub use error::AgentError;
pub use metrics::{AgentMetrics, UsageCollector, UsageSummary};
pub use pipeline::{PipelineConfig, SessionOptions, VadModel};
pub use protocol::{PlatformMessage, WorkerMessage};
pub use session::{
    AgentSession, AgentState, JobContext, SessionBackend, SessionEvent, SessionReport, VoiceAgent,
};
pub use tool::{Tool, ToolContext, ToolDefinition, ToolOutput, ToolRegistry};
pub use weather::LookupWeather;
pub use worker::Worker;
