//! Newline-delimited JSON messages exchanged with the platform adapter.
//!
//! The adapter owns the real-time transport and speech pipeline. It assigns
//! jobs and reports session events on the worker's stdin; the worker answers
//! with commands on stdout.

use crate::metrics::{AgentMetrics, UsageSummary};
use crate::pipeline::{SessionOptions, VadModel};
use crate::session::SessionEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

fn default_is_final() -> bool {
    true
}

/// Messages from the platform adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformMessage {
    JobAssigned {
        job_id: String,
        room: String,
    },
    UserStartedSpeaking {
        job_id: String,
    },
    UserTranscript {
        job_id: String,
        text: String,
        #[serde(default = "default_is_final")]
        is_final: bool,
    },
    AgentStartedSpeaking {
        job_id: String,
    },
    AgentStoppedSpeaking {
        job_id: String,
    },
    ToolCall {
        job_id: String,
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    MetricsCollected {
        job_id: String,
        metrics: AgentMetrics,
    },
    JobEnded {
        job_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl PlatformMessage {
    pub fn job_id(&self) -> &str {
        match self {
            Self::JobAssigned { job_id, .. }
            | Self::UserStartedSpeaking { job_id }
            | Self::UserTranscript { job_id, .. }
            | Self::AgentStartedSpeaking { job_id }
            | Self::AgentStoppedSpeaking { job_id }
            | Self::ToolCall { job_id, .. }
            | Self::MetricsCollected { job_id, .. }
            | Self::JobEnded { job_id, .. } => job_id,
        }
    }

    /// Converts a per-session message into the event the session sees.
    ///
    /// Returns `None` for `JobAssigned`, which the worker handles itself.
    pub fn into_session_event(self) -> Option<SessionEvent> {
        match self {
            Self::JobAssigned { .. } => None,
            Self::UserStartedSpeaking { .. } => Some(SessionEvent::UserStartedSpeaking),
            Self::UserTranscript { text, is_final, .. } => {
                Some(SessionEvent::UserTranscript { text, is_final })
            }
            Self::AgentStartedSpeaking { .. } => Some(SessionEvent::AgentStartedSpeaking),
            Self::AgentStoppedSpeaking { .. } => Some(SessionEvent::AgentStoppedSpeaking),
            Self::ToolCall {
                call_id,
                name,
                arguments,
                ..
            } => Some(SessionEvent::ToolCall {
                call_id,
                name,
                arguments,
            }),
            Self::MetricsCollected { metrics, .. } => {
                Some(SessionEvent::MetricsCollected(metrics))
            }
            Self::JobEnded { reason, .. } => Some(SessionEvent::Ended { reason }),
        }
    }
}

/// Credentials the adapter uses to connect the agent participant to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCredentials {
    pub server_url: String,
    pub identity: String,
    pub token: String,
}

/// Messages to the platform adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    WorkerReady {
        vad: Arc<VadModel>,
    },
    SessionStart {
        job_id: String,
        room: String,
        options: SessionOptions,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credentials: Option<AgentCredentials>,
    },
    GenerateReply {
        job_id: String,
    },
    ToolOutput {
        job_id: String,
        call_id: String,
        output: Value,
        is_error: bool,
    },
    SessionClosed {
        job_id: String,
        usage: UsageSummary,
    },
    ProtocolError {
        message: String,
    },
}
