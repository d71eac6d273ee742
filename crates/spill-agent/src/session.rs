//! Agent session lifecycle.
//!
//! A session attaches the configured agent to one room for one job. The
//! platform runs the speech pipeline; this module tracks where the
//! conversation is, answers tool calls, and accumulates usage until the
//! platform ends the job.

use crate::error::AgentError;
use crate::instructions::INSTRUCTIONS;
use crate::metrics::{log_metrics, AgentMetrics, UsageCollector, UsageSummary};
use crate::pipeline::{SessionOptions, VadModel};
use crate::tool::{ToolContext, ToolOutput, ToolRegistry};
use crate::weather::LookupWeather;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Where the agent is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Entered,
    GeneratingReply,
    Listening,
    Responding,
    Shutdown,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Entered => "entered",
            Self::GeneratingReply => "generating_reply",
            Self::Listening => "listening",
            Self::Responding => "responding",
            Self::Shutdown => "shutdown",
        }
    }

    /// Returns `true` if the lifecycle allows moving from `self` to `next`.
    ///
    /// Any live state may shut down; nothing leaves `Shutdown`.
    pub fn can_transition_to(self, next: AgentState) -> bool {
        use AgentState::*;
        match (self, next) {
            (Shutdown, _) => false,
            (_, Shutdown) => true,
            (Idle, Entered) => true,
            (Entered, GeneratingReply) => true,
            (GeneratingReply, Responding | Listening) => true,
            (Responding, Listening | GeneratingReply) => true,
            (Listening, GeneratingReply | Responding) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events the platform reports for a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UserStartedSpeaking,
    UserTranscript { text: String, is_final: bool },
    AgentStartedSpeaking,
    AgentStoppedSpeaking,
    ToolCall {
        call_id: String,
        name: String,
        arguments: Value,
    },
    MetricsCollected(AgentMetrics),
    Ended { reason: Option<String> },
}

/// The platform side of a session.
///
/// Implementations forward commands to whatever runs the real pipeline and
/// surface its events. `next_event` returning `None` means the platform went
/// away.
#[async_trait]
pub trait SessionBackend: Send {
    async fn start(&mut self, room: &str, options: &SessionOptions) -> Result<(), AgentError>;
    async fn generate_reply(&mut self) -> Result<(), AgentError>;
    async fn send_tool_output(
        &mut self,
        call_id: &str,
        output: ToolOutput,
    ) -> Result<(), AgentError>;
    async fn next_event(&mut self) -> Option<SessionEvent>;
    async fn close(&mut self, usage: &UsageSummary) -> Result<(), AgentError>;
}

/// Agent persona: instructions plus the tools the model may call.
#[derive(Debug, Clone)]
pub struct VoiceAgent {
    instructions: String,
    tools: ToolRegistry,
}

impl VoiceAgent {
    pub fn new(instructions: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            instructions: instructions.into(),
            tools,
        }
    }

    /// The Spill reflection agent with its weather tool.
    pub fn spill() -> Self {
        Self::new(
            INSTRUCTIONS,
            ToolRegistry::new().with_tool(Arc::new(LookupWeather)),
        )
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

/// Summary of a finished session, handed to shutdown callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub job_id: String,
    pub room: String,
    pub usage: UsageSummary,
    pub user_turns: u32,
    pub tool_calls: u32,
    pub end_reason: Option<String>,
}

pub type ShutdownCallback = Box<dyn FnOnce(&SessionReport) + Send>;

/// Per-job context.
pub struct JobContext {
    pub job_id: String,
    pub room: String,
    /// Shared voice-activity detector loaded at worker prewarm.
    pub vad: Arc<VadModel>,
    shutdown_callbacks: Vec<ShutdownCallback>,
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("room", &self.room)
            .field("shutdown_callbacks", &self.shutdown_callbacks.len())
            .finish()
    }
}

impl JobContext {
    pub fn new(job_id: impl Into<String>, room: impl Into<String>, vad: Arc<VadModel>) -> Self {
        Self {
            job_id: job_id.into(),
            room: room.into(),
            vad,
            shutdown_callbacks: Vec::new(),
        }
    }

    /// Registers a callback run once when the session is over.
    pub fn add_shutdown_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(&SessionReport) + Send + 'static,
    {
        self.shutdown_callbacks.push(Box::new(callback));
    }

    fn run_shutdown_callbacks(&mut self, report: &SessionReport) {
        for callback in self.shutdown_callbacks.drain(..) {
            callback(report);
        }
    }
}

/// Drives one agent through one session.
pub struct AgentSession<B> {
    backend: B,
    agent: Arc<VoiceAgent>,
    options: SessionOptions,
    state: AgentState,
    usage: UsageCollector,
    user_turns: u32,
    tool_calls: u32,
}

impl<B: SessionBackend> AgentSession<B> {
    pub fn new(backend: B, agent: Arc<VoiceAgent>, options: SessionOptions) -> Self {
        Self {
            backend,
            agent,
            options,
            state: AgentState::Idle,
            usage: UsageCollector::new(),
            user_turns: 0,
            tool_calls: 0,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Runs the session until the platform ends it, then runs the job's
    /// shutdown callbacks.
    ///
    /// Every log line emitted while the session runs carries the room name.
    pub async fn run(self, ctx: JobContext) -> Result<SessionReport, AgentError> {
        let span = tracing::info_span!("job", job_id = %ctx.job_id, room = %ctx.room);
        self.run_inner(ctx).instrument(span).await
    }

    async fn run_inner(mut self, mut ctx: JobContext) -> Result<SessionReport, AgentError> {
        let outcome = self.drive(&ctx.job_id, &ctx.room).await;

        self.state = AgentState::Shutdown;
        let usage = self.usage.summary();
        if let Err(e) = self.backend.close(&usage).await {
            tracing::warn!("failed to report session close: {}", e);
        }

        let report = SessionReport {
            job_id: ctx.job_id.clone(),
            room: ctx.room.clone(),
            usage,
            user_turns: self.user_turns,
            tool_calls: self.tool_calls,
            end_reason: outcome.as_ref().ok().cloned().flatten(),
        };
        ctx.run_shutdown_callbacks(&report);

        match outcome {
            Ok(_) => {
                tracing::info!(
                    user_turns = report.user_turns,
                    tool_calls = report.tool_calls,
                    "session ended"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("session failed: {}", e);
                Err(e)
            }
        }
    }

    /// Starts the session, greets, then handles events until the end.
    /// Returns the end reason reported by the platform.
    async fn drive(&mut self, job_id: &str, room: &str) -> Result<Option<String>, AgentError> {
        self.backend.start(room, &self.options).await?;
        self.transition(AgentState::Entered)?;
        tracing::info!("agent entered session");

        self.on_enter().await?;

        while let Some(event) = self.backend.next_event().await {
            if let SessionEvent::Ended { reason } = event {
                tracing::info!(reason = reason.as_deref().unwrap_or("none"), "platform ended job");
                return Ok(reason);
            }
            self.handle_event(job_id, room, event).await?;
        }

        tracing::warn!("platform event stream closed");
        Ok(Some("platform disconnected".to_string()))
    }

    /// Greets before any user content arrives.
    async fn on_enter(&mut self) -> Result<(), AgentError> {
        self.backend.generate_reply().await?;
        self.transition(AgentState::GeneratingReply)
    }

    async fn handle_event(
        &mut self,
        job_id: &str,
        room: &str,
        event: SessionEvent,
    ) -> Result<(), AgentError> {
        match event {
            SessionEvent::UserStartedSpeaking => {
                if matches!(
                    self.state,
                    AgentState::Responding | AgentState::GeneratingReply
                ) {
                    tracing::debug!(from = %self.state, "user interrupted agent");
                }
                self.observe(AgentState::Listening);
            }
            SessionEvent::UserTranscript { text, is_final } => {
                if is_final {
                    self.user_turns += 1;
                    tracing::debug!(chars = text.len(), "user turn completed");
                    self.observe(AgentState::GeneratingReply);
                } else {
                    tracing::trace!(chars = text.len(), "interim transcript");
                }
            }
            SessionEvent::AgentStartedSpeaking => self.observe(AgentState::Responding),
            SessionEvent::AgentStoppedSpeaking => self.observe(AgentState::Listening),
            SessionEvent::ToolCall {
                call_id,
                name,
                arguments,
            } => {
                self.tool_calls += 1;
                let tool_ctx = ToolContext {
                    job_id: job_id.to_string(),
                    room: room.to_string(),
                    call_id: call_id.clone(),
                };
                let output = self.agent.tools().call(&tool_ctx, &name, arguments).await;
                self.backend.send_tool_output(&call_id, output).await?;
            }
            SessionEvent::MetricsCollected(metrics) => {
                log_metrics(&metrics);
                self.usage.collect(&metrics);
            }
            SessionEvent::Ended { .. } => {}
        }
        Ok(())
    }

    fn transition(&mut self, next: AgentState) -> Result<(), AgentError> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(AgentError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = %self.state, to = %next, "agent state changed");
        self.state = next;
        Ok(())
    }

    /// Applies a transition reported by the platform. The platform owns turn
    /// taking, so an unexpected order is logged rather than treated as fatal.
    fn observe(&mut self, next: AgentState) {
        if let Err(e) = self.transition(next) {
            tracing::warn!("ignoring platform event: {}", e);
        }
    }
}
