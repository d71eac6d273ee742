//! Worker process state shared by every job.

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::pipeline::{PipelineConfig, SessionOptions, VadModel};
use crate::protocol::AgentCredentials;
use crate::session::{AgentSession, JobContext, SessionBackend, SessionReport, VoiceAgent};
use spill_voice::TokenIssuer;
use std::sync::Arc;

/// Display name of the agent participant in the room.
pub const AGENT_PARTICIPANT_NAME: &str = "Spill";

/// Read-only worker state: the agent definition, the pipeline choices and the
/// voice-activity detector loaded at prewarm.
#[derive(Debug)]
pub struct Worker {
    agent: Arc<VoiceAgent>,
    pipeline: PipelineConfig,
    vad: Arc<VadModel>,
    issuer: Option<TokenIssuer>,
}

impl Worker {
    /// Validates the configuration and loads the VAD once for the process.
    pub fn prewarm(config: AgentConfig, agent: VoiceAgent) -> Result<Self, AgentError> {
        config.pipeline.validate()?;
        let vad = VadModel::load(config.pipeline.vad.clone())?;

        let issuer = if config.livekit.has_credentials() && !config.livekit.url.is_empty() {
            Some(TokenIssuer::new(config.livekit))
        } else {
            tracing::warn!(
                "LiveKit credentials not configured; sessions start without agent room tokens"
            );
            None
        };

        Ok(Self {
            agent: Arc::new(agent),
            pipeline: config.pipeline,
            vad,
            issuer,
        })
    }

    pub fn vad(&self) -> &Arc<VadModel> {
        &self.vad
    }

    pub fn agent(&self) -> &Arc<VoiceAgent> {
        &self.agent
    }

    /// Resolves the options every session of this worker starts with.
    pub fn session_options(&self) -> SessionOptions {
        let pipeline = &self.pipeline;
        SessionOptions {
            instructions: self.agent.instructions().to_string(),
            tools: self.agent.tools().definitions(),
            stt: pipeline.stt.clone(),
            llm: pipeline.llm.clone(),
            tts: pipeline.tts.clone(),
            turn_detection: pipeline.turn_detection,
            turn_taking: pipeline.turn_taking,
            vad: Arc::clone(&self.vad),
            transcription_enabled: pipeline.transcription_enabled,
        }
    }

    /// Mints the token the agent participant joins `room` with.
    ///
    /// Returns `None` when no credentials are configured or signing fails;
    /// the adapter then falls back to its own credentials.
    pub fn agent_credentials(&self, job_id: &str, room: &str) -> Option<AgentCredentials> {
        let issuer = self.issuer.as_ref()?;
        let identity = format!("agent-{}", job_id);

        match issuer.generate_join_token(room, &identity, AGENT_PARTICIPANT_NAME) {
            Ok(token) => Some(AgentCredentials {
                server_url: issuer.server_url().to_string(),
                identity,
                token,
            }),
            Err(e) => {
                tracing::warn!(job_id, room, "failed to mint agent token: {}", e);
                None
            }
        }
    }

    /// Job entrypoint: attaches the agent to the room through `backend` and
    /// logs total usage once the session is over.
    pub async fn run_job<B: SessionBackend>(
        &self,
        job_id: impl Into<String>,
        room: impl Into<String>,
        backend: B,
    ) -> Result<SessionReport, AgentError> {
        let mut ctx = JobContext::new(job_id, room, Arc::clone(&self.vad));
        ctx.add_shutdown_callback(|report| {
            tracing::info!(
                job_id = %report.job_id,
                room = %report.room,
                "Usage: {}",
                report.usage
            );
        });

        AgentSession::new(backend, Arc::clone(&self.agent), self.session_options())
            .run(ctx)
            .await
    }
}
