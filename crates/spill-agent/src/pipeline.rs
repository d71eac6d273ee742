//! Speech pipeline configuration.
//!
//! Nothing here runs speech recognition, synthesis or turn detection. These
//! types describe which platform-provided capabilities a session uses and how
//! they are tuned; the platform adapter applies them.

use crate::error::AgentError;
use crate::tool::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Speech-to-text model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SttConfig {
    pub provider: String,
    pub model: String,
    /// Language hint. `multi` enables multilingual recognition.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: "deepgram".to_string(),
            model: "nova-3".to_string(),
            language: "multi".to_string(),
        }
    }
}

/// Language model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

/// Text-to-speech voice selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsConfig {
    pub provider: String,
    pub voice: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            voice: "nova".to_string(),
        }
    }
}

/// End-of-turn detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDetection {
    /// Multilingual end-of-utterance model.
    #[default]
    Multilingual,
    /// English-only end-of-utterance model.
    English,
    /// Silence from voice-activity detection alone.
    Vad,
    /// End-of-speech markers from the speech-to-text stream.
    Stt,
}

/// Turn-taking knobs, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnTaking {
    /// Minimum user speech before the agent treats it as an interruption.
    #[serde(default = "default_min_interruption_duration")]
    pub min_interruption_duration: f64,
    /// Minimum silence after the user stops before the turn may end.
    #[serde(default = "default_min_endpointing_delay")]
    pub min_endpointing_delay: f64,
    /// Upper bound on waiting when the turn detector thinks the user is not
    /// done yet.
    #[serde(default = "default_max_endpointing_delay")]
    pub max_endpointing_delay: f64,
}

fn default_min_interruption_duration() -> f64 {
    0.2
}

fn default_min_endpointing_delay() -> f64 {
    0.5
}

fn default_max_endpointing_delay() -> f64 {
    1.0
}

impl Default for TurnTaking {
    fn default() -> Self {
        Self {
            min_interruption_duration: default_min_interruption_duration(),
            min_endpointing_delay: default_min_endpointing_delay(),
            max_endpointing_delay: default_max_endpointing_delay(),
        }
    }
}

impl TurnTaking {
    pub fn validate(&self) -> Result<(), AgentError> {
        for (name, value) in [
            ("min_interruption_duration", self.min_interruption_duration),
            ("min_endpointing_delay", self.min_endpointing_delay),
            ("max_endpointing_delay", self.max_endpointing_delay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        if self.min_endpointing_delay > self.max_endpointing_delay {
            return Err(AgentError::Config(format!(
                "min_endpointing_delay ({}) exceeds max_endpointing_delay ({})",
                self.min_endpointing_delay, self.max_endpointing_delay
            )));
        }
        Ok(())
    }
}

/// Silero voice-activity detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VadSettings {
    #[serde(default = "default_min_speech_duration")]
    pub min_speech_duration: f64,
    #[serde(default = "default_min_silence_duration")]
    pub min_silence_duration: f64,
    #[serde(default = "default_prefix_padding_duration")]
    pub prefix_padding_duration: f64,
    /// Speech probability above which a frame counts as speech.
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_min_speech_duration() -> f64 {
    0.05
}

fn default_min_silence_duration() -> f64 {
    0.55
}

fn default_prefix_padding_duration() -> f64 {
    0.5
}

fn default_activation_threshold() -> f64 {
    0.5
}

fn default_sample_rate() -> u32 {
    16_000
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            min_speech_duration: default_min_speech_duration(),
            min_silence_duration: default_min_silence_duration(),
            prefix_padding_duration: default_prefix_padding_duration(),
            activation_threshold: default_activation_threshold(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// A loaded voice-activity detector.
///
/// Loaded once per worker process and shared read-only by every job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VadModel {
    pub kind: String,
    #[serde(flatten)]
    pub settings: VadSettings,
}

impl VadModel {
    /// Validates the settings and returns the shared model handle.
    pub fn load(settings: VadSettings) -> Result<Arc<Self>, AgentError> {
        if !(0.0..=1.0).contains(&settings.activation_threshold) {
            return Err(AgentError::Config(format!(
                "vad activation_threshold must be within 0..=1, got {}",
                settings.activation_threshold
            )));
        }
        if settings.sample_rate != 8_000 && settings.sample_rate != 16_000 {
            return Err(AgentError::Config(format!(
                "vad sample_rate must be 8000 or 16000, got {}",
                settings.sample_rate
            )));
        }
        for (name, value) in [
            ("min_speech_duration", settings.min_speech_duration),
            ("min_silence_duration", settings.min_silence_duration),
            ("prefix_padding_duration", settings.prefix_padding_duration),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::Config(format!(
                    "vad {} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }

        tracing::info!(
            sample_rate = settings.sample_rate,
            activation_threshold = settings.activation_threshold,
            "loaded silero VAD"
        );

        Ok(Arc::new(Self {
            kind: "silero".to_string(),
            settings,
        }))
    }
}

/// Pipeline choices loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub turn_detection: TurnDetection,
    #[serde(default)]
    pub turn_taking: TurnTaking,
    #[serde(default)]
    pub vad: VadSettings,
    /// Publish transcriptions of both sides to the room.
    #[serde(default = "default_transcription_enabled")]
    pub transcription_enabled: bool,
}

fn default_transcription_enabled() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stt: SttConfig::default(),
            llm: LlmConfig::default(),
            tts: TtsConfig::default(),
            turn_detection: TurnDetection::default(),
            turn_taking: TurnTaking::default(),
            vad: VadSettings::default(),
            transcription_enabled: default_transcription_enabled(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), AgentError> {
        for (name, value) in [
            ("stt.model", &self.stt.model),
            ("llm.model", &self.llm.model),
            ("tts.voice", &self.tts.voice),
        ] {
            if value.trim().is_empty() {
                return Err(AgentError::Config(format!("{} must not be empty", name)));
            }
        }
        self.turn_taking.validate()
    }
}

/// Fully resolved options for one session, sent to the platform when the
/// session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub instructions: String,
    pub tools: Vec<ToolDefinition>,
    pub stt: SttConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub turn_detection: TurnDetection,
    pub turn_taking: TurnTaking,
    pub vad: Arc<VadModel>,
    pub transcription_enabled: bool,
}
