//! Usage metrics reported by the platform during a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One metrics sample emitted by a pipeline stage.
///
/// Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMetrics {
    Llm {
        #[serde(default)]
        prompt_tokens: u64,
        #[serde(default)]
        prompt_cached_tokens: u64,
        #[serde(default)]
        completion_tokens: u64,
        /// Time to first token.
        #[serde(default)]
        ttft: f64,
        #[serde(default)]
        duration: f64,
    },
    Stt {
        #[serde(default)]
        audio_duration: f64,
    },
    Tts {
        #[serde(default)]
        characters_count: u64,
        #[serde(default)]
        audio_duration: f64,
        /// Time to first byte.
        #[serde(default)]
        ttfb: f64,
    },
    Eou {
        #[serde(default)]
        end_of_utterance_delay: f64,
        #[serde(default)]
        transcription_delay: f64,
    },
    Vad {
        #[serde(default)]
        idle_time: f64,
        #[serde(default)]
        inference_count: u64,
    },
}

/// Logs a metrics sample at info level.
pub fn log_metrics(metrics: &AgentMetrics) {
    match metrics {
        AgentMetrics::Llm {
            prompt_tokens,
            prompt_cached_tokens,
            completion_tokens,
            ttft,
            duration,
        } => tracing::info!(
            prompt_tokens,
            prompt_cached_tokens,
            completion_tokens,
            ttft,
            duration,
            "LLM metrics"
        ),
        AgentMetrics::Stt { audio_duration } => {
            tracing::info!(audio_duration, "STT metrics")
        }
        AgentMetrics::Tts {
            characters_count,
            audio_duration,
            ttfb,
        } => tracing::info!(characters_count, audio_duration, ttfb, "TTS metrics"),
        AgentMetrics::Eou {
            end_of_utterance_delay,
            transcription_delay,
        } => tracing::info!(end_of_utterance_delay, transcription_delay, "EOU metrics"),
        AgentMetrics::Vad {
            idle_time,
            inference_count,
        } => tracing::debug!(idle_time, inference_count, "VAD metrics"),
    }
}

/// Usage totals for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub llm_prompt_tokens: u64,
    pub llm_prompt_cached_tokens: u64,
    pub llm_completion_tokens: u64,
    pub tts_characters_count: u64,
    pub tts_audio_duration: f64,
    pub stt_audio_duration: f64,
}

impl fmt::Display for UsageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "llm_prompt_tokens={} llm_prompt_cached_tokens={} llm_completion_tokens={} \
             tts_characters_count={} tts_audio_duration={:.2}s stt_audio_duration={:.2}s",
            self.llm_prompt_tokens,
            self.llm_prompt_cached_tokens,
            self.llm_completion_tokens,
            self.tts_characters_count,
            self.tts_audio_duration,
            self.stt_audio_duration
        )
    }
}

/// Accumulates usage over a session. Owned by the session task.
#[derive(Debug, Default)]
pub struct UsageCollector {
    summary: UsageSummary,
    samples: u64,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, metrics: &AgentMetrics) {
        self.samples += 1;
        let summary = &mut self.summary;
        match metrics {
            AgentMetrics::Llm {
                prompt_tokens,
                prompt_cached_tokens,
                completion_tokens,
                ..
            } => {
                summary.llm_prompt_tokens += prompt_tokens;
                summary.llm_prompt_cached_tokens += prompt_cached_tokens;
                summary.llm_completion_tokens += completion_tokens;
            }
            AgentMetrics::Stt { audio_duration } => {
                summary.stt_audio_duration += audio_duration;
            }
            AgentMetrics::Tts {
                characters_count,
                audio_duration,
                ..
            } => {
                summary.tts_characters_count += characters_count;
                summary.tts_audio_duration += audio_duration;
            }
            AgentMetrics::Eou { .. } | AgentMetrics::Vad { .. } => {}
        }
    }

    /// Number of samples collected so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn summary(&self) -> UsageSummary {
        self.summary.clone()
    }
}
