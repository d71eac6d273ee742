//! Worker configuration loading from file and environment variables.

use crate::pipeline::PipelineConfig;
use serde::Deserialize;
use spill_types::LoggingConfig;
use spill_voice::LiveKitConfig;
use thiserror::Error;

/// Top-level worker configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    /// Speech pipeline choices.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// LiveKit credentials used to mint the agent's own room token.
    #[serde(default)]
    pub livekit: LiveKitConfig,

    /// Logging settings. Logs always go to stderr.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET` override `livekit.*`
/// - `SPILL_STT_MODEL` overrides `pipeline.stt.model`
/// - `SPILL_LLM_MODEL` overrides `pipeline.llm.model`
/// - `SPILL_TTS_VOICE` overrides `pipeline.tts.voice`
/// - `SPILL_LOG_LEVEL` overrides `logging.level`
/// - `SPILL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<AgentConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with a caller-supplied environment lookup.
pub fn load_config_with<F>(path: Option<&str>, env: F) -> Result<AgentConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                AgentConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => AgentConfig::default(),
    };

    config.livekit.apply_overrides(&env);
    if let Some(model) = env("SPILL_STT_MODEL") {
        config.pipeline.stt.model = model;
    }
    if let Some(model) = env("SPILL_LLM_MODEL") {
        config.pipeline.llm.model = model;
    }
    if let Some(voice) = env("SPILL_TTS_VOICE") {
        config.pipeline.tts.voice = voice;
    }
    config.logging.apply_overrides(&env);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = load_config_with(None, |_| None).unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn reads_pipeline_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[pipeline.tts]
provider = "openai"
voice = "shimmer"

[pipeline.turn_taking]
min_endpointing_delay = 0.8
max_endpointing_delay = 2.0
"#
        )
        .unwrap();

        let config = load_config_with(Some(file.path().to_str().unwrap()), |_| None).unwrap();
        assert_eq!(config.pipeline.tts.voice, "shimmer");
        assert_eq!(config.pipeline.turn_taking.min_endpointing_delay, 0.8);
        assert_eq!(config.pipeline.llm.model, "gpt-4o");
    }

    #[test]
    fn environment_overrides_models() {
        let vars: HashMap<&str, &str> = [
            ("SPILL_LLM_MODEL", "gpt-4o-mini"),
            ("SPILL_TTS_VOICE", "alloy"),
            ("LIVEKIT_API_KEY", "k"),
            ("LIVEKIT_API_SECRET", "s"),
            ("SPILL_LOG_JSON", "true"),
        ]
        .into_iter()
        .collect();

        let config = load_config_with(None, |key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.pipeline.llm.model, "gpt-4o-mini");
        assert_eq!(config.pipeline.tts.voice, "alloy");
        assert_eq!(config.pipeline.stt.model, "nova-3");
        assert!(config.livekit.has_credentials());
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }
}
