use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const ENV_AUDIO_ENDPOINT: &str = "DENTAI_AUDIO_ENDPOINT";
pub const ENV_SPEECH_LANG: &str = "DENTAI_SPEECH_LANG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub vad: VadConfig,
}

impl Config {
    /// Defaults, then the optional JSON file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let parsed: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!("Loaded config from {}", path.display());
                parsed
            }
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_AUDIO_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.audio.endpoint = endpoint;
        }
        if let Some(language) = lookup(ENV_SPEECH_LANG).filter(|v| !v.trim().is_empty()) {
            self.speech.language = language;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// WebSocket endpoint receiving binary audio chunks.
    pub endpoint: String,
    pub flush_interval_ms: u64,
    /// Ring buffer capacity in samples.
    pub buffer_samples: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8765/audio".to_string(),
            flush_interval_ms: 1000,
            buffer_samples: 48_000 * 4,
        }
    }
}

impl AudioConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub retry: RetryConfig,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "pl-PL".to_string(),
            continuous: true,
            interim_results: true,
            retry: RetryConfig::default(),
        }
    }
}

/// Restart schedule for the recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: f32,
    pub max_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 16_000,
            factor: 2.0,
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    pub frame_ms: u32,
    pub threshold_rms: f32,
    pub min_speech_ms: u32,
    pub min_silence_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            frame_ms: 30,
            threshold_rms: 0.03,
            min_speech_ms: 90,
            min_silence_ms: 600,
        }
    }
}
