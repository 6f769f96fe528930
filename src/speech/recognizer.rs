use crate::config::SpeechConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    #[error("speech recognition is not supported here")]
    Unsupported,
    #[error("recognizer failed to start: {0}")]
    Start(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    /// BCP-47 tag, e.g. `pl-PL`.
    pub language: String,
    /// Keep listening after the first utterance.
    pub continuous: bool,
    pub interim_results: bool,
}

impl From<&SpeechConfig> for RecognitionOptions {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            language: config.language.clone(),
            continuous: config.continuous,
            interim_results: config.interim_results,
        }
    }
}

/// One hypothesis from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Notifications from a speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Results from `result_index` onward changed since the last batch.
    Results {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    Error(String),
    /// The engine ended its session on its own.
    End,
}

/// External speech-to-text engine, consumed as a black box.
/// Events are delivered out of band (see `SpeechInput::Recognition`).
pub trait SpeechRecognizer {
    fn configure(&mut self, options: &RecognitionOptions);
    fn start(&mut self) -> Result<(), RecognizerError>;
    fn stop(&mut self);
}
