//! Speech-to-text capture with live transcript assembly.

pub mod capture;
pub mod recognizer;
pub mod retry;
pub mod transcript;

pub use capture::{CaptureState, SpeechCapture, SpeechInput, TranscriptView};
pub use recognizer::{RecognitionEvent, RecognitionOptions, RecognitionResult, RecognizerError, SpeechRecognizer};
pub use retry::RestartPolicy;
pub use transcript::{Transcript, SILENCE_MARKER};
