//! Microphone capture, chunked streaming and voice-activity detection.

pub mod capture;
pub mod chunk;
pub mod processing;
pub mod streamer;
pub mod vad;

pub use capture::{sample_buffer, AudioSource, InputStream, Microphone, SampleConsumer, SampleProducer};
pub use chunk::AudioChunk;
pub use processing::VoiceMonitor;
pub use streamer::{AudioStreamer, CaptureEvent, CaptureEvents};
pub use vad::{EnergyClassifier, FrameClassifier, VoiceActivityDetector, VoiceSignal, WebRtcClassifier};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoInputDevice,
    #[error("audio input device unavailable or access denied")]
    DeviceUnavailable,
    #[error("audio device error: {0}")]
    Device(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("capture already running")]
    AlreadyRecording,
    #[error("capture requires a running tokio runtime")]
    NoRuntime,
}
