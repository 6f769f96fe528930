use serde::{Deserialize, Serialize};

use crate::config::VadConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceSignal {
    SpeechStart,
    SpeechEnd,
}

/// Decides whether one fixed-size frame contains speech.
pub trait FrameClassifier {
    fn is_speech(&mut self, frame: &[f32]) -> bool;
}

/// RMS energy above a fixed threshold.
#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    pub threshold_rms: f32,
}

impl FrameClassifier for EnergyClassifier {
    fn is_speech(&mut self, frame: &[f32]) -> bool {
        if frame.is_empty() {
            return false;
        }
        let sq_sum: f32 = frame.iter().map(|&x| x * x).sum();
        let rms = (sq_sum / frame.len() as f32).sqrt();
        rms > self.threshold_rms
    }
}

/// WebRTC voice detector. Supports 8, 16, 32 and 48 kHz with 10/20/30 ms frames.
pub struct WebRtcClassifier {
    vad: webrtc_vad::Vad,
    scratch: Vec<i16>,
}

impl WebRtcClassifier {
    /// `None` for sample rates WebRTC VAD does not accept.
    pub fn new(sample_rate: u32) -> Option<Self> {
        let rate = match sample_rate {
            8000 => webrtc_vad::SampleRate::Rate8kHz,
            16000 => webrtc_vad::SampleRate::Rate16kHz,
            32000 => webrtc_vad::SampleRate::Rate32kHz,
            48000 => webrtc_vad::SampleRate::Rate48kHz,
            _ => return None,
        };
        // Aggressive mode suppresses background noise in the operatory
        let mut vad = webrtc_vad::Vad::new_with_rate(rate);
        vad.set_mode(webrtc_vad::VadMode::Aggressive);
        Some(Self {
            vad,
            scratch: Vec::new(),
        })
    }
}

impl FrameClassifier for WebRtcClassifier {
    fn is_speech(&mut self, frame: &[f32]) -> bool {
        self.scratch.clear();
        self.scratch
            .extend(frame.iter().map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16));
        match self.vad.is_voice_segment(&self.scratch) {
            Ok(voiced) => voiced,
            Err(()) => {
                tracing::debug!("VAD rejected frame of {} samples", frame.len());
                false
            }
        }
    }
}

/// Frame-based voice-activity detector with start/end debouncing.
pub struct VoiceActivityDetector<C> {
    classifier: C,
    frame_size: usize,
    min_speech_frames: u32,
    min_silence_frames: u32,

    // State
    pending: Vec<f32>,
    is_speaking: bool,
    consecutive_speech: u32,
    consecutive_silence: u32,
}

impl VoiceActivityDetector<EnergyClassifier> {
    pub fn energy(sample_rate: u32, config: &VadConfig) -> Self {
        let classifier = EnergyClassifier {
            threshold_rms: config.threshold_rms,
        };
        Self::new(classifier, sample_rate, config)
    }
}

impl<C: FrameClassifier> VoiceActivityDetector<C> {
    pub fn new(classifier: C, sample_rate: u32, config: &VadConfig) -> Self {
        let frame_ms = config.frame_ms.max(1);
        let frame_size = ((sample_rate as usize * frame_ms as usize) / 1000).max(1);
        Self {
            classifier,
            frame_size,
            min_speech_frames: config.min_speech_ms.div_ceil(frame_ms).max(1),
            min_silence_frames: config.min_silence_ms.div_ceil(frame_ms).max(1),
            pending: Vec::with_capacity(frame_size),
            is_speaking: false,
            consecutive_speech: 0,
            consecutive_silence: 0,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    /// Feed any number of samples. Leftovers shorter than a frame wait for the next call.
    pub fn process(&mut self, samples: &[f32]) -> Vec<VoiceSignal> {
        let mut signals = Vec::new();
        let mut rest = samples;

        while !rest.is_empty() {
            let take = (self.frame_size - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.pending.len() == self.frame_size {
                let frame = std::mem::take(&mut self.pending);
                if let Some(signal) = self.process_frame(&frame) {
                    signals.push(signal);
                }
                self.pending = frame;
                self.pending.clear();
            }
        }

        signals
    }

    /// Classify one full frame and run the debounce state machine.
    pub fn process_frame(&mut self, frame: &[f32]) -> Option<VoiceSignal> {
        if self.classifier.is_speech(frame) {
            self.consecutive_silence = 0;
            self.consecutive_speech = self.consecutive_speech.saturating_add(1);
        } else {
            self.consecutive_speech = 0;
            self.consecutive_silence = self.consecutive_silence.saturating_add(1);
        }

        if !self.is_speaking && self.consecutive_speech >= self.min_speech_frames {
            self.is_speaking = true;
            return Some(VoiceSignal::SpeechStart);
        }
        if self.is_speaking && self.consecutive_silence >= self.min_silence_frames {
            self.is_speaking = false;
            return Some(VoiceSignal::SpeechEnd);
        }
        None
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.is_speaking = false;
        self.consecutive_speech = 0;
        self.consecutive_silence = 0;
    }
}
