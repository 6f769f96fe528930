use backon::ExponentialBackoff;
use serde::Serialize;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info, warn};

use super::recognizer::{RecognitionEvent, RecognitionOptions, RecognizerError, SpeechRecognizer};
use super::retry::RestartPolicy;
use super::transcript::Transcript;
use crate::audio::VoiceSignal;
use crate::config::SpeechConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum CaptureState {
    #[default]
    Idle,
    /// `speaking` only drives UI feedback.
    Recording { speaking: bool },
    /// Restart attempts exhausted. `start` clears it.
    Failed { reason: String },
}

/// Everything the speech driver reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechInput {
    Start,
    Stop,
    Recognition(RecognitionEvent),
    Voice(VoiceSignal),
}

impl From<VoiceSignal> for SpeechInput {
    fn from(signal: VoiceSignal) -> Self {
        SpeechInput::Voice(signal)
    }
}

impl From<RecognitionEvent> for SpeechInput {
    fn from(event: RecognitionEvent) -> Self {
        SpeechInput::Recognition(event)
    }
}

/// What a transcript display needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptView {
    pub text: String,
    pub interim: String,
    pub state: CaptureState,
}

/// Live dictation: drives a recognizer, assembles the transcript, restarts on hiccups.
pub struct SpeechCapture<R> {
    recognizer: R,
    options: RecognitionOptions,
    policy: RestartPolicy,
    backoff: ExponentialBackoff,
    state: CaptureState,
    transcript: Transcript,
    pending_restart: bool,
    attempts: usize,
}

impl<R: SpeechRecognizer> SpeechCapture<R> {
    pub fn new(recognizer: R, config: &SpeechConfig) -> Self {
        let policy = RestartPolicy::new(&config.retry);
        Self {
            recognizer,
            options: RecognitionOptions::from(config),
            backoff: policy.schedule(),
            policy,
            state: CaptureState::Idle,
            transcript: Transcript::new(),
            pending_restart: false,
            attempts: 0,
        }
    }

    /// Idle/Failed -> Recording. Starting while recording is a no-op.
    pub fn start(&mut self) -> Result<(), RecognizerError> {
        if self.is_recording() {
            return Ok(());
        }
        self.recognizer.configure(&self.options);
        self.recognizer.start()?;

        self.reset_backoff();
        self.pending_restart = false;
        self.state = CaptureState::Recording { speaking: false };
        info!("Speech capture started ({})", self.options.language);
        Ok(())
    }

    /// Explicit user stop. Suppresses every later restart.
    pub fn stop(&mut self) {
        if self.is_recording() {
            self.recognizer.stop();
            info!("Speech capture stopped");
        }
        self.pending_restart = false;
        self.state = CaptureState::Idle;
    }

    /// Returns the delay after which `restart` must be called, if a restart is due.
    pub fn handle_recognition(&mut self, event: RecognitionEvent) -> Option<Duration> {
        match event {
            RecognitionEvent::Results { result_index, results } => {
                if let Some(committed) = self.transcript.apply(result_index, &results) {
                    debug!("Transcript += {:?}", committed);
                }
                self.reset_backoff();
                None
            }
            RecognitionEvent::Error(reason) => {
                warn!("Speech recognition error: {}", reason);
                self.schedule_restart(reason, true)
            }
            RecognitionEvent::End => {
                debug!("Speech recognition session ended");
                self.schedule_restart("recognition ended".to_string(), false)
            }
        }
    }

    /// Resume after a scheduled delay. May ask for another delay if the engine refuses.
    pub fn restart(&mut self) -> Option<Duration> {
        if !std::mem::take(&mut self.pending_restart) || !self.is_recording() {
            return None;
        }
        self.recognizer.configure(&self.options);
        match self.recognizer.start() {
            Ok(()) => {
                info!("Speech recognizer restarted (attempt {})", self.attempts);
                None
            }
            Err(e) => {
                warn!("Speech recognizer restart failed: {}", e);
                self.schedule_restart(e.to_string(), true)
            }
        }
    }

    pub fn handle_voice(&mut self, signal: VoiceSignal) {
        let speaking_now = signal == VoiceSignal::SpeechStart;
        if let CaptureState::Recording { speaking } = &mut self.state {
            *speaking = speaking_now;
        }
        if signal == VoiceSignal::SpeechEnd {
            self.transcript.push_silence();
        }
    }

    // Errors draw from the bounded backoff; natural ends resume after the initial delay.
    fn schedule_restart(&mut self, reason: String, counted: bool) -> Option<Duration> {
        if !self.is_recording() {
            debug!("No restart after stop: {}", reason);
            return None;
        }
        if self.pending_restart {
            return None;
        }

        let delay = if counted {
            match self.backoff.next() {
                Some(delay) => {
                    self.attempts += 1;
                    delay
                }
                None => {
                    error!("Speech capture failed after {} restarts: {}", self.attempts, reason);
                    self.recognizer.stop();
                    self.state = CaptureState::Failed { reason };
                    return None;
                }
            }
        } else {
            self.policy.initial_delay()
        };

        self.pending_restart = true;
        info!("Restarting speech recognizer in {:?}", delay);
        Some(delay)
    }

    fn reset_backoff(&mut self) {
        self.backoff = self.policy.schedule();
        self.attempts = 0;
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, CaptureState::Recording { .. })
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn view(&self) -> TranscriptView {
        TranscriptView {
            text: self.transcript.text().to_string(),
            interim: self.transcript.interim().to_string(),
            state: self.state.clone(),
        }
    }

    /// Async driver. Runs until `inputs` closes, then stops the recognizer and hands itself back.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<SpeechInput>, view: watch::Sender<TranscriptView>) -> Self {
        let mut restart_timer: Option<Pin<Box<Sleep>>> = None;
        view.send_replace(self.view());

        loop {
            tokio::select! {
                input = inputs.recv() => {
                    let Some(input) = input else { break };
                    match input {
                        SpeechInput::Start => {
                            if let Err(e) = self.start() {
                                warn!("Speech capture did not start: {}", e);
                            }
                        }
                        SpeechInput::Stop => {
                            self.stop();
                            restart_timer = None;
                        }
                        SpeechInput::Recognition(event) => {
                            if let Some(delay) = self.handle_recognition(event) {
                                restart_timer = Some(Box::pin(sleep(delay)));
                            }
                        }
                        SpeechInput::Voice(signal) => self.handle_voice(signal),
                    }
                }

                _ = wait_for(&mut restart_timer), if restart_timer.is_some() => {
                    restart_timer = None;
                    if let Some(delay) = self.restart() {
                        restart_timer = Some(Box::pin(sleep(delay)));
                    }
                }
            }

            view.send_replace(self.view());
        }

        self.stop();
        view.send_replace(self.view());
        self
    }
}

async fn wait_for(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
