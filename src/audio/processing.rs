use ringbuf::traits::{Consumer, Observer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::vad::{FrameClassifier, VoiceActivityDetector, VoiceSignal};

/// Runs voice-activity detection over a sample buffer on a dedicated thread.
pub struct VoiceMonitor {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl VoiceMonitor {
    /// The detector is built on the monitor thread since WebRTC state cannot cross threads.
    pub fn spawn<C, F, T, M>(consumer: C, make_detector: M, tx: mpsc::Sender<T>) -> std::io::Result<Self>
    where
        C: Consumer<Item = f32> + Send + 'static,
        F: FrameClassifier,
        T: From<VoiceSignal> + Send + 'static,
        M: FnOnce() -> VoiceActivityDetector<F> + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let thread = std::thread::Builder::new()
            .name("voice-monitor".to_string())
            .spawn(move || run(consumer, make_detector(), tx, flag))?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("Voice monitor thread panicked");
            }
        }
    }
}

impl Drop for VoiceMonitor {
    fn drop(&mut self) {
        self.halt();
    }
}

fn run<C, F, T>(mut consumer: C, mut detector: VoiceActivityDetector<F>, tx: mpsc::Sender<T>, shutdown: Arc<AtomicBool>)
where
    C: Consumer<Item = f32>,
    F: FrameClassifier,
    T: From<VoiceSignal>,
{
    let frame_size = detector.frame_size();
    let mut frame = vec![0.0f32; frame_size];
    info!("Voice monitor started. Frame: {} samples", frame_size);

    while !shutdown.load(Ordering::SeqCst) {
        // Wait for a full frame
        if consumer.occupied_len() < frame_size {
            std::thread::sleep(Duration::from_millis(10));
            continue;
        }
        let _ = consumer.pop_slice(&mut frame);

        if let Some(signal) = detector.process_frame(&frame) {
            info!("Voice activity: {:?}", signal);
            if tx.blocking_send(T::from(signal)).is_err() {
                debug!("Voice signal receiver closed");
                break;
            }
        }
    }

    info!("Voice monitor stopped");
}
