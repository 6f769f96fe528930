use dentai::audio::{
    AudioChunk, AudioSource, AudioStreamer, CaptureError, CaptureEvent, CaptureEvents, InputStream, SampleProducer,
};
use dentai::config::AudioConfig;
use futures_util::StreamExt;
use ringbuf::traits::Producer;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const RATE: u32 = 16000;

/// Pushes a quiet ramp from a background thread until the handle is dropped.
struct FakeSource {
    fail: Option<CaptureError>,
    opened: usize,
    /// Handles handed out and not yet dropped.
    live: Arc<AtomicUsize>,
}

struct FakeInput {
    running: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
}

impl InputStream for FakeInput {
    fn sample_rate(&self) -> u32 {
        RATE
    }
}

impl Drop for FakeInput {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AudioSource for FakeSource {
    fn open(&mut self, mut producer: SampleProducer) -> Result<Box<dyn InputStream>, CaptureError> {
        if let Some(err) = self.fail.clone() {
            return Err(err);
        }
        self.opened += 1;
        self.live.fetch_add(1, Ordering::SeqCst);

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        std::thread::spawn(move || {
            let block: Vec<f32> = (0..160).map(|i| i as f32 / 1600.0).collect();
            while flag.load(Ordering::SeqCst) {
                let _ = producer.push_slice(&block);
                std::thread::sleep(Duration::from_millis(10));
            }
        });
        Ok(Box::new(FakeInput {
            running,
            live: self.live.clone(),
        }))
    }
}

fn working_source() -> FakeSource {
    FakeSource {
        fail: None,
        opened: 0,
        live: Arc::new(AtomicUsize::new(0)),
    }
}

fn config(endpoint: String) -> AudioConfig {
    AudioConfig {
        endpoint,
        flush_interval_ms: 100,
        ..AudioConfig::default()
    }
}

struct Endpoint {
    addr: SocketAddr,
    frames: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Fires when the client sends a Close frame.
    closed: oneshot::Receiver<()>,
}

/// Accepts one WebSocket client and forwards every binary frame.
async fn spawn_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, frames) = mpsc::unbounded_channel();
    let (close_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Binary(data) => {
                    let _ = tx.send(data.to_vec());
                }
                Message::Close(_) => {
                    let _ = close_tx.send(());
                    break;
                }
                _ => {}
            }
        }
    });

    Endpoint { addr, frames, closed }
}

async fn next_event(rx: &mut CaptureEvents) -> CaptureEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for capture event")
        .expect("event channel closed")
}

async fn wait_for(rx: &mut CaptureEvents, pred: impl Fn(&CaptureEvent) -> bool) -> Vec<CaptureEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = pred(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[tokio::test]
async fn test_chunks_reach_observer_and_endpoint() {
    // 1. Setup
    let mut endpoint = spawn_endpoint().await;
    let source = working_source();
    let live = source.live.clone();
    let (mut streamer, mut events) = AudioStreamer::new(config(format!("ws://{}", endpoint.addr)), source);

    // 2. Start
    let session = streamer.start().unwrap();
    assert!(streamer.is_recording());
    assert_eq!(streamer.sample_rate(), Some(RATE));
    assert_eq!(next_event(&mut events).await, CaptureEvent::Started { session });

    wait_for(&mut events, |e| *e == CaptureEvent::Connected).await;
    assert!(streamer.is_connected());

    let seen = wait_for(&mut events, |e| matches!(e, CaptureEvent::Chunk(_))).await;
    let Some(CaptureEvent::Chunk(chunk)) = seen.last() else {
        panic!("expected a chunk");
    };
    assert_eq!(chunk.sample_rate, RATE);
    assert!(chunk.samples > 0);
    assert_eq!(&chunk.payload[..4], b"RIFF");

    // 3. Endpoint receives the same WAV frames
    let frame = tokio::time::timeout(Duration::from_secs(5), endpoint.frames.recv()).await.unwrap().unwrap();
    assert_eq!(&frame[..4], b"RIFF");
    assert_eq!(&frame[8..12], b"WAVE");

    // 4. Stop: disconnect, then stopped
    streamer.stop().await;
    assert!(!streamer.is_recording());
    assert!(!streamer.is_connected());
    let tail = wait_for(&mut events, |e| matches!(e, CaptureEvent::Stopped { .. })).await;
    assert!(tail.contains(&CaptureEvent::Disconnected));
    assert_eq!(tail.last(), Some(&CaptureEvent::Stopped { session }));

    // 5. Device released, socket closed
    assert_eq!(live.load(Ordering::SeqCst), 0, "Input handle released on stop");
    tokio::time::timeout(Duration::from_secs(5), endpoint.closed)
        .await
        .expect("endpoint never saw Close")
        .unwrap();

    println!("Tail events: {}", tail.len());
}

#[tokio::test]
async fn test_unreachable_endpoint_keeps_capturing() {
    // A port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (mut streamer, mut events) = AudioStreamer::new(config(format!("ws://{}", addr)), working_source());
    streamer.start().unwrap();

    let seen = wait_for(&mut events, |e| matches!(e, CaptureEvent::Error(_))).await;
    assert!(!seen.contains(&CaptureEvent::Connected));
    assert!(!streamer.is_connected());

    // Chunks still flow to the observer
    wait_for(&mut events, |e| matches!(e, CaptureEvent::Chunk(_))).await;
    assert!(streamer.is_recording());

    streamer.stop().await;
    let tail = wait_for(&mut events, |e| matches!(e, CaptureEvent::Stopped { .. })).await;
    assert!(!tail.contains(&CaptureEvent::Disconnected), "Never connected, nothing to disconnect");
}

#[tokio::test]
async fn test_source_failure_fails_start() {
    let source = FakeSource {
        fail: Some(CaptureError::NoInputDevice),
        ..working_source()
    };
    let (mut streamer, mut events) = AudioStreamer::new(config("ws://127.0.0.1:1".to_string()), source);

    assert_eq!(streamer.start(), Err(CaptureError::NoInputDevice));
    assert!(!streamer.is_recording());
    assert_eq!(streamer.session(), None);
    assert!(events.try_recv().is_err(), "Nothing started, nothing emitted");
}

#[tokio::test]
async fn test_double_start_and_idle_stop() {
    let endpoint = spawn_endpoint().await;
    let (mut streamer, mut events) = AudioStreamer::new(config(format!("ws://{}", endpoint.addr)), working_source());

    // Stopping while idle is a no-op
    streamer.stop().await;
    assert!(events.try_recv().is_err());

    streamer.start().unwrap();
    assert_eq!(streamer.start(), Err(CaptureError::AlreadyRecording));
    assert_eq!(streamer.source_mut().opened, 1, "Second start never touched the device");

    streamer.stop().await;
    assert!(!streamer.is_recording());
}

#[tokio::test]
async fn test_drop_without_stop_releases_device_and_socket() {
    // 1. Setup: connected session
    let endpoint = spawn_endpoint().await;
    let source = working_source();
    let live = source.live.clone();
    let (mut streamer, mut events) = AudioStreamer::new(config(format!("ws://{}", endpoint.addr)), source);
    streamer.start().unwrap();
    wait_for(&mut events, |e| *e == CaptureEvent::Connected).await;
    assert_eq!(live.load(Ordering::SeqCst), 1);

    // 2. Teardown without stop
    drop(streamer);

    // 3. Verify
    assert_eq!(live.load(Ordering::SeqCst), 0, "Input handle released on drop");
    tokio::time::timeout(Duration::from_secs(5), endpoint.closed)
        .await
        .expect("endpoint never saw Close")
        .unwrap();
    wait_for(&mut events, |e| *e == CaptureEvent::Disconnected).await;
}

#[tokio::test]
async fn test_lagging_observer_still_gets_lifecycle_events() {
    // 1. Setup: flush every 1ms, observer does not read
    let endpoint = spawn_endpoint().await;
    let audio = AudioConfig {
        flush_interval_ms: 1,
        ..config(format!("ws://{}", endpoint.addr))
    };
    let (mut streamer, mut events) = AudioStreamer::new(audio, working_source());
    let session = streamer.start().unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // 2. Stop while far behind
    streamer.stop().await;

    // 3. Drain everything
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    let chunks = seen.iter().filter(|e| matches!(e, CaptureEvent::Chunk(_))).count();
    assert!(chunks > 0);
    assert!(chunks <= 100, "Backlog capped, got {} chunks", chunks);
    assert_eq!(seen.first(), Some(&CaptureEvent::Started { session }));
    assert!(seen.contains(&CaptureEvent::Connected));
    assert!(seen.contains(&CaptureEvent::Disconnected));
    assert_eq!(seen.last(), Some(&CaptureEvent::Stopped { session }));
}

#[test]
fn test_start_outside_runtime_fails() {
    let (mut streamer, _events) = AudioStreamer::new(config("ws://127.0.0.1:1".to_string()), working_source());
    assert_eq!(streamer.start(), Err(CaptureError::NoRuntime));
    assert_eq!(streamer.source_mut().opened, 0);
}

#[test]
fn test_chunk_encoding() {
    let samples = vec![0.25f32; 1600];
    let chunk = AudioChunk::encode(&samples, RATE).unwrap();

    assert_eq!(chunk.samples, 1600);
    assert_eq!(chunk.duration_ms(), 100);
    // 44-byte header plus 16-bit mono PCM
    assert_eq!(chunk.payload.len(), 44 + 1600 * 2);
}
