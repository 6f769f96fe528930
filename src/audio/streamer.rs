use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use ringbuf::traits::{Consumer, Observer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::capture::{sample_buffer, AudioSource, InputStream, SampleConsumer};
use super::chunk::AudioChunk;
use super::CaptureError;
use crate::config::AudioConfig;

/// Unread chunks an observer may fall behind before new chunks are dropped.
const CHUNK_BACKLOG: usize = 100;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle and data notifications of a streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Started { session: Uuid },
    Chunk(AudioChunk),
    Connected,
    Disconnected,
    /// Transport failure. Capture keeps running.
    Error(String),
    Stopped { session: Uuid },
}

/// Observer side of a streamer's events.
///
/// Lifecycle events are always delivered. New chunks are dropped while
/// `CHUNK_BACKLOG` earlier chunks are still waiting unread.
pub struct CaptureEvents {
    rx: mpsc::UnboundedReceiver<CaptureEvent>,
    queued_chunks: Arc<AtomicUsize>,
}

impl CaptureEvents {
    pub async fn recv(&mut self) -> Option<CaptureEvent> {
        let event = self.rx.recv().await?;
        Some(self.received(event))
    }

    pub fn try_recv(&mut self) -> Result<CaptureEvent, mpsc::error::TryRecvError> {
        let event = self.rx.try_recv()?;
        Ok(self.received(event))
    }

    fn received(&self, event: CaptureEvent) -> CaptureEvent {
        if matches!(event, CaptureEvent::Chunk(_)) {
            self.queued_chunks.fetch_sub(1, Ordering::SeqCst);
        }
        event
    }
}

#[derive(Clone)]
struct EventSink {
    tx: mpsc::UnboundedSender<CaptureEvent>,
    queued_chunks: Arc<AtomicUsize>,
}

impl EventSink {
    fn channel() -> (Self, CaptureEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queued_chunks = Arc::new(AtomicUsize::new(0));
        let sink = Self {
            tx,
            queued_chunks: queued_chunks.clone(),
        };
        (sink, CaptureEvents { rx, queued_chunks })
    }

    fn lifecycle(&self, event: CaptureEvent) {
        if self.tx.send(event).is_err() {
            debug!("Capture observer gone");
        }
    }

    // Never block the capture path on a slow observer
    fn chunk(&self, chunk: AudioChunk) {
        let admitted = self
            .queued_chunks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < CHUNK_BACKLOG).then_some(n + 1))
            .is_ok();
        if !admitted {
            debug!("Capture observer lagging, chunk dropped");
            return;
        }
        if self.tx.send(CaptureEvent::Chunk(chunk)).is_err() {
            self.queued_chunks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Streams microphone audio to a WebSocket endpoint in fixed-interval chunks.
///
/// The streamer exclusively owns the input device and the socket for the
/// duration of a session. Both are released on `stop`, and on drop.
pub struct AudioStreamer<S: AudioSource> {
    config: AudioConfig,
    source: S,
    events: EventSink,
    connected: Arc<AtomicBool>,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    session: Uuid,
    input: Box<dyn InputStream>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<S: AudioSource> AudioStreamer<S> {
    pub fn new(config: AudioConfig, source: S) -> (Self, CaptureEvents) {
        let (events, rx) = EventSink::channel();
        let streamer = Self {
            config,
            source,
            events,
            connected: Arc::new(AtomicBool::new(false)),
            active: None,
        };
        (streamer, rx)
    }

    /// Acquire the input and begin streaming. Must be called inside a tokio runtime.
    ///
    /// A source failure is returned as-is and nothing starts. Connecting to the
    /// endpoint happens in the background and never fails the start.
    pub fn start(&mut self) -> Result<Uuid, CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CaptureError::NoRuntime)?;

        let (producer, consumer) = sample_buffer(self.config.buffer_samples);
        let input = self.source.open(producer)?;

        let session = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.events.lifecycle(CaptureEvent::Started { session });

        let link = StreamLink {
            endpoint: self.config.endpoint.clone(),
            flush_interval: self.config.flush_interval(),
            sample_rate: input.sample_rate(),
            events: self.events.clone(),
            connected: self.connected.clone(),
            cancel: cancel.clone(),
        };
        let task = runtime.spawn(link.run(consumer));

        info!("Audio capture {} started at {}Hz", session, input.sample_rate());
        self.active = Some(ActiveCapture {
            session,
            input,
            cancel,
            task,
        });
        Ok(session)
    }

    /// Release the device, flush the last partial chunk, close the socket.
    /// No-op when idle.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        drop(active.input);
        active.cancel.cancel();
        if let Err(e) = active.task.await {
            warn!("Audio stream task ended abnormally: {}", e);
        }

        info!("Audio capture {} stopped", active.session);
        self.events.lifecycle(CaptureEvent::Stopped { session: active.session });
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn session(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.session)
    }

    /// Rate of the acquired input while recording.
    pub fn sample_rate(&self) -> Option<u32> {
        self.active.as_ref().map(|a| a.input.sample_rate())
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: AudioSource> Drop for AudioStreamer<S> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Audio capture {} torn down without stop", active.session);
            drop(active.input);
            active.cancel.cancel();
        }
    }
}

struct Connection {
    write: SplitSink<Socket, Message>,
    read: SplitStream<Socket>,
}

/// Everything the background task owns: endpoint link, flush timer, buffer reader.
struct StreamLink {
    endpoint: String,
    flush_interval: Duration,
    sample_rate: u32,
    events: EventSink,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl StreamLink {
    async fn run(self, mut consumer: SampleConsumer) {
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let connect = connect_async(self.endpoint.clone());
        tokio::pin!(connect);
        let mut connecting = true;
        let mut connection: Option<Connection> = None;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                result = &mut connect, if connecting => {
                    connecting = false;
                    match result {
                        Ok((socket, _response)) => {
                            let (write, read) = socket.split();
                            connection = Some(Connection { write, read });
                            self.connected.store(true, Ordering::SeqCst);
                            info!("Audio endpoint connected: {}", self.endpoint);
                            self.events.lifecycle(CaptureEvent::Connected);
                        }
                        Err(e) => {
                            warn!("Audio endpoint {} unreachable: {}", self.endpoint, e);
                            self.events.lifecycle(CaptureEvent::Error(e.to_string()));
                        }
                    }
                }

                frame = next_frame(&mut connection), if connection.is_some() => {
                    match frame {
                        Some(Ok(Message::Close(_))) | None => self.drop_connection(&mut connection, None),
                        Some(Err(e)) => self.drop_connection(&mut connection, Some(e.to_string())),
                        // The endpoint does not acknowledge chunks
                        Some(Ok(_)) => {}
                    }
                }

                _ = ticker.tick() => self.flush(&mut consumer, &mut connection).await,
            }
        }

        self.flush(&mut consumer, &mut connection).await;

        if let Some(mut conn) = connection.take() {
            if let Err(e) = conn.write.close().await {
                debug!("Audio endpoint close: {}", e);
            }
            self.connected.store(false, Ordering::SeqCst);
            self.events.lifecycle(CaptureEvent::Disconnected);
        }
    }

    async fn flush(&self, consumer: &mut SampleConsumer, connection: &mut Option<Connection>) {
        let available = consumer.occupied_len();
        if available == 0 {
            return;
        }

        let mut samples = vec![0.0f32; available];
        let read = consumer.pop_slice(&mut samples);
        samples.truncate(read);

        let chunk = match AudioChunk::encode(&samples, self.sample_rate) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Failed to encode audio chunk: {}", e);
                return;
            }
        };

        if let Some(conn) = connection.as_mut() {
            let frame = Message::Binary(chunk.payload.clone().into());
            if let Err(e) = conn.write.send(frame).await {
                self.drop_connection(connection, Some(e.to_string()));
            }
        }

        self.events.chunk(chunk);
    }

    fn drop_connection(&self, connection: &mut Option<Connection>, error: Option<String>) {
        if connection.take().is_none() {
            return;
        }
        self.connected.store(false, Ordering::SeqCst);
        match error {
            Some(e) => {
                warn!("Audio endpoint lost: {}", e);
                self.events.lifecycle(CaptureEvent::Error(e));
            }
            None => info!("Audio endpoint closed the connection"),
        }
        self.events.lifecycle(CaptureEvent::Disconnected);
    }
}

async fn next_frame(connection: &mut Option<Connection>) -> Option<Result<Message, tungstenite::Error>> {
    match connection {
        Some(conn) => conn.read.next().await,
        None => std::future::pending().await,
    }
}
