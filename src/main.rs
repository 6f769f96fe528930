use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime};
use dentai::audio::{sample_buffer, AudioStreamer, CaptureEvent, Microphone, VoiceActivityDetector, VoiceMonitor};
use dentai::chart::{ChartCommand, ChartLayout, Surface, ToothId};
use dentai::config::Config;
use dentai::patient::{Patient, PatientRecord};
use dentai::session::ExamSession;
use dentai::speech::{
    RecognitionEvent, RecognitionOptions, RecognitionResult, RecognizerError, SpeechCapture, SpeechInput,
    SpeechRecognizer, TranscriptView,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const SCHEDULE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Stand-in engine for the console: `say` lines become final results while listening.
struct ConsoleRecognizer {
    listening: Arc<AtomicBool>,
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn configure(&mut self, options: &RecognitionOptions) {
        tracing::debug!("Console recognizer configured: {:?}", options);
    }

    fn start(&mut self) -> Result<(), RecognizerError> {
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Config + Session
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    tracing::info!("Audio endpoint: {}, speech language: {}", config.audio.endpoint, config.speech.language);

    let today = Local::now().date_naive();
    let mut session = ExamSession::with_patient(demo_patient(today)?);

    // 3. Audio Streaming
    let (mut streamer, mut capture_events) = AudioStreamer::new(config.audio.clone(), Microphone::default());
    tokio::spawn(async move {
        while let Some(event) = capture_events.recv().await {
            match event {
                CaptureEvent::Chunk(chunk) => {
                    tracing::debug!("Audio chunk: {} samples ({} ms)", chunk.samples, chunk.duration_ms())
                }
                CaptureEvent::Error(e) => tracing::warn!("Audio streaming: {}", e),
                other => tracing::info!("Audio streaming: {:?}", other),
            }
        }
    });
    let mut voice_monitor: Option<VoiceMonitor> = None;

    // 4. Speech Capture
    let listening = Arc::new(AtomicBool::new(false));
    let recognizer = ConsoleRecognizer {
        listening: listening.clone(),
    };
    let (speech_tx, speech_rx) = mpsc::channel::<SpeechInput>(100);
    let (view_tx, mut view_rx) = watch::channel(TranscriptView::default());
    let capture = SpeechCapture::new(recognizer, &config.speech);
    let speech_task = tokio::spawn(capture.run(speech_rx, view_tx));

    // 5. Console Loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Commands: tooth <n>, surface <name|full>, condition <name>, mark, whole, clear,");
    println!("          plan, show, schedule <tooth> <surface> <YYYY-MM-DDTHH:MM>, note <text>,");
    println!("          record start|stop, dictate start|stop, say <text>, quit");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
                let rest = rest.trim();
                match verb.to_ascii_lowercase().as_str() {
                    "quit" | "exit" => break,
                    "plan" => print_plan(&session),
                    "show" => print_chart(&session),
                    "schedule" => match parse_schedule(rest) {
                        Ok((tooth, surface, at)) => match session.schedule_treatment(tooth, surface, at, today) {
                            Ok(appointment) => println!("Scheduled {} {} at {} (reminder {})", tooth, surface, appointment.at, appointment.reminder),
                            Err(e) => println!("Cannot schedule: {}", e),
                        },
                        Err(e) => println!("{:#}", e),
                    },
                    "note" => match session.patient_mut().map(|record| record.add_note(rest, today)) {
                        Some(true) => println!("Note saved"),
                        Some(false) => println!("Empty note ignored"),
                        None => println!("No patient loaded"),
                    },
                    "record" => match rest {
                        "start" if streamer.is_recording() => println!("Already recording"),
                        "start" => {
                            let (producer, consumer) = sample_buffer(config.audio.buffer_samples);
                            streamer.source_mut().tap(producer);
                            match streamer.start() {
                                Ok(id) => {
                                    println!("Recording session {}", id);
                                    if let Some(rate) = streamer.sample_rate() {
                                        let vad = config.vad.clone();
                                        let detector = move || VoiceActivityDetector::energy(rate, &vad);
                                        match VoiceMonitor::spawn(consumer, detector, speech_tx.clone()) {
                                            Ok(monitor) => voice_monitor = Some(monitor),
                                            Err(e) => tracing::warn!("Voice monitor unavailable: {}", e),
                                        }
                                    }
                                }
                                Err(e) => println!("Recording failed: {}", e),
                            }
                        }
                        "stop" => {
                            if let Some(monitor) = voice_monitor.take() {
                                monitor.stop();
                            }
                            streamer.stop().await;
                            println!("Recording stopped");
                        }
                        _ => println!("usage: record start|stop"),
                    },
                    "dictate" => {
                        let input = match rest {
                            "start" => SpeechInput::Start,
                            "stop" => SpeechInput::Stop,
                            _ => {
                                println!("usage: dictate start|stop");
                                continue;
                            }
                        };
                        speech_tx.send(input).await.context("speech capture task ended")?;
                    }
                    "say" => {
                        if !listening.load(Ordering::SeqCst) {
                            println!("Dictation is off (dictate start)");
                            continue;
                        }
                        let event = RecognitionEvent::Results {
                            result_index: 0,
                            results: vec![RecognitionResult::final_(rest)],
                        };
                        speech_tx.send(event.into()).await.context("speech capture task ended")?;
                    }
                    _ => match line.parse::<ChartCommand>() {
                        Ok(command) => {
                            session.dispatch(command);
                        }
                        Err(e) => println!("{}", e),
                    },
                }
            }

            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow_and_update().clone();
                if session.sync_transcript(&view.text) > 0 {
                    println!("[DICTATION] {}", session.transcript().trim_end());
                }
                if !view.interim.is_empty() {
                    println!("[INTERIM] {}", view.interim);
                }
            }
        }
    }

    // 6. Teardown
    if let Some(monitor) = voice_monitor.take() {
        monitor.stop();
    }
    streamer.stop().await;
    drop(speech_tx);
    if let Ok(capture) = speech_task.await {
        session.sync_transcript(capture.transcript().text());
    }

    print_plan(&session);
    tracing::info!("Session closed");
    Ok(())
}

fn demo_patient(today: NaiveDate) -> anyhow::Result<PatientRecord> {
    let date_of_birth = NaiveDate::from_ymd_opt(1985, 4, 12).context("invalid birth date")?;
    Ok(PatientRecord::new(Patient {
        id: "P-0001".to_string(),
        name: "Jan Kowalski".to_string(),
        date_of_birth,
        last_visit: today,
    }))
}

fn parse_schedule(args: &str) -> anyhow::Result<(ToothId, Surface, NaiveDateTime)> {
    let mut parts = args.split_whitespace();
    let (Some(tooth), Some(surface), Some(at)) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("usage: schedule <tooth> <surface> <YYYY-MM-DDTHH:MM>");
    };
    let tooth = tooth.parse::<ToothId>()?;
    let surface = surface.parse::<Surface>()?;
    let at = NaiveDateTime::parse_from_str(at, SCHEDULE_FORMAT).with_context(|| format!("invalid date/time '{}'", at))?;
    Ok((tooth, surface, at))
}

fn print_plan(session: &ExamSession) {
    let plan = session.plan();
    if plan.is_empty() {
        println!("Treatment plan: nothing to treat");
        return;
    }
    println!("Treatment plan:");
    for entry in session.scheduled_plan() {
        let t = &entry.treatment;
        let when = entry
            .appointment
            .map(|a| format!("  @ {}", a.at))
            .unwrap_or_default();
        println!("  #{:<2} {:<10} {:<10} {:>6}  {}{}", t.tooth, t.surface, t.condition, t.price, t.description, when);
    }
    println!("  Total: {}", plan.total());
}

fn print_chart(session: &ExamSession) {
    let chart = session.chart();
    let rows = ChartLayout::standard().rows();
    for row in rows.iter() {
        let cells: Vec<String> = row
            .iter()
            .map(|&id| {
                let marked = if chart.tooth(id).is_unmarked() { ' ' } else { '*' };
                if chart.is_selected(id) {
                    format!("[{:>2}{}]", id, marked)
                } else {
                    format!(" {:>2}{} ", id, marked)
                }
            })
            .collect();
        println!("{}", cells.join(""));
    }
    println!(
        "Selected: tooth {:?}, surface {}, condition {}",
        chart.selected_tooth().map(|t| t.get()),
        chart
            .selected_surface()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string()),
        chart.selected_condition()
    );
}
