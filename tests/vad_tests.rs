use dentai::audio::{sample_buffer, VoiceActivityDetector, VoiceMonitor, VoiceSignal, WebRtcClassifier};
use dentai::config::VadConfig;
use ringbuf::traits::Producer;
use std::time::Duration;
use tokio::sync::mpsc;

const RATE: u32 = 16000;

fn tone(len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / RATE as f32).sin())
        .collect()
}

#[test]
fn test_energy_detector_frame_geometry() {
    let detector = VoiceActivityDetector::energy(RATE, &VadConfig::default());
    assert_eq!(detector.frame_size(), 480, "30ms at 16kHz");
}

#[test]
fn test_energy_detector_debounces_start_and_end() {
    let mut detector = VoiceActivityDetector::energy(RATE, &VadConfig::default());
    let loud = tone(480, 0.5);
    let quiet = vec![0.0f32; 480];

    // 1. Two loud frames are not enough (90ms = 3 frames)
    assert_eq!(detector.process_frame(&loud), None);
    assert_eq!(detector.process_frame(&loud), None);
    assert_eq!(detector.process_frame(&loud), Some(VoiceSignal::SpeechStart));
    assert!(detector.is_speaking());

    // 2. A short pause does not end speech
    for _ in 0..10 {
        assert_eq!(detector.process_frame(&quiet), None);
    }
    assert_eq!(detector.process_frame(&loud), None);

    // 3. 600ms of silence (20 frames) ends it
    let ends: Vec<_> = (0..20).filter_map(|_| detector.process_frame(&quiet)).collect();
    assert_eq!(ends, vec![VoiceSignal::SpeechEnd]);
    assert!(!detector.is_speaking());
}

#[test]
fn test_process_buffers_partial_frames() {
    let mut detector = VoiceActivityDetector::energy(RATE, &VadConfig::default());
    let loud = tone(480 * 3, 0.5);

    // Odd-sized pieces still add up to three full frames
    let mut signals = detector.process(&loud[..700]);
    assert!(signals.is_empty());
    signals.extend(detector.process(&loud[700..1000]));
    signals.extend(detector.process(&loud[1000..]));
    assert_eq!(signals, vec![VoiceSignal::SpeechStart]);

    detector.reset();
    assert!(!detector.is_speaking());
}

#[test]
fn test_webrtc_classifier_rates() {
    assert!(WebRtcClassifier::new(44100).is_none());

    let classifier = WebRtcClassifier::new(RATE).unwrap();
    let mut detector = VoiceActivityDetector::new(classifier, RATE, &VadConfig::default());
    let silence = vec![0.0f32; 480 * 10];
    assert!(detector.process(&silence).is_empty());
    assert!(!detector.is_speaking());
}

#[tokio::test]
async fn test_voice_monitor_forwards_signals() {
    // 1. Setup: buffer pre-filled with speech then silence
    let (mut producer, consumer) = sample_buffer(RATE as usize * 2);
    let mut samples = tone(480 * 5, 0.5);
    samples.extend(vec![0.0f32; 480 * 25]);
    assert_eq!(producer.push_slice(&samples), samples.len());

    let (tx, mut rx) = mpsc::channel::<VoiceSignal>(10);
    let monitor = VoiceMonitor::spawn(consumer, || VoiceActivityDetector::energy(RATE, &VadConfig::default()), tx).unwrap();

    // 2. Verify
    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    assert_eq!(first, Some(VoiceSignal::SpeechStart));
    assert_eq!(second, Some(VoiceSignal::SpeechEnd));

    // 3. Teardown joins the thread
    monitor.stop();
}
