use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{error, info};

use super::CaptureError;

pub type SampleProducer = HeapProd<f32>;
pub type SampleConsumer = HeapCons<f32>;

/// Lossy single-producer buffer between the device callback and its reader.
pub fn sample_buffer(capacity: usize) -> (SampleProducer, SampleConsumer) {
    HeapRb::<f32>::new(capacity.max(1)).split()
}

/// An acquired input. Dropping it releases the device.
pub trait InputStream {
    fn sample_rate(&self) -> u32;
}

/// Something that can hand out exclusive mono sample streams.
pub trait AudioSource {
    fn open(&mut self, producer: SampleProducer) -> Result<Box<dyn InputStream>, CaptureError>;
}

/// Default input device of the default cpal host.
pub struct Microphone {
    /// Tried in order; 16 kHz first since every VAD mode accepts it.
    pub preferred_rates: Vec<u32>,
    monitor: Option<SampleProducer>,
}

impl Microphone {
    /// Mirror the next opened stream into a second buffer (voice monitoring).
    pub fn tap(&mut self, producer: SampleProducer) {
        self.monitor = Some(producer);
    }
}

impl Default for Microphone {
    fn default() -> Self {
        Self {
            preferred_rates: vec![16000, 48000, 32000, 8000],
            monitor: None,
        }
    }
}

pub struct MicrophoneInput {
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl InputStream for MicrophoneInput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for MicrophoneInput {
    fn drop(&mut self) {
        info!("Microphone released");
    }
}

impl AudioSource for Microphone {
    fn open(&mut self, mut producer: SampleProducer) -> Result<Box<dyn InputStream>, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        info!("Audio Input Device: {}", device.name().unwrap_or_default());

        let mut selected = None;
        'rates: for &rate in &self.preferred_rates {
            let ranges = device
                .supported_input_configs()
                .map_err(|e| CaptureError::Device(e.to_string()))?;
            for range in ranges {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some(range.with_sample_rate(cpal::SampleRate(rate)));
                    break 'rates;
                }
            }
        }

        let supported = match selected {
            Some(config) => config,
            None => device
                .default_input_config()
                .map_err(|e| CaptureError::Device(e.to_string()))?,
        };

        let sample_rate = supported.sample_rate().0;
        let channels = usize::from(supported.channels().max(1));
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();

        info!("Audio Config Selected: Rate={}Hz, Channels={}, Format={:?}", sample_rate, channels, sample_format);

        let err_fn = |err| error!("an error occurred on input stream: {}", err);
        let mut monitor = self.monitor.take();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &_| push_mono(data, channels, &mut producer, monitor.as_mut(), |s| s),
                err_fn,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &_| {
                    push_mono(data, channels, &mut producer, monitor.as_mut(), |s| s as f32 / i16::MAX as f32)
                },
                err_fn,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &_| {
                    push_mono(data, channels, &mut producer, monitor.as_mut(), |s| (s as f32 - 32768.0) / 32768.0)
                },
                err_fn,
                None,
            ),
            other => return Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
        }
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            other => CaptureError::Device(other.to_string()),
        })?;

        stream
            .play()
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        Ok(Box::new(MicrophoneInput {
            _stream: stream,
            sample_rate,
        }))
    }
}

/// Downmix interleaved frames to mono. Drops samples when a buffer is full.
fn push_mono<T, P>(input: &[T], channels: usize, producer: &mut P, mut monitor: Option<&mut P>, to_f32: impl Fn(T) -> f32)
where
    T: Copy,
    P: Producer<Item = f32>,
{
    for frame in input.chunks(channels) {
        let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
        let sample = sum / frame.len() as f32;
        let _ = producer.try_push(sample);
        if let Some(monitor) = monitor.as_mut() {
            let _ = monitor.try_push(sample);
        }
    }
}
