use std::io::Cursor;

/// One flushed interval of captured audio, as delivered to observers and the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub sample_rate: u32,
    pub samples: usize,
    /// Mono 16-bit PCM WAV bytes. Each chunk is self-contained.
    pub payload: Vec<u8>,
}

impl AudioChunk {
    pub fn encode(samples: &[f32], sample_rate: u32) -> Result<Self, hound::Error> {
        Ok(Self {
            sample_rate,
            samples: samples.len(),
            payload: encode_wav(samples, sample_rate)?,
        })
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples as u64 * 1000) / u64::from(self.sample_rate)
    }
}

pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buf = Vec::with_capacity(44 + samples.len() * 2);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec)?;
        for &sample in samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(buf)
}
