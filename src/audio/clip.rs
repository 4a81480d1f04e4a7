use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rodio::{Decoder, Source};

use crate::error::AppError;

/// Interleaved f32 audio with a lazily rendered 16-bit WAV copy.
#[derive(Clone)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub channels: u16,
    samples: Vec<f32>,
    wav_bytes: Option<Arc<Vec<u8>>>,
}

impl AudioClip {
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
            wav_bytes: None,
        }
    }

    /// Decode a synthesized payload (WAV, MP3, ...). The original bytes are
    /// kept only when they are already WAV.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, AppError> {
        if is_wav(&bytes) {
            let mut clip = read_wav(&bytes)?;
            clip.wav_bytes = Some(Arc::new(bytes));
            return Ok(clip);
        }
        let decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|err| AppError::Audio(format!("Failed to decode audio stream: {err}")))?;
        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();
        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
        Ok(Self::from_samples(samples, sample_rate, channels))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.samples.is_empty() || self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }

    pub fn wav_bytes(&mut self) -> Result<Arc<Vec<u8>>, AppError> {
        if let Some(bytes) = &self.wav_bytes {
            return Ok(bytes.clone());
        }
        let rendered = Arc::new(render_wav(&self.samples, self.sample_rate, self.channels)?);
        self.wav_bytes = Some(rendered.clone());
        Ok(rendered)
    }
}

pub(crate) fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

fn read_wav(bytes: &[u8]) -> Result<AudioClip, AppError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .context("Failed to parse WAV data")
        .map_err(AppError::from)?;
    let spec = reader.spec();
    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|res| res.unwrap_or(0.0))
            .collect(),
        (hound::SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|res| res.unwrap_or(0) as f32 / i8::MAX as f32)
            .collect(),
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|res| res.unwrap_or(0) as f32 / i16::MAX as f32)
            .collect(),
        (hound::SampleFormat::Int, bits @ (24 | 32)) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|res| res.unwrap_or(0) as f32 / scale)
                .collect()
        }
        (_, other) => {
            return Err(AppError::Audio(format!(
                "Unsupported PCM bit depth: {other}"
            )));
        }
    };
    Ok(AudioClip::from_samples(samples, spec.sample_rate, spec.channels))
}

pub(crate) fn render_wav(
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, AppError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .context("Failed to create WAV writer")
            .map_err(AppError::from)?;
        for sample in samples {
            let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(scaled)
                .context("Failed writing WAV sample")
                .map_err(AppError::from)?;
        }
        writer
            .finalize()
            .context("Failed finalising WAV payload")
            .map_err(AppError::from)?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_wav_decodes_back() {
        let samples: Vec<f32> = (0..1600).map(|i| ((i as f32) * 0.01).sin() * 0.5).collect();
        let mut clip = AudioClip::from_samples(samples, 16_000, 1);
        let bytes = clip.wav_bytes().unwrap();
        assert!(is_wav(&bytes));

        let decoded = AudioClip::decode((*bytes).clone()).unwrap();
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples().len(), 1600);
        assert_eq!(decoded.duration(), Duration::from_millis(100));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(AudioClip::decode(b"definitely not audio".to_vec()).is_err());
    }

    #[test]
    fn empty_clip_has_no_duration() {
        let clip = AudioClip::from_samples(Vec::new(), 16_000, 1);
        assert!(clip.is_empty());
        assert_eq!(clip.duration(), Duration::ZERO);
    }
}
