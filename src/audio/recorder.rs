use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;

use crate::audio::AudioClip;
use crate::error::AppError;

const PREFERRED_SAMPLE_RATE: u32 = 16_000;

/// Microphone capture on the default input device. The cpal stream is not
/// `Send`, so a recorder lives and dies on one thread.
pub struct Recorder {
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    _stream: cpal::Stream,
    shared: Arc<CaptureBuffer>,
    sample_rate: u32,
    channels: u16,
    started: Instant,
}

#[derive(Default)]
struct CaptureBuffer {
    samples: Mutex<Vec<f32>>,
    level_bits: AtomicU32,
    error: Mutex<Option<String>>,
}

impl CaptureBuffer {
    fn take_level(&self) -> f32 {
        f32::from_bits(self.level_bits.swap(0, Ordering::Relaxed))
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn start(&mut self) -> Result<(), AppError> {
        if self.active.is_some() {
            return Ok(());
        }

        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| AppError::Audio("No default input device available".into()))?;
        let supported = pick_input_config(&device)?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let shared = Arc::new(CaptureBuffer::default());

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, &shared),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, &shared),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, &shared),
            cpal::SampleFormat::I8 => build_stream::<i8>(&device, &config, &shared),
            cpal::SampleFormat::U8 => build_stream::<u8>(&device, &config, &shared),
            other => {
                return Err(AppError::Audio(format!(
                    "Unsupported sample format: {other:?}"
                )))
            }
        }?;
        stream
            .play()
            .context("Failed to start audio stream")
            .map_err(AppError::from)?;

        log::debug!(
            "Capturing {} Hz x{} ({sample_format:?})",
            config.sample_rate.0,
            config.channels
        );
        self.active = Some(ActiveCapture {
            _stream: stream,
            shared,
            sample_rate: config.sample_rate.0,
            channels: config.channels,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Stop capturing and hand back what was recorded, if anything.
    pub fn stop(&mut self) -> Result<Option<AudioClip>, AppError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        let ActiveCapture {
            _stream: stream,
            shared,
            sample_rate,
            channels,
            ..
        } = active;
        drop(stream);

        if let Some(err) = shared.error.lock().take() {
            return Err(AppError::Audio(err));
        }
        let samples = std::mem::take(&mut *shared.samples.lock());
        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(AudioClip::from_samples(samples, sample_rate, channels)))
    }

    /// Peak amplitude since the previous call, 0.0..=1.0.
    pub fn current_level(&self) -> f32 {
        self.active
            .as_ref()
            .map(|active| active.shared.take_level())
            .unwrap_or(0.0)
    }

    pub fn elapsed(&self) -> Duration {
        self.active
            .as_ref()
            .map(|active| active.started.elapsed())
            .unwrap_or_default()
    }
}

fn pick_input_config(device: &cpal::Device) -> Result<cpal::SupportedStreamConfig, AppError> {
    let desired = cpal::SampleRate(PREFERRED_SAMPLE_RATE);
    let configs: Vec<_> = device
        .supported_input_configs()
        .context("Failed to query device capabilities")
        .map_err(AppError::from)?
        .collect();

    let supports_desired = |range: &cpal::SupportedStreamConfigRange| {
        range.min_sample_rate() <= desired && range.max_sample_rate() >= desired
    };

    // Mono at 16 kHz, then any layout at 16 kHz, then mono, then anything.
    configs
        .iter()
        .find(|range| range.channels() == 1 && supports_desired(range))
        .or_else(|| configs.iter().find(|range| supports_desired(range)))
        .map(|range| range.clone().with_sample_rate(desired))
        .or_else(|| {
            configs
                .iter()
                .find(|range| range.channels() == 1)
                .or_else(|| configs.first())
                .map(|range| range.clone().with_max_sample_rate())
        })
        .ok_or_else(|| AppError::Audio("No supported capture configuration available".into()))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: &Arc<CaptureBuffer>,
) -> Result<cpal::Stream, AppError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let data_shared = shared.clone();
    let err_shared = shared.clone();
    device
        .build_input_stream(
            config,
            move |data: &[T], _| on_input(data, &data_shared),
            move |err| *err_shared.error.lock() = Some(err.to_string()),
            None,
        )
        .context("Failed to build input stream")
        .map_err(AppError::from)
}

fn on_input<T>(input: &[T], shared: &CaptureBuffer)
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut peak = 0.0f32;
    {
        let mut buffer = shared.samples.lock();
        buffer.reserve(input.len());
        for &frame in input {
            let sample = frame.to_sample::<f32>();
            peak = peak.max(sample.abs());
            buffer.push(sample);
        }
    }
    // Non-negative floats order the same as their bit patterns.
    shared
        .level_bits
        .fetch_max(peak.min(1.0).to_bits(), Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_holds_peak_until_read() {
        let shared = CaptureBuffer::default();
        on_input(&[0.0f32, 0.3, -0.2], &shared);
        on_input(&[0.01f32, -0.01], &shared);
        assert_eq!(shared.take_level(), 0.3);
        assert_eq!(shared.take_level(), 0.0);
        assert_eq!(shared.samples.lock().len(), 5);
    }

    #[test]
    fn integer_input_is_scaled() {
        let shared = CaptureBuffer::default();
        on_input(&[i16::MIN, 0], &shared);
        assert_eq!(shared.take_level(), 1.0);
    }
}
