use std::io::Cursor;

use crate::audio::AudioClip;
use crate::error::AppError;

/// Default output device with a single FIFO sink. Not `Send`; create it on
/// the thread that plays.
pub struct AudioPlayer {
    _stream: rodio::OutputStream,
    handle: rodio::OutputStreamHandle,
    sink: Option<rodio::Sink>,
}

impl AudioPlayer {
    pub fn new() -> Result<Self, AppError> {
        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|err| AppError::Audio(format!("Output device error: {err}")))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    /// Append a clip behind whatever is already playing.
    pub fn enqueue(&mut self, mut clip: AudioClip) -> Result<(), AppError> {
        let wav_bytes = clip.wav_bytes()?;
        let decoder = rodio::Decoder::new(Cursor::new((*wav_bytes).clone()))
            .map_err(|err| AppError::Audio(format!("Decode error: {err}")))?;
        if self.sink.is_none() {
            let sink = rodio::Sink::try_new(&self.handle)
                .map_err(|err| AppError::Audio(format!("Audio sink error: {err}")))?;
            self.sink = Some(sink);
        }
        if let Some(sink) = &self.sink {
            sink.append(decoder);
            sink.play();
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
