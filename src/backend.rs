use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::audio::{AudioClip, AudioPlayer, CaptureSession, Recorder, SessionEnd, SessionLimits};
use crate::error::AppError;
use crate::openai::OpenAiClient;
use crate::voice::{Utterance, Voice, VoiceCapture, VoiceOutput};

const LEVEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Records from the default microphone until the session ends, then
/// transcribes the clip in a fixed language.
pub struct MicCapture {
    client: Option<OpenAiClient>,
    language: String,
    limits: SessionLimits,
    stop: Arc<AtomicBool>,
}

impl MicCapture {
    pub fn new(client: Option<OpenAiClient>, language: impl Into<String>) -> Self {
        Self {
            client,
            language: language.into(),
            limits: SessionLimits::default(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the returned flag ends the session at the next level poll.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn record(&self) -> Result<(Option<AudioClip>, bool), AppError> {
        let mut recorder = Recorder::new();
        recorder.start()?;
        let mut session = CaptureSession::new(self.limits);
        let reason = loop {
            thread::sleep(LEVEL_POLL_INTERVAL);
            let stop_requested = self.stop.load(Ordering::Relaxed);
            if let Some(end) =
                session.observe(recorder.elapsed(), recorder.current_level(), stop_requested)
            {
                break end;
            }
        };
        let clip = recorder.stop()?;
        log::info!(
            "Capture session ended ({reason:?}) after {:.1}s",
            clip.as_ref().map(|c| c.duration().as_secs_f32()).unwrap_or(0.0)
        );
        let heard = session.heard_speech() && reason != SessionEnd::NoSpeech;
        Ok((clip, heard))
    }
}

impl VoiceCapture for MicCapture {
    fn start_once(&mut self) -> Result<Option<String>, AppError> {
        let Some(client) = self.client.clone() else {
            return Err(AppError::MissingApiKey);
        };
        let (clip, heard) = self.record()?;
        let Some(mut clip) = clip.filter(|clip| heard && !clip.is_empty()) else {
            return Ok(None);
        };
        let wav = clip.wav_bytes()?;
        let transcript = client.transcribe(&wav, Some(&self.language))?;
        Ok(Some(transcript).filter(|text| !text.is_empty()))
    }
}

enum SpeechCommand {
    Speak(Utterance),
    Stop,
}

/// Synthesis queue served by one worker thread that owns the audio output.
/// Utterances are synthesized and played strictly in submission order.
pub struct SpeechQueue {
    voices: Vec<Voice>,
    sender: Option<mpsc::Sender<SpeechCommand>>,
}

impl SpeechQueue {
    pub fn spawn(client: Option<OpenAiClient>, voices: Vec<Voice>, default_voice: String) -> Self {
        let Some(client) = client else {
            log::warn!("Speech output disabled: no API key configured");
            return Self::disabled(voices);
        };
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("speech-queue".to_string())
            .spawn(move || run_queue(client, default_voice, rx));
        match spawned {
            Ok(_) => Self {
                voices,
                sender: Some(tx),
            },
            Err(err) => {
                log::warn!("Speech output disabled: {err}");
                Self::disabled(voices)
            }
        }
    }

    pub fn disabled(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            sender: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.sender.is_some()
    }

    pub fn stop(&self) {
        self.send(SpeechCommand::Stop);
    }

    fn send(&self, command: SpeechCommand) {
        let Some(sender) = &self.sender else {
            log::debug!("Speech output unavailable; ignoring request");
            return;
        };
        if sender.send(command).is_err() {
            log::warn!("Speech worker has exited");
        }
    }
}

impl VoiceOutput for SpeechQueue {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance) {
        self.send(SpeechCommand::Speak(utterance));
    }
}

/// The speech endpoint takes no locale, so an utterance without a matched
/// voice is read by the default voice and its `lang` only shows up in logs.
fn synthesis_voice<'a>(utterance: &'a Utterance, default_voice: &'a str) -> &'a str {
    utterance
        .voice
        .as_ref()
        .map(|voice| voice.name.as_str())
        .unwrap_or(default_voice)
}

fn run_queue(client: OpenAiClient, default_voice: String, commands: mpsc::Receiver<SpeechCommand>) {
    let mut player = match AudioPlayer::new() {
        Ok(player) => player,
        Err(err) => {
            log::warn!("Speech output disabled: {err}");
            return;
        }
    };
    for command in commands {
        match command {
            SpeechCommand::Stop => player.stop(),
            SpeechCommand::Speak(utterance) => {
                let voice = synthesis_voice(&utterance, &default_voice);
                log::debug!("Synthesizing with voice {voice} ({})", utterance.lang);
                let queued = client
                    .text_to_speech(&utterance.text, voice)
                    .and_then(AudioClip::decode)
                    .and_then(|clip| player.enqueue(clip));
                if let Err(err) = queued {
                    log::warn!("Speech playback failed: {err}");
                }
            }
        }
    }
    log::debug!("Speech queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageCode;
    use crate::voice::speak_response;

    #[test]
    fn disabled_queue_swallows_requests() {
        let queue = SpeechQueue::disabled(vec![Voice::new("nova", "en-US")]);
        assert!(!queue.is_available());
        assert_eq!(queue.voices().len(), 1);
        assert!(speak_response(&queue, "Hello").is_some());
        queue.stop();
    }

    #[test]
    fn unmatched_utterance_uses_default_voice() {
        let voices = vec![Voice::new("nova", "en-US"), Voice::new("hala", "ar-SA")];
        let matched = crate::voice::build_utterance(&voices, "مرحبا", LanguageCode::Ar);
        assert_eq!(synthesis_voice(&matched, "onyx"), "hala");

        let unmatched = crate::voice::build_utterance(&voices, "你好", LanguageCode::Zh);
        assert_eq!(unmatched.lang, "zh");
        assert_eq!(synthesis_voice(&unmatched, "onyx"), "onyx");
    }

    #[test]
    fn capture_without_client_fails_fast() {
        let mut capture = MicCapture::new(None, "en");
        assert!(matches!(capture.start_once(), Err(AppError::MissingApiKey)));
    }

    #[test]
    fn stop_handle_is_shared() {
        let capture = MicCapture::new(None, "en");
        capture.stop_handle().store(true, Ordering::Relaxed);
        assert!(capture.stop.load(Ordering::Relaxed));
    }
}
