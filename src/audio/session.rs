use std::time::Duration;

/// Limits for a one-shot capture session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionLimits {
    /// Peak level above which a buffer counts as speech.
    pub speech_threshold: f32,
    /// Quiet time after speech that ends the session.
    pub trailing_silence: Duration,
    /// Give up if nobody has spoken by then.
    pub no_speech_timeout: Duration,
    pub max_duration: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            speech_threshold: 0.04,
            trailing_silence: Duration::from_millis(1500),
            no_speech_timeout: Duration::from_secs(8),
            max_duration: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Stopped,
    SpeechEnded,
    NoSpeech,
    MaxDuration,
}

/// Decides when a non-continuous capture session is over, from periodic
/// level readings.
#[derive(Debug)]
pub struct CaptureSession {
    limits: SessionLimits,
    last_speech: Option<Duration>,
}

impl CaptureSession {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            last_speech: None,
        }
    }

    pub fn heard_speech(&self) -> bool {
        self.last_speech.is_some()
    }

    /// Feed one reading taken `elapsed` after the session started.
    pub fn observe(
        &mut self,
        elapsed: Duration,
        level: f32,
        stop_requested: bool,
    ) -> Option<SessionEnd> {
        if stop_requested {
            return Some(SessionEnd::Stopped);
        }
        if level >= self.limits.speech_threshold {
            self.last_speech = Some(elapsed);
        }
        if elapsed >= self.limits.max_duration {
            return Some(SessionEnd::MaxDuration);
        }
        match self.last_speech {
            Some(at) if elapsed.saturating_sub(at) >= self.limits.trailing_silence => {
                Some(SessionEnd::SpeechEnded)
            }
            None if elapsed >= self.limits.no_speech_timeout => Some(SessionEnd::NoSpeech),
            _ => None,
        }
    }
}
