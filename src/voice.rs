use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::language::{guess_language, LanguageCode};

/// A synthesis voice as advertised by a [`VoiceOutput`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// Locale tag such as `en-US` or `zh-CN`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub lang: String,
}

/// One-shot speech-to-text. Blocks until the session ends and yields at most
/// one transcript.
pub trait VoiceCapture: Send {
    fn start_once(&mut self) -> Result<Option<String>, AppError>;
}

/// Queue-backed speech synthesis.
pub trait VoiceOutput {
    fn voices(&self) -> Vec<Voice>;
    fn speak(&self, utterance: Utterance);
}

pub fn select_voice<'a>(voices: &'a [Voice], code: LanguageCode) -> Option<&'a Voice> {
    let prefix = code.as_str();
    voices
        .iter()
        .find(|voice| voice.lang.to_ascii_lowercase().starts_with(prefix))
}

pub fn build_utterance(voices: &[Voice], text: &str, code: LanguageCode) -> Utterance {
    match select_voice(voices, code) {
        Some(voice) => Utterance {
            text: text.to_string(),
            voice: Some(voice.clone()),
            lang: voice.lang.clone(),
        },
        None => Utterance {
            text: text.to_string(),
            voice: None,
            lang: code.as_str().to_string(),
        },
    }
}

/// Speak `text` with a voice picked from its guessed language. Returns the
/// guessed code, or `None` when there was nothing to say.
pub fn speak_response(output: &dyn VoiceOutput, text: &str) -> Option<LanguageCode> {
    if text.trim().is_empty() {
        return None;
    }
    let code = guess_language(text);
    let utterance = build_utterance(&output.voices(), text, code);
    log::debug!(
        "Speaking {} chars as {code} with voice {:?}",
        text.chars().count(),
        utterance.voice.as_ref().map(|voice| voice.name.as_str())
    );
    output.speak(utterance);
    Some(code)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct RecordingOutput {
        voices: Vec<Voice>,
        spoken: RefCell<Vec<Utterance>>,
    }

    impl RecordingOutput {
        fn new(voices: Vec<Voice>) -> Self {
            Self {
                voices,
                spoken: RefCell::new(Vec::new()),
            }
        }
    }

    impl VoiceOutput for RecordingOutput {
        fn voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(&self, utterance: Utterance) {
            self.spoken.borrow_mut().push(utterance);
        }
    }

    fn catalog() -> Vec<Voice> {
        vec![
            Voice::new("nova", "en-US"),
            Voice::new("xiaobei", "ZH-cn"),
            Voice::new("hala", "ar-SA"),
        ]
    }

    #[test]
    fn prefix_match_ignores_case() {
        let voices = catalog();
        let voice = select_voice(&voices, LanguageCode::Zh).unwrap();
        assert_eq!(voice.name, "xiaobei");
    }

    #[test]
    fn first_matching_voice_wins() {
        let voices = vec![Voice::new("a", "en-GB"), Voice::new("b", "en-US")];
        assert_eq!(select_voice(&voices, LanguageCode::En).unwrap().name, "a");
    }

    #[test]
    fn matched_voice_supplies_locale() {
        let utterance = build_utterance(&catalog(), "مرحبا", LanguageCode::Ar);
        assert_eq!(utterance.voice.as_ref().map(|v| v.name.as_str()), Some("hala"));
        assert_eq!(utterance.lang, "ar-SA");
    }

    #[test]
    fn missing_voice_falls_back_to_code() {
        let utterance = build_utterance(&catalog(), "Привет", LanguageCode::Ru);
        assert!(utterance.voice.is_none());
        assert_eq!(utterance.lang, "ru");
        assert_eq!(utterance.text, "Привет");
    }

    #[test]
    fn speak_response_routes_guessed_language() {
        let output = RecordingOutput::new(catalog());
        assert_eq!(speak_response(&output, "你好"), Some(LanguageCode::Zh));
        let spoken = output.spoken.borrow();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].lang, "ZH-cn");
    }

    #[test]
    fn blank_response_is_not_spoken() {
        let output = RecordingOutput::new(catalog());
        assert_eq!(speak_response(&output, "  "), None);
        assert!(output.spoken.borrow().is_empty());
    }
}
