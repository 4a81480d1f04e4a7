use crate::voice::Voice;

pub const APP_TITLE: &str = "Promptly AI Assistant";

pub const DEFAULT_CHAT_ENDPOINT: &str = "http://localhost:8000/chat";
pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CAPTURE_LOCALE: &str = "en-US";
pub const DEFAULT_VOICE: &str = "nova";

/// Shown in place of a response whenever the chat call fails for any reason.
pub const FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

struct VoiceSeed {
    name: &'static str,
    lang: &'static str,
}

const VOICE_SEEDS: &[VoiceSeed] = &[
    VoiceSeed {
        name: "nova",
        lang: "en-US",
    },
    VoiceSeed {
        name: "onyx",
        lang: "en-GB",
    },
];

pub fn default_voices() -> Vec<Voice> {
    VOICE_SEEDS
        .iter()
        .map(|seed| Voice::new(seed.name, seed.lang))
        .collect()
}

pub struct SpeechVoiceOption {
    pub id: &'static str,
    pub label: &'static str,
}

/// Voice ids accepted by the speech endpoint, offered in the settings window.
pub const SPEECH_VOICES: &[SpeechVoiceOption] = &[
    SpeechVoiceOption {
        id: "nova",
        label: "Nova",
    },
    SpeechVoiceOption {
        id: "alloy",
        label: "Alloy",
    },
    SpeechVoiceOption {
        id: "echo",
        label: "Echo",
    },
    SpeechVoiceOption {
        id: "fable",
        label: "Fable",
    },
    SpeechVoiceOption {
        id: "onyx",
        label: "Onyx",
    },
    SpeechVoiceOption {
        id: "shimmer",
        label: "Shimmer",
    },
];
