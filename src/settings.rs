use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    default_voices, DEFAULT_CAPTURE_LOCALE, DEFAULT_CHAT_ENDPOINT, DEFAULT_SPEECH_BASE_URL,
    DEFAULT_VOICE,
};
use crate::voice::Voice;

const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chat_endpoint: String,
    pub speech_base_url: String,
    pub capture_locale: String,
    pub default_voice: String,
    /// Voices offered to the playback picker, matched by locale prefix.
    pub voices: Vec<Voice>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            speech_base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
            capture_locale: DEFAULT_CAPTURE_LOCALE.to_string(),
            default_voice: DEFAULT_VOICE.to_string(),
            voices: default_voices(),
        }
    }
}

impl Settings {
    /// Language part of the capture locale (`en-US` -> `en`).
    pub fn capture_language(&self) -> &str {
        self.capture_locale
            .split(['-', '_'])
            .next()
            .unwrap_or(DEFAULT_CAPTURE_LOCALE)
    }
}

pub fn load_settings() -> Settings {
    match load_settings_from_path(None) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("Falling back to default settings: {err:#}");
            Settings::default()
        }
    }
}

pub fn load_settings_from_path(custom_path: Option<&Path>) -> Result<Settings> {
    let settings_path = custom_path
        .map(Path::to_owned)
        .unwrap_or_else(default_settings_path);

    match fs::read_to_string(&settings_path) {
        Ok(raw) => {
            let parsed: Settings = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid JSON in {}", settings_path.display()))?;
            Ok(fill_defaults(parsed))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(err) => Err(err).with_context(|| format!("Failed reading {}", settings_path.display())),
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = default_settings_path();
    save_settings_to_path(settings, &path)
}

pub fn save_settings_to_path(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }
    let payload =
        serde_json::to_string_pretty(settings).context("Failed serializing settings to JSON")?;
    fs::write(path, payload).with_context(|| format!("Failed writing {}", path.display()))
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILENAME)
}

pub fn config_dir() -> PathBuf {
    if let Ok(custom) = env::var("PROMPTLY_HOME") {
        let path = PathBuf::from(custom);
        if path.is_absolute() {
            return path;
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".promptly")
}

fn or_default(value: String, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn fill_defaults(settings: Settings) -> Settings {
    let voices: Vec<Voice> = settings
        .voices
        .into_iter()
        .filter(|voice| !voice.name.trim().is_empty() && !voice.lang.trim().is_empty())
        .map(|voice| Voice::new(voice.name.trim(), voice.lang.trim()))
        .collect();
    Settings {
        chat_endpoint: or_default(settings.chat_endpoint, DEFAULT_CHAT_ENDPOINT),
        speech_base_url: or_default(settings.speech_base_url, DEFAULT_SPEECH_BASE_URL)
            .trim_end_matches('/')
            .to_string(),
        capture_locale: or_default(settings.capture_locale, DEFAULT_CAPTURE_LOCALE),
        default_voice: or_default(settings.default_voice, DEFAULT_VOICE).to_ascii_lowercase(),
        voices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chat_endpoint, "http://localhost:8000/chat");
    }

    #[test]
    fn round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.chat_endpoint = "http://127.0.0.1:9000/chat".to_string();
        settings.voices.push(Voice::new("xiaobei", "zh-CN"));

        save_settings_to_path(&settings, &path).unwrap();
        let loaded = load_settings_from_path(Some(&path)).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn blank_fields_are_filled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "chat_endpoint": "  ",
                "speech_base_url": "http://localhost:8880/v1/",
                "default_voice": " Alloy ",
                "voices": [{"name": "", "lang": "en-US"}, {"name": "kore", "lang": " ko-KR "}]
            }"#,
        )
        .unwrap();

        let settings = load_settings_from_path(Some(&path)).unwrap();
        assert_eq!(settings.chat_endpoint, DEFAULT_CHAT_ENDPOINT);
        assert_eq!(settings.speech_base_url, "http://localhost:8880/v1");
        assert_eq!(settings.capture_locale, "en-US");
        assert_eq!(settings.default_voice, "alloy");
        assert_eq!(settings.voices, vec![Voice::new("kore", "ko-KR")]);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_settings_from_path(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn capture_language_strips_region() {
        let mut settings = Settings::default();
        assert_eq!(settings.capture_language(), "en");
        settings.capture_locale = "pt_BR".to_string();
        assert_eq!(settings.capture_language(), "pt");
    }
}
