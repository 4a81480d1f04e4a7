use std::env;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use reqwest::blocking::{
    multipart::{Form, Part},
    Client, Response,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio::{render_wav, AudioClip};
use crate::error::AppError;

const TRANSCRIBE_MODEL: &str = "gpt-4o-transcribe";
const TTS_MODEL: &str = "tts-1";
const TTS_RESPONSE_FORMAT: &str = "mp3";

/// Speech-to-text and text-to-speech against an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn from_env(base_url: &str) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| AppError::MissingApiKey)?;
        Self::with_api_key(api_key, base_url)
    }

    pub fn with_api_key(api_key: impl Into<String>, base_url: &str) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::MissingApiKey);
        }
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to initialise HTTP client")
            .map_err(AppError::from)?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn transcribe(&self, wav_bytes: &[u8], language: Option<&str>) -> Result<String, AppError> {
        let file_part = Part::bytes(wav_bytes.to_vec())
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .context("Failed constructing multipart payload")
            .map_err(AppError::from)?;

        let mut form = Form::new()
            .text("model", TRANSCRIBE_MODEL)
            .part("file", file_part);
        if let Some(lang) = language.filter(|lang| !lang.is_empty()) {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .context("Failed sending transcription request")
            .map_err(AppError::from)?;

        let payload: TranscriptionResponse = parse_response(response, AppError::Transcription)?;
        Ok(payload.text.trim().to_string())
    }

    pub fn text_to_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>, AppError> {
        let clean = text.trim();
        if clean.is_empty() {
            return Err(AppError::Tts("Cannot generate speech for empty text".into()));
        }

        let payload = TtsRequest {
            model: TTS_MODEL,
            input: clean,
            voice,
            response_format: TTS_RESPONSE_FORMAT,
        };

        let response = self
            .http
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&payload)
            .send()
            .context("Failed sending text-to-speech request")
            .map_err(AppError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to decode error response".to_string());
            return Err(AppError::Tts(format!("{status}: {body}")));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ty| ty.contains("json"));

        if is_json {
            let envelope: Value = response
                .json()
                .context("Failed to parse TTS JSON response")
                .map_err(AppError::from)?;
            decode_tts_json(&envelope)
        } else {
            response
                .bytes()
                .map(|b| b.to_vec())
                .context("Failed reading TTS response body")
                .map_err(AppError::from)
        }
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Some compatible servers wrap audio as base64 inside JSON. Every decodable
/// chunk sharing the first chunk's format is stitched into one WAV.
fn decode_tts_json(value: &Value) -> Result<Vec<u8>, AppError> {
    let mut chunks = Vec::new();
    collect_audio_chunks(value, &mut chunks);
    if chunks.is_empty() {
        return Err(AppError::Tts("No audio content in TTS response".to_string()));
    }

    let mut format: Option<(u32, u16)> = None;
    let mut samples: Vec<f32> = Vec::new();
    for chunk in chunks {
        let Some(bytes) = decode_base64_chunk(chunk) else {
            continue;
        };
        let Ok(clip) = AudioClip::decode(bytes) else {
            continue;
        };
        let chunk_format = (clip.sample_rate, clip.channels);
        if *format.get_or_insert(chunk_format) != chunk_format {
            log::debug!("Skipping TTS chunk with mismatched format {chunk_format:?}");
            continue;
        }
        samples.extend_from_slice(clip.samples());
    }

    match format {
        Some((sample_rate, channels)) if !samples.is_empty() => {
            render_wav(&samples, sample_rate, channels)
        }
        _ => Err(AppError::Tts(
            "TTS response did not contain playable audio".to_string(),
        )),
    }
}

fn collect_audio_chunks<'a>(value: &'a Value, chunks: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match (key.as_str(), val) {
                    ("audio" | "b64_json", Value::String(s)) => chunks.push(s),
                    _ => collect_audio_chunks(val, chunks),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_audio_chunks(item, chunks);
            }
        }
        _ => {}
    }
}

fn decode_base64_chunk(chunk: &str) -> Option<Vec<u8>> {
    let trimmed = chunk.trim();
    let payload = match trimmed.find("base64,") {
        Some(idx) => &trimmed[idx + "base64,".len()..],
        None => trimmed,
    };
    if payload.is_empty() {
        return None;
    }
    BASE64_STANDARD.decode(payload).ok()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

fn parse_response<T, F>(response: Response, map_err: F) -> Result<T, AppError>
where
    T: for<'de> Deserialize<'de>,
    F: Fn(String) -> AppError,
{
    if response.status().is_success() {
        return response
            .json::<T>()
            .context("Failed decoding API response")
            .map_err(AppError::from);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let msg = envelope
                .error
                .message
                .unwrap_or_else(|| "Unknown error".into());
            match envelope.error.code {
                Some(code) => format!("{msg} ({code})"),
                None => msg,
            }
        }
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => format!("HTTP {status}: {body}"),
    };
    Err(map_err(message))
}
