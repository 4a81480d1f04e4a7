use reqwest::Url;

use crate::chat::ChatRequest;
use crate::constants::FAILURE_MESSAGE;
use crate::text_utils::{append_transcript, build_context, normalize_transcript};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub url: String,
    pub prompt: String,
    pub language: String,
    pub response: Option<String>,
    pub busy: bool,
    pub listening: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Submit,
    ChatSucceeded(String),
    ChatFailed,
    ToggleCapture,
    CaptureFinished(Option<String>),
    SpeakRequested,
}

/// Work the form asks the shell to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SendChat(ChatRequest),
    StartCapture,
    StopCapture,
    Speak(String),
}

pub fn update(mut state: FormState, event: FormEvent) -> (FormState, Option<Effect>) {
    let effect = match event {
        FormEvent::Submit => {
            let url = state.url.trim();
            if state.busy || state.prompt.is_empty() || !is_absolute_url(url) {
                None
            } else {
                let context = build_context(url, &state.language);
                state.busy = true;
                state.response = None;
                Some(Effect::SendChat(ChatRequest {
                    prompt: state.prompt.clone(),
                    context,
                }))
            }
        }
        FormEvent::ChatSucceeded(text) => {
            state.response = Some(text);
            state.busy = false;
            None
        }
        FormEvent::ChatFailed => {
            state.response = Some(FAILURE_MESSAGE.to_string());
            state.busy = false;
            None
        }
        FormEvent::ToggleCapture => {
            if state.listening {
                Some(Effect::StopCapture)
            } else {
                state.listening = true;
                Some(Effect::StartCapture)
            }
        }
        FormEvent::CaptureFinished(transcript) => {
            state.listening = false;
            if let Some(text) = transcript {
                let text = normalize_transcript(&text);
                if !text.is_empty() {
                    append_transcript(&mut state.prompt, &text);
                }
            }
            None
        }
        FormEvent::SpeakRequested => state
            .response
            .as_ref()
            .filter(|text| !text.trim().is_empty())
            .map(|text| Effect::Speak(text.clone())),
    };
    (state, effect)
}

/// Only absolute URLs are accepted as the website field.
pub fn is_absolute_url(url: &str) -> bool {
    !url.is_empty() && Url::parse(url).is_ok()
}
