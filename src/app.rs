use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arboard::Clipboard;
use eframe::App;
use egui::{self, Align, Color32, Context, Frame, Layout, RichText, ScrollArea, Ui, Vec2};

use crate::backend::{MicCapture, SpeechQueue};
use crate::chat::ChatClient;
use crate::constants::{APP_TITLE, SPEECH_VOICES};
use crate::form::{self, is_absolute_url, Effect, FormEvent, FormState};
use crate::language::LanguageCode;
use crate::openai::OpenAiClient;
use crate::settings::{save_settings, Settings};
use crate::task::BackgroundTask;
use crate::voice::{speak_response, Voice, VoiceCapture};

pub struct PromptlyApp {
    form: FormState,

    settings: Settings,
    settings_window: Option<SettingsWindow>,

    chat: Option<ChatClient>,
    speech_client: Option<OpenAiClient>,
    speech: SpeechQueue,

    chat_task: Option<BackgroundTask<String>>,
    capture_task: Option<BackgroundTask<Option<String>>>,
    capture_stop: Option<Arc<AtomicBool>>,

    spoken_language: Option<LanguageCode>,
    notice: Option<String>,
    copy_feedback_until: Option<Instant>,
}

impl PromptlyApp {
    pub fn new(settings: Settings) -> Self {
        let mut app = Self {
            form: FormState::default(),
            settings: settings.clone(),
            settings_window: None,
            chat: None,
            speech_client: None,
            speech: SpeechQueue::disabled(settings.voices.clone()),
            chat_task: None,
            capture_task: None,
            capture_stop: None,
            spoken_language: None,
            notice: None,
            copy_feedback_until: None,
        };
        app.connect_services();
        app
    }

    /// (Re)build the network clients and the speech queue from settings.
    fn connect_services(&mut self) {
        self.chat = match ChatClient::new(self.settings.chat_endpoint.clone()) {
            Ok(client) => {
                log::info!("Chat endpoint: {}", client.endpoint());
                Some(client)
            }
            Err(err) => {
                log::error!("Chat client unavailable: {err}");
                None
            }
        };
        self.speech_client = match OpenAiClient::from_env(&self.settings.speech_base_url) {
            Ok(client) => Some(client),
            Err(err) => {
                log::warn!("Voice input and playback unavailable: {err}");
                None
            }
        };
        self.speech.stop();
        self.speech = SpeechQueue::spawn(
            self.speech_client.clone(),
            self.settings.voices.clone(),
            self.settings.default_voice.clone(),
        );
    }

    fn dispatch(&mut self, event: FormEvent) {
        let state = std::mem::take(&mut self.form);
        let (state, effect) = form::update(state, event);
        self.form = state;
        if let Some(effect) = effect {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SendChat(request) => {
                let Some(client) = self.chat.clone() else {
                    log::error!("Chat client unavailable; cannot send prompt");
                    self.dispatch(FormEvent::ChatFailed);
                    return;
                };
                self.chat_task = Some(BackgroundTask::spawn(move || client.send(&request)));
            }
            Effect::StartCapture => {
                let mic = MicCapture::new(
                    self.speech_client.clone(),
                    self.settings.capture_language(),
                );
                self.capture_stop = Some(mic.stop_handle());
                let mut capture: Box<dyn VoiceCapture> = Box::new(mic);
                self.capture_task = Some(BackgroundTask::spawn(move || capture.start_once()));
            }
            Effect::StopCapture => {
                if let Some(flag) = &self.capture_stop {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            Effect::Speak(text) => {
                self.spoken_language = speak_response(&self.speech, &text);
            }
        }
    }

    fn poll_chat(&mut self, ctx: &Context) {
        let Some(task) = &mut self.chat_task else {
            return;
        };
        match task.try_take() {
            Some(Ok(text)) => {
                self.chat_task = None;
                self.dispatch(FormEvent::ChatSucceeded(text));
            }
            Some(Err(err)) => {
                self.chat_task = None;
                log::error!("Chat request failed: {err}");
                self.dispatch(FormEvent::ChatFailed);
            }
            None => ctx.request_repaint_after(Duration::from_millis(100)),
        }
    }

    fn poll_capture(&mut self, ctx: &Context) {
        let Some(task) = &mut self.capture_task else {
            return;
        };
        let Some(result) = task.try_take() else {
            ctx.request_repaint_after(Duration::from_millis(100));
            return;
        };
        self.capture_task = None;
        self.capture_stop = None;
        let transcript = result.unwrap_or_else(|err| {
            log::warn!("Voice capture failed: {err}");
            None
        });
        self.dispatch(FormEvent::CaptureFinished(transcript));
    }

    fn copy_response(&mut self) {
        let Some(text) = self.form.response.clone() else {
            return;
        };
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => {
                self.copy_feedback_until = Some(Instant::now() + Duration::from_secs(2));
            }
            Err(err) => {
                self.notice = Some(format!("Clipboard error: {err}"));
            }
        }
    }

    fn save_response(&mut self) {
        let Some(text) = self.form.response.as_deref() else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Save Response")
            .set_file_name("response.txt")
            .save_file()
        {
            self.notice = Some(match fs::write(&path, text.as_bytes()) {
                Ok(()) => format!("Response saved to {}", path.display()),
                Err(err) => format!("Failed to save file: {err}"),
            });
        }
    }

    fn show_form(&mut self, ui: &mut Ui) {
        let full_width = ui.available_width();

        ui.label(RichText::new("Website URL").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.form.url)
                .hint_text("e.g. https://example.com")
                .desired_width(full_width),
        );
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label(RichText::new("Prompt").strong());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let mic_label = if self.form.listening {
                    "■ Stop listening"
                } else {
                    "🎤 Dictate"
                };
                let mic = ui.add_enabled(
                    self.speech_client.is_some(),
                    egui::Button::new(mic_label),
                );
                if mic.clicked() {
                    self.dispatch(FormEvent::ToggleCapture);
                }
            });
        });
        ui.add_sized(
            Vec2::new(full_width, ui.spacing().interact_size.y * 6.0),
            egui::TextEdit::multiline(&mut self.form.prompt)
                .hint_text("Enter your prompt (e.g., summarize, translate...)"),
        );
        ui.add_space(8.0);

        ui.label(RichText::new("Language to translate to (optional)").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.form.language)
                .hint_text("e.g. Spanish, French...")
                .desired_width(full_width),
        );
        ui.add_space(12.0);

        let send_label = if self.form.busy { "Thinking..." } else { "Send" };
        let ready = !self.form.prompt.is_empty() && is_absolute_url(self.form.url.trim());
        let send = ui.add_enabled(
            !self.form.busy && ready,
            egui::Button::new(RichText::new(send_label).size(16.0).strong())
                .min_size(Vec2::new(full_width, 36.0)),
        );
        if send.clicked() {
            self.dispatch(FormEvent::Submit);
        }
    }

    fn show_response(&mut self, ui: &mut Ui) {
        let Some(response) = self.form.response.clone().filter(|text| !text.is_empty()) else {
            return;
        };
        ui.add_space(14.0);
        Frame::group(ui.style())
            .inner_margin(egui::Margin::same(12.0))
            .rounding(egui::Rounding::same(8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new("Response").heading());
                ui.add_space(6.0);
                ScrollArea::vertical().max_height(280.0).show(ui, |ui| {
                    ui.add(egui::Label::new(&response).selectable(true).wrap(true));
                });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let listen = ui.add_enabled(
                        self.speech.is_available(),
                        egui::Button::new("🔊 Listen"),
                    );
                    if listen.clicked() {
                        self.dispatch(FormEvent::SpeakRequested);
                    }
                    if ui
                        .add_enabled(self.speech.is_available(), egui::Button::new("■ Stop"))
                        .clicked()
                    {
                        self.speech.stop();
                    }
                    if ui.button("⧉ Copy").clicked() {
                        self.copy_response();
                    }
                    if ui.button("⬇ Save").clicked() {
                        self.save_response();
                    }
                    if let Some(code) = self.spoken_language {
                        ui.label(RichText::new(format!("voice: {code}")).weak());
                    }
                });
            });
    }

    fn show_feedback(&mut self, ui: &mut Ui) {
        if let Some(deadline) = self.copy_feedback_until {
            if Instant::now() < deadline {
                ui.label(RichText::new("Copied to clipboard").color(Color32::from_rgb(0, 150, 0)));
            } else {
                self.copy_feedback_until = None;
            }
        }
        if let Some(notice) = &self.notice {
            ui.label(RichText::new(notice).weak());
        }
    }
}

impl App for PromptlyApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_chat(ctx);
        self.poll_capture(ctx);

        egui::TopBottomPanel::top("topbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(APP_TITLE).heading());
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        self.settings_window = Some(SettingsWindow::from(&self.settings));
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(8.0);
                self.show_form(ui);
                self.show_response(ui);
                ui.add_space(6.0);
                self.show_feedback(ui);
            });
        });

        if let Some(mut window) = self.settings_window.take() {
            let mut open = true;
            let mut keep_window = true;
            egui::Window::new("Settings")
                .collapsible(false)
                .resizable(false)
                .default_size(Vec2::new(420.0, 420.0))
                .open(&mut open)
                .show(ctx, |ui| {
                    keep_window = window.show(ui, self);
                });
            if open && keep_window {
                self.settings_window = Some(window);
            }
        }

        if self.copy_feedback_until.is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

struct SettingsWindow {
    chat_endpoint: String,
    speech_base_url: String,
    capture_locale: String,
    default_voice_index: usize,
    voices: Vec<Voice>,
}

impl SettingsWindow {
    fn from(settings: &Settings) -> Self {
        Self {
            chat_endpoint: settings.chat_endpoint.clone(),
            speech_base_url: settings.speech_base_url.clone(),
            capture_locale: settings.capture_locale.clone(),
            default_voice_index: speech_voice_index(&settings.default_voice),
            voices: settings.voices.clone(),
        }
    }

    fn show(&mut self, ui: &mut Ui, app: &mut PromptlyApp) -> bool {
        ui.spacing_mut().item_spacing = Vec2::new(10.0, 10.0);
        let mut keep_open = true;

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Chat endpoint");
                ui.text_edit_singleline(&mut self.chat_endpoint);
                ui.end_row();

                ui.label("Speech API base URL");
                ui.text_edit_singleline(&mut self.speech_base_url);
                ui.end_row();

                ui.label("Dictation locale");
                ui.text_edit_singleline(&mut self.capture_locale);
                ui.end_row();

                ui.label("Fallback voice");
                egui::ComboBox::from_id_source("settings_default_voice")
                    .selected_text(SPEECH_VOICES[self.default_voice_index].label)
                    .show_ui(ui, |ui| {
                        for (idx, voice) in SPEECH_VOICES.iter().enumerate() {
                            ui.selectable_value(&mut self.default_voice_index, idx, voice.label);
                        }
                    });
                ui.end_row();
            });

        ui.separator();
        ui.label("Voices by locale");
        let mut remove = None;
        for (idx, voice) in self.voices.iter_mut().enumerate() {
            ui.horizontal(|ui| {
                ui.add(egui::TextEdit::singleline(&mut voice.name).desired_width(140.0));
                ui.add(egui::TextEdit::singleline(&mut voice.lang).desired_width(80.0));
                if ui.small_button("✖").clicked() {
                    remove = Some(idx);
                }
            });
        }
        if let Some(idx) = remove {
            self.voices.remove(idx);
        }
        if ui.button("Add voice").clicked() {
            self.voices.push(Voice::new("", ""));
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("Save").clicked() {
                self.persist(app);
                keep_open = false;
            }
            if ui.button("Cancel").clicked() {
                keep_open = false;
            }
        });
        keep_open
    }

    fn persist(&self, app: &mut PromptlyApp) {
        let settings = Settings {
            chat_endpoint: non_empty_or(&self.chat_endpoint, &app.settings.chat_endpoint),
            speech_base_url: non_empty_or(&self.speech_base_url, &app.settings.speech_base_url)
                .trim_end_matches('/')
                .to_string(),
            capture_locale: non_empty_or(&self.capture_locale, &app.settings.capture_locale),
            default_voice: SPEECH_VOICES[self.default_voice_index].id.to_string(),
            voices: self
                .voices
                .iter()
                .filter(|voice| !voice.name.trim().is_empty() && !voice.lang.trim().is_empty())
                .map(|voice| Voice::new(voice.name.trim(), voice.lang.trim()))
                .collect(),
        };

        match save_settings(&settings) {
            Ok(()) => app.notice = Some("Settings saved".to_string()),
            Err(err) => {
                log::warn!("Failed to save settings: {err:#}");
                app.notice = Some(format!("Failed to save settings: {err}"));
            }
        }
        app.settings = settings;
        app.connect_services();
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn speech_voice_index(id: &str) -> usize {
    SPEECH_VOICES
        .iter()
        .position(|voice| voice.id.eq_ignore_ascii_case(id.trim()))
        .unwrap_or(0)
}
