mod app;
mod audio;
mod backend;
mod chat;
mod constants;
mod error;
mod form;
mod language;
mod openai;
mod settings;
mod task;
mod text_utils;
mod voice;

use std::path::Path;

use app::PromptlyApp;
use constants::APP_TITLE;
use settings::load_settings;

const NOTO_DIRS: &[&str] = &[
    "assets/fonts",
    "/usr/share/fonts/truetype/noto",
    "/usr/share/fonts/opentype/noto",
    "/usr/share/fonts/noto",
];

/// Fallback faces for every script the response language guesser knows about.
const NOTO_FACES: &[&str] = &[
    "NotoSans-Regular.ttf",
    "NotoSansCJK-Regular.ttc",
    "NotoSansArabic-Regular.ttf",
    "NotoSansBengali-Regular.ttf",
    "NotoSansDevanagari-Regular.ttf",
    "NotoSansGujarati-Regular.ttf",
    "NotoSansGurmukhi-Regular.ttf",
    "NotoSansHebrew-Regular.ttf",
    "NotoSansKannada-Regular.ttf",
    "NotoSansKhmer-Regular.ttf",
    "NotoSansMalayalam-Regular.ttf",
    "NotoSansMyanmar-Regular.ttf",
    "NotoSansOriya-Regular.ttf",
    "NotoSansSinhala-Regular.ttf",
    "NotoSansTamil-Regular.ttf",
    "NotoSansTelugu-Regular.ttf",
    "NotoSansThai-Regular.ttf",
];

fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    for face in NOTO_FACES {
        let Some(path) = NOTO_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(face))
            .find(|path| path.exists())
        else {
            log::debug!("Font {face} not found");
            continue;
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Failed reading {}: {err}", path.display());
                continue;
            }
        };
        let name = face
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(face)
            .to_string();
        fonts
            .font_data
            .insert(name.clone(), egui::FontData::from_owned(bytes));
        for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            fonts.families.entry(family).or_default().push(name.clone());
        }
        log::info!("Loaded fallback font: {name} from {}", path.display());
    }

    ctx.set_fonts(fonts);
}

fn main() -> eframe::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 760.0])
            .with_min_inner_size([380.0, 560.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        native_options,
        Box::new(move |cc| {
            configure_fonts(&cc.egui_ctx);
            Box::new(PromptlyApp::new(settings))
        }),
    )
}
