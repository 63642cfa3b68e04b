mod app;
mod audio;
mod config;
mod storage;

use log::info;

use crate::app::DrillsApp;
use crate::audio::AudioOutput;
use crate::config::Settings;
use crate::storage::StoreFactory;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = storage::settings_path();
    let settings = settings_path
        .as_deref()
        .map(Settings::load_from)
        .unwrap_or_default();
    info!("starting with {:?}", settings.default_exercise);

    let stores = StoreFactory::new(storage::data_dir(), settings.storage_quota_bytes);
    info!("persistent history: {}", stores.is_persistent());
    let audio = AudioOutput::open(settings.sound_dir.clone().or_else(storage::sound_dir));
    let app = DrillsApp::new(settings, settings_path, &stores, audio);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Arithmetic Drills",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
