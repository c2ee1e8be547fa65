mod app;
mod color;
mod state;
mod ui;

use app::RigScopeApp;
use eframe::egui;
use rigscope::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env();
    log::info!("Starting with dataset {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "RigScope – Hardware Prices",
        options,
        Box::new(|_cc| Ok(Box::new(RigScopeApp::new(config)))),
    )
}
