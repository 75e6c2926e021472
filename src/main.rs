mod app;
mod color;
mod state;
mod ui;

use app::InsightsApp;
use eframe::egui;
use getaround_insights::AppConfig;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    log::info!(
        "Delay data: {}, pricing data: {}, model: {}",
        config.delay_data_source(),
        config.pricing_data_source(),
        config.model_path.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "GetAround Insights",
        options,
        Box::new(|_cc| Ok(Box::new(InsightsApp::new(config)))),
    )
}
