use eframe::egui;
use shorecast::app::ShorecastApp;
use shorecast::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            std::process::exit(1);
        }
    };
    log::info!("Site {} under {}", config.site, config.data_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SHORECAST – Coastal Shoreline Change",
        options,
        Box::new(|_cc| Ok(Box::new(ShorecastApp::new(config)))),
    )
}
