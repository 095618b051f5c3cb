// GUI entry point for image-resizer
// The window is the presentation side; the gateway runs on a background thread

use anyhow::anyhow;
use eframe::egui;

mod app;
use app::ResizerApp;
use image_resizer::utils::init_logging;
use image_resizer::ResizerConfig;

fn main() -> anyhow::Result<()> {
    let dev_mode = std::env::var("IMAGE_RESIZER_ENV").map_or(cfg!(debug_assertions), |v| v == "development");
    init_logging(dev_mode)?;
    let config = ResizerConfig::load(None)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Image Resizer")
            .with_inner_size([if dev_mode { 1000.0 } else { 500.0 }, 600.0])
            .with_min_inner_size([400.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Image Resizer",
        options,
        Box::new(move |cc| Ok(Box::new(ResizerApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("GUI failed: {}", e))
}
