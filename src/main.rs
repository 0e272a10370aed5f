#![allow(dead_code)]

mod app;
mod data;
mod error;
mod export;
mod gui;
mod logging;
mod pipeline;
mod preferences;
mod session;

use app::SpectroApp;
use preferences::Preferences;

fn main() -> eframe::Result<()> {
    let preferences = Preferences::load();

    // Initialize logging
    let console_log = match logging::init(&preferences.log_filter) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("logger already initialised: {}", e);
            logging::ConsoleLog::default()
        }
    };

    log::info!(
        "Starting Spectroscopy Processing GUI v{}",
        env!("CARGO_PKG_VERSION")
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Spectroscopy Processing")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Spectroscopy Processing GUI",
        options,
        Box::new(move |cc| Ok(Box::new(SpectroApp::new(cc, preferences, console_log)))),
    )
}
