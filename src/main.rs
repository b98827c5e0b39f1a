//! Inkpad - personal markdown notebook with a whiteboard
//!
//! Notebooks are edited locally as drafts and published to a GitHub
//! repository. Math is written as TeX between `$` delimiters.

mod app;
mod core;
mod editor;
mod markdown;
mod sync;
mod ui;
mod whiteboard;

use app::InkpadApp;
use eframe::egui;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Set to any value to log at debug level
const DEBUG_ENV_VAR: &str = "INKPAD_DEBUG";

fn main() -> eframe::Result<()> {
    let level = if std::env::var_os(DEBUG_ENV_VAR).is_some() {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(level)
        .init();

    tracing::info!("Starting Inkpad...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Inkpad"),
        ..Default::default()
    };

    eframe::run_native(
        "Inkpad",
        native_options,
        Box::new(|cc| Ok(Box::new(InkpadApp::new(cc)))),
    )
}
