mod app;
mod cli;
mod color;
mod config;
mod data;
mod scatter;
mod state;
mod ui;

use anyhow::anyhow;
use app::CsvVisorApp;
use clap::Parser;
use cli::Args;
use config::ViewerConfig;
use data::reference;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = ViewerConfig::load(args.config.as_deref())?;
    if let Some(reference_file) = args.reference {
        config.reference_file = Some(reference_file);
    }
    log::debug!("Using config {config:?}");

    let labels = reference::load_labels(&reference::candidate_paths(config.reference_file.as_deref()));
    log::info!("{} emitter labels available", labels.len());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    let initial_file = args.path;
    eframe::run_native(
        "CSV Visor",
        options,
        Box::new(move |cc| {
            Ok(Box::new(CsvVisorApp::new(
                &cc.egui_ctx,
                &config,
                labels,
                initial_file,
            )))
        }),
    )
    .map_err(|e| anyhow!("viewer exited with an error: {e}"))
}
