// No console window for release builds on Windows.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use background_remover::app::APP_TITLE;
use background_remover::{BackgroundRemoverApp, Config, LazyModel};

fn init_tracing(verbose: bool) {
    let writer = if verbose {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::sink)
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .parse_lossy(""),
        )
        .with_writer(writer)
        .init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("{info}");
    }));
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.verbose);

    let model = LazyModel::new(&config).context("Failed to configure the model")?;
    tracing::info!(model = %model.model_path().display(), "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_maximized(true)
            .with_min_inner_size([640.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(BackgroundRemoverApp::new(&cc.egui_ctx, model)?))),
    )
    .map_err(|e| anyhow!("{e}"))?;

    tracing::info!("window closed");
    Ok(())
}
