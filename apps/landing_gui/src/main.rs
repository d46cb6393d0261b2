mod backend_bridge;
mod controller;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use crossbeam_channel::bounded;
use page_core::config::{load_settings_from, DEFAULT_CONFIG_PATH};
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::PageCommand;
use crate::controller::events::UiEvent;
use crate::ui::LandingApp;

#[derive(Debug, Parser)]
#[command(name = "landing-gui", about = "Secure Core landing page")]
struct Args {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Skip the decorative scene.
    #[arg(long)]
    no_scene: bool,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut settings = load_settings_from(&args.config);
    if args.no_scene {
        settings.scene_enabled = false;
    }
    tracing::info!(
        config = %args.config.display(),
        backend = ?settings.persistence,
        scene = settings.scene_enabled,
        "page: starting landing window"
    );

    let (cmd_tx, cmd_rx) = tokio::sync::mpsc::channel::<PageCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Secure Core")
            .with_inner_size([1100.0, 820.0])
            .with_min_inner_size([640.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Secure Core",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            backend_bridge::runtime::launch(settings.clone(), cmd_rx, ui_tx, cc.egui_ctx.clone());
            Ok(Box::new(LandingApp::new(cmd_tx, ui_rx, &settings)))
        }),
    )
}
