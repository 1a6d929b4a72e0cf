mod backend_bridge;
mod config;
mod controller;
mod persistence;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use config::{AppPaths, StartupConfig};
use controller::{events::UiEvent, state::ViewStateStore, ManagerController};
use persistence::JsonFileStore;
use ui::ManagerApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let startup = StartupConfig::parse();
    let paths = AppPaths::from_startup(&startup);
    let settings = paths.host_settings(&startup);

    let snapshots = JsonFileStore::new(&paths.snapshot_path);
    tracing::info!(
        data_root = %paths.data_root.display(),
        snapshots = %snapshots.path().display(),
        max_logs = startup.max_logs,
        "starting manager window"
    );
    let store = ViewStateStore::load(Box::new(snapshots), startup.max_logs);

    let lock_configured = settings.lock_credentials().is_some();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    if let Err(err) = backend_bridge::runtime::launch(cmd_rx, ui_tx, settings) {
        // Commands will report the worker as disconnected.
        tracing::error!("failed to spawn backend worker: {err}");
    }
    let controller = ManagerController::new(store, cmd_tx, ui_rx, lock_configured);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Manager")
            .with_decorations(false)
            .with_inner_size([960.0, 680.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Manager",
        options,
        Box::new(move |_cc| Ok(Box::new(ManagerApp::new(controller)))),
    )
}
