mod backend_bridge;
mod controller;
mod ui;

use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use client_core::{config::load_settings, ApiClient, FileSessionStore};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{AppPaths, NumberSocialApp, StartupConfig};

const APP_TITLE: &str = "Number Social";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let startup = StartupConfig::parse();
    let settings = load_settings(startup.overrides())?;
    let paths = AppPaths::from_settings(&settings);
    tracing::info!(
        api = %settings.api_base_url,
        data_root = %paths.data_root.display(),
        "starting desktop gui"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(
        Arc::new(ApiClient::new(settings.api_base_url)),
        cmd_rx,
        ui_tx,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    let session_store = FileSessionStore::new(paths.session_path);
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(NumberSocialApp::new(
                cmd_tx,
                ui_rx,
                Box::new(session_store),
            )))
        }),
    )
    .map_err(|err| anyhow!("desktop gui exited with an error: {err}"))
}
