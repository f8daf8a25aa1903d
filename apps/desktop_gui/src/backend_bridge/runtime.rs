//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::NumberSocialApi;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};

/// Starts the backend worker thread. Every command runs as its own task on
/// the worker's runtime, so a slow request never holds up the next one.
pub fn launch(
    api: Arc<dyn NumberSocialApi>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                ))));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let api = Arc::clone(&api);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let cmd_name = cmd.name();
                let event = execute(api.as_ref(), cmd).await;
                deliver(ui_tx, cmd_name, event);
            });
        }
        tracing::info!("ui command queue closed; backend worker stopping");
    });
}

/// Hands a result to the UI. A full queue parks the result on a blocking
/// thread until the UI drains it, so no in-flight form is left waiting.
fn deliver(ui_tx: Sender<UiEvent>, cmd_name: &'static str, event: UiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => tracing::debug!(command = cmd_name, "backend result delivered"),
        Err(TrySendError::Full(event)) => {
            tracing::warn!(command = cmd_name, "ui event queue full; waiting for room");
            tokio::task::spawn_blocking(move || {
                if ui_tx.send(event).is_err() {
                    tracing::debug!(command = cmd_name, "ui closed before result arrived");
                }
            });
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!(command = cmd_name, "ui closed before result arrived")
        }
    }
}

pub async fn execute(api: &dyn NumberSocialApi, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::LoadTree { session } => {
            UiEvent::TreeLoaded(api.calculation_tree(session.as_ref()).await)
        }
        BackendCommand::Login { credentials } => {
            UiEvent::AuthFinished(api.login(&credentials).await)
        }
        BackendCommand::Register { credentials } => {
            UiEvent::AuthFinished(api.register(&credentials).await)
        }
        BackendCommand::CreateStartingNumber { session, request } => UiEvent::StartingNumberFinished(
            api.create_starting_number(Some(&session), &request).await,
        ),
        BackendCommand::CreateOperation { session, request } => UiEvent::OperationFinished {
            parent_id: request.parent_id,
            result: api.create_operation(Some(&session), &request).await,
        },
    }
}
