//! Runtime bridge between the UI command queue and backend event intake.

use std::thread;

use anyhow::anyhow;
use bridge::{EventHub, Subscription, ValidatedBridge};
use crossbeam_channel::{Receiver, Sender};
use host::{HostSettings, MainProcessHost};
use shared::protocol::{BridgeEvent, EventKind};

use crate::backend_bridge::commands::{BackendCommand, WindowAction};
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    settings: HostSettings,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("manager-backend".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::error!("failed to build backend runtime: {err}");
                    send(
                        &ui_tx,
                        UiEvent::Error(UiError::from_message(
                            UiErrorContext::Startup,
                            format!("backend worker startup failure: {err}"),
                        )),
                    );
                    return;
                }
            };
            runtime.block_on(run_worker(cmd_rx, ui_tx, settings));
        })
}

async fn run_worker(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: HostSettings) {
    send(&ui_tx, UiEvent::Info("Backend worker starting...".to_string()));

    let events = EventHub::new();
    let subscriptions = forward_events(&events, &ui_tx);

    let host = match MainProcessHost::open(&settings, events.clone()).await {
        Ok(host) => Some(host),
        Err(err) => {
            tracing::error!("main-process host failed to start: {err:#}");
            send(
                &ui_tx,
                UiEvent::Error(UiError::from_message(
                    UiErrorContext::Startup,
                    format!("host unavailable: {err:#}"),
                )),
            );
            None
        }
    };

    let bridge = match &host {
        Some(host) => {
            send(
                &ui_tx,
                UiEvent::HostReady {
                    requires_unlock: host.requires_unlock(),
                },
            );
            host.announce_state().await;
            ValidatedBridge::new(host.clone())
        }
        None => ValidatedBridge::disconnected(),
    };

    handle_command(&bridge, BackendCommand::FetchVersion, &ui_tx).await;
    send(&ui_tx, UiEvent::Info("Backend worker ready".to_string()));

    while let Ok(cmd) = cmd_rx.recv() {
        handle_command(&bridge, cmd, &ui_tx).await;
    }

    if let Some(host) = host {
        host.shutdown().await;
    }
    for subscription in &subscriptions {
        subscription.unsubscribe();
    }
    tracing::debug!("backend worker stopped");
}

/// Forwards every pushed bridge event into the UI queue. A full queue is a
/// listener failure; the hub logs it and keeps delivering.
fn forward_events(events: &EventHub, ui_tx: &Sender<UiEvent>) -> Vec<Subscription> {
    [EventKind::WindowState, EventKind::Log, EventKind::RefreshState]
        .into_iter()
        .map(|kind| {
            let ui_tx = ui_tx.clone();
            events.subscribe(kind, move |event: &BridgeEvent| {
                ui_tx
                    .try_send(UiEvent::Pushed(event.clone()))
                    .map_err(|err| anyhow!("ui queue rejected {kind:?} event: {err}"))
            })
        })
        .collect()
}

pub async fn handle_command(bridge: &ValidatedBridge, cmd: BackendCommand, ui_tx: &Sender<UiEvent>) {
    let command = cmd.name();
    tracing::debug!(command, "backend: handling command");

    let outcome: Result<Option<UiEvent>, UiError> = match cmd {
        BackendCommand::Window(action) => {
            let delivered = match action {
                WindowAction::Minimize => bridge.minimize(),
                WindowAction::Maximize => bridge.maximize(),
                WindowAction::Close => bridge.close(),
            };
            // Without a host nothing pushes the new state back, and the
            // window has no native controls to fall back on.
            match delivered {
                Ok(()) => Ok(None),
                Err(_) => Ok(Some(UiEvent::ApplyWindowLocally(action))),
            }
        }
        BackendCommand::SyncWindow(state) => {
            // Already logged by the bridge; the shell shows this state anyway.
            let _ = bridge.report_window_state(state);
            Ok(None)
        }
        BackendCommand::SaveList { kind, entries } => {
            let count = entries.len();
            bridge
                .save_list(kind, entries)
                .await
                .map(|()| Some(UiEvent::ListSaved { kind, count }))
                .map_err(|err| UiError::from_bridge(UiErrorContext::SaveList, &err))
        }
        BackendCommand::StartRefresh { interval_ms } => bridge
            .start_auto_refresh(interval_ms)
            .await
            .map(|()| None)
            .map_err(|err| UiError::from_bridge(UiErrorContext::Refresh, &err)),
        BackendCommand::StopRefresh => bridge
            .stop_auto_refresh()
            .await
            .map(|()| None)
            .map_err(|err| UiError::from_bridge(UiErrorContext::Refresh, &err)),
        BackendCommand::TryUnlock { credentials } => bridge
            .unlock_with(&credentials)
            .await
            .map(|outcome| Some(UiEvent::UnlockResult(outcome)))
            .map_err(|err| UiError::from_bridge(UiErrorContext::Unlock, &err)),
        BackendCommand::ReportConnectivity { online } => {
            bridge.report_connectivity(online);
            Ok(None)
        }
        BackendCommand::FetchVersion => bridge
            .get_version()
            .await
            .map(|version| Some(UiEvent::Version(version)))
            .map_err(|err| UiError::from_bridge(UiErrorContext::General, &err)),
    };

    match outcome {
        Ok(Some(event)) => send(ui_tx, event),
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(command, category = ?err.category(), "backend: {}", err.message());
            send(ui_tx, UiEvent::Error(err));
        }
    }
}

fn send(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if let Err(err) = ui_tx.try_send(event) {
        tracing::warn!("dropping ui event: {err}");
    }
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
