//! Controller layer: view state, UI events and command orchestration.

pub mod events;
pub mod orchestration;
pub mod state;

use crossbeam_channel::{Receiver, Sender};
use serde_json::Value;
use shared::{
    domain::{EntryKind, LogLevel, WindowState},
    protocol::{BridgeEvent, Credentials},
};

use crate::backend_bridge::commands::{BackendCommand, WindowAction};
use crate::ui::view::ViewTree;
use events::{UiErrorContext, UiEvent};
use orchestration::dispatch_backend_command;
use state::{ViewState, ViewStateStore};

/// Single owner of the window's state. Local mutations apply and render
/// before the matching backend command is queued; remote failures only add a
/// log entry.
pub struct ManagerController {
    store: ViewStateStore,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    pending_window: Option<WindowState>,
}

impl ManagerController {
    /// `lock_configured` locks the window before the host reports in, so
    /// nothing is editable until the user unlocks.
    pub fn new(
        mut store: ViewStateStore,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        lock_configured: bool,
    ) -> Self {
        if lock_configured {
            store.set_locked(true);
        }
        Self {
            store,
            cmd_tx,
            ui_rx,
            status: "Starting".to_string(),
            pending_window: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        self.store.state()
    }

    pub fn tree(&self) -> &ViewTree {
        self.store.tree()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns whether the entry was accepted.
    pub fn add_entry(&mut self, kind: EntryKind, input: &str) -> bool {
        if self.refuse_while_locked(&format!("add {}", kind.label())) {
            return false;
        }
        if self.store.add_entry(kind, input).is_err() {
            return false;
        }
        self.save_list(kind);
        true
    }

    pub fn delete_entry(&mut self, kind: EntryKind, entry: &str) {
        if self.refuse_while_locked(&format!("remove {}", kind.label())) {
            return;
        }
        if self.store.delete_entry(kind, entry) {
            self.save_list(kind);
        }
    }

    /// `seconds` is the raw interval text. Anything that is not a finite
    /// number is passed through as text so the bridge rejects it.
    pub fn start_refresh(&mut self, seconds: &str) {
        if self.refuse_while_locked("start auto-refresh") {
            return;
        }
        let interval_ms = match seconds.trim().parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => Value::from(seconds * 1000.0),
            _ => Value::String(seconds.to_string()),
        };
        self.dispatch(BackendCommand::StartRefresh { interval_ms });
    }

    pub fn stop_refresh(&mut self) {
        if self.refuse_while_locked("stop auto-refresh") {
            return;
        }
        self.dispatch(BackendCommand::StopRefresh);
    }

    pub fn window(&mut self, action: WindowAction) {
        if !self.dispatch(BackendCommand::Window(action)) {
            self.apply_window_locally(action);
        }
    }

    /// `observed_maximized` is what the platform reports for the viewport.
    /// When it disagrees with the cached state (restored from the taskbar,
    /// say) the host is corrected first so its toggle goes the right way.
    pub fn toggle_maximize(&mut self, observed_maximized: Option<bool>) {
        if let Some(maximized) = observed_maximized {
            let observed = if maximized {
                WindowState::Maximized
            } else {
                WindowState::Normal
            };
            if observed != self.store.state().window {
                self.store.set_window_state(observed);
                self.dispatch(BackendCommand::SyncWindow(observed));
            }
        }
        self.window(WindowAction::Maximize);
    }

    pub fn try_unlock(&mut self, user: &str, pass: &str) {
        self.dispatch(BackendCommand::TryUnlock {
            credentials: Credentials::new(user, pass),
        });
    }

    pub fn set_online(&mut self, online: bool) {
        if self.store.state().online == online {
            return;
        }
        self.store.set_online(online);
        self.dispatch(BackendCommand::ReportConnectivity { online });
    }

    pub fn clear_logs(&mut self) {
        self.store.clear_logs();
    }

    /// Window state pushed by the host that the shell has not applied yet.
    pub fn take_window_request(&mut self) -> Option<WindowState> {
        self.pending_window.take()
    }

    /// Applies every queued worker event. Returns how many were applied.
    pub fn process_ui_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.ui_rx.try_recv() {
            applied += 1;
            match event {
                UiEvent::HostReady { requires_unlock } => {
                    self.store.set_locked(requires_unlock);
                    self.status = if requires_unlock {
                        "Locked".to_string()
                    } else {
                        "Ready".to_string()
                    };
                }
                UiEvent::Info(message) => self.status = message,
                UiEvent::Pushed(event) => self.apply_pushed(event),
                UiEvent::ApplyWindowLocally(action) => self.apply_window_locally(action),
                UiEvent::ListSaved { kind, count } => {
                    tracing::debug!(kind = kind.label(), count, "list saved by host");
                }
                UiEvent::UnlockResult(outcome) => {
                    if outcome.unlocked {
                        self.store.set_locked(false);
                        self.status = "Ready".to_string();
                    } else {
                        self.status = outcome
                            .message
                            .unwrap_or_else(|| "Unlock failed".to_string());
                    }
                }
                UiEvent::Version(version) => self.store.set_version(version),
                UiEvent::Error(err) => {
                    if err.requires_reauth() {
                        self.store.set_locked(true);
                    }
                    if err.context() == UiErrorContext::Startup {
                        // No host, so nothing is refreshing.
                        self.store.clear_refresh_state();
                    }
                    self.status = err.message().to_string();
                    self.store.append_log(
                        err.log_level(),
                        format!("{}: {}", err.context().label(), err.message()),
                    );
                }
            }
        }
        applied
    }

    fn apply_pushed(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::LogAppended(entry) => self.store.push_log(entry),
            BridgeEvent::RefreshStateChanged(refresh) => self.store.set_refresh_state(refresh),
            BridgeEvent::WindowStateChanged(window) => {
                self.store.set_window_state(window);
                self.pending_window = Some(window);
            }
        }
    }

    fn apply_window_locally(&mut self, action: WindowAction) {
        let next = match action {
            WindowAction::Minimize => WindowState::Minimized,
            WindowAction::Maximize => match self.store.state().window {
                WindowState::Maximized => WindowState::Normal,
                _ => WindowState::Maximized,
            },
            WindowAction::Close => WindowState::Closed,
        };
        tracing::debug!(state = next.label(), "window control applied without the host");
        self.store.set_window_state(next);
        self.pending_window = Some(next);
    }

    fn refuse_while_locked(&mut self, action: &str) -> bool {
        if !self.store.state().locked {
            return false;
        }
        self.store
            .append_log(LogLevel::Warning, format!("Cannot {action} while locked"));
        true
    }

    fn save_list(&mut self, kind: EntryKind) {
        let entries = self.store.entries(kind).to_vec();
        self.dispatch(BackendCommand::SaveList { kind, entries });
    }

    /// Returns whether the command was queued.
    fn dispatch(&mut self, cmd: BackendCommand) -> bool {
        let queued = dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
        if !queued {
            let reason = self.status.clone();
            self.store.append_log(LogLevel::Error, reason);
        }
        queued
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
