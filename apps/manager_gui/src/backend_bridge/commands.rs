//! Backend commands queued from the UI to the backend worker.

use serde_json::Value;
use shared::{
    domain::{EntryKind, WindowState},
    protocol::Credentials,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    Minimize,
    Maximize,
    Close,
}

/// Arguments are carried as the UI produced them; the bridge validates them
/// on the worker before anything reaches the host.
#[derive(Debug)]
pub enum BackendCommand {
    Window(WindowAction),
    /// The shell saw a window state the host did not cause.
    SyncWindow(WindowState),
    SaveList { kind: EntryKind, entries: Vec<String> },
    StartRefresh { interval_ms: Value },
    StopRefresh,
    TryUnlock { credentials: Credentials },
    ReportConnectivity { online: bool },
    FetchVersion,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Window(WindowAction::Minimize) => "window_minimize",
            Self::Window(WindowAction::Maximize) => "window_maximize",
            Self::Window(WindowAction::Close) => "window_close",
            Self::SyncWindow(_) => "sync_window",
            Self::SaveList {
                kind: EntryKind::Products,
                ..
            } => "save_products",
            Self::SaveList {
                kind: EntryKind::Keywords,
                ..
            } => "save_keywords",
            Self::StartRefresh { .. } => "start_refresh",
            Self::StopRefresh => "stop_refresh",
            Self::TryUnlock { .. } => "try_unlock",
            Self::ReportConnectivity { .. } => "report_connectivity",
            Self::FetchVersion => "fetch_version",
        }
    }
}
