use super::*;

use bridge::BridgeError;
use crossbeam_channel::bounded;
use shared::{
    domain::{LogEntry, RefreshState},
    limits::DEFAULT_MAX_LOGS,
    protocol::UnlockOutcome,
};

use crate::controller::events::UiError;
use crate::persistence::MemoryStore;

struct Harness {
    controller: ManagerController,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    snapshots: MemoryStore,
}

fn harness() -> Harness {
    harness_with_lock(false)
}

fn harness_with_lock(lock_configured: bool) -> Harness {
    let snapshots = MemoryStore::new();
    let store = ViewStateStore::load(Box::new(snapshots.clone()), DEFAULT_MAX_LOGS);
    let (cmd_tx, cmd_rx) = bounded(16);
    let (ui_tx, ui_rx) = bounded(16);
    Harness {
        controller: ManagerController::new(store, cmd_tx, ui_rx, lock_configured),
        cmd_rx,
        ui_tx,
        snapshots,
    }
}

fn queued(cmd_rx: &Receiver<BackendCommand>) -> Vec<BackendCommand> {
    cmd_rx.try_iter().collect()
}

fn newest_log(controller: &ManagerController) -> &LogEntry {
    controller.state().logs.front().expect("a log entry")
}

#[test]
fn accepted_entry_is_persisted_locally_and_sent_to_the_host() {
    let mut h = harness();

    assert!(h.controller.add_entry(EntryKind::Products, " Widget "));

    assert_eq!(h.snapshots.get("manager.products").as_deref(), Some(r#"["Widget"]"#));
    match queued(&h.cmd_rx).as_slice() {
        [BackendCommand::SaveList { kind, entries }] => {
            assert_eq!(*kind, EntryKind::Products);
            assert_eq!(entries, &vec!["Widget".to_string()]);
        }
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn rejected_entry_sends_nothing() {
    let mut h = harness();
    h.controller.add_entry(EntryKind::Keywords, "sale");
    queued(&h.cmd_rx);

    assert!(!h.controller.add_entry(EntryKind::Keywords, "SALE"));
    assert!(queued(&h.cmd_rx).is_empty());
    assert_eq!(newest_log(&h.controller).level, LogLevel::Warning);
}

#[test]
fn deleting_an_absent_entry_sends_nothing() {
    let mut h = harness();

    h.controller.delete_entry(EntryKind::Products, "ghost");
    assert!(queued(&h.cmd_rx).is_empty());
}

#[test]
fn refresh_interval_text_is_converted_to_milliseconds() {
    let mut h = harness();

    h.controller.start_refresh("45");
    h.controller.start_refresh("soon");

    match queued(&h.cmd_rx).as_slice() {
        [BackendCommand::StartRefresh { interval_ms: first }, BackendCommand::StartRefresh { interval_ms: second }] =>
        {
            assert_eq!(first.as_f64(), Some(45_000.0));
            assert_eq!(second, &Value::String("soon".to_string()));
        }
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn remote_failure_adds_an_error_log_and_keeps_optimistic_state() {
    let mut h = harness();
    h.controller.add_entry(EntryKind::Products, "Widget");

    let err = BridgeError::Remote {
        method: "products.save",
        message: "disk full".to_string(),
    };
    h.ui_tx
        .send(UiEvent::Error(UiError::from_bridge(UiErrorContext::SaveList, &err)))
        .expect("send");
    h.controller.process_ui_events();

    assert_eq!(h.controller.state().products, vec!["Widget".to_string()]);
    let log = newest_log(&h.controller);
    assert_eq!(log.level, LogLevel::Error);
    assert!(log.message.contains("disk full"));
}

#[test]
fn validation_failure_from_the_bridge_is_a_warning() {
    let mut h = harness();
    h.ui_tx
        .send(UiEvent::Error(UiError::from_bridge(
            UiErrorContext::Refresh,
            &BridgeError::Validation {
                method: "refresh.start",
                source: bridge::ValidationError::IntervalNotNumber,
            },
        )))
        .expect("send");

    h.controller.process_ui_events();
    assert_eq!(newest_log(&h.controller).level, LogLevel::Warning);
}

#[test]
fn pushed_events_update_the_store() {
    let mut h = harness();
    let events = [
        UiEvent::Pushed(BridgeEvent::LogAppended(LogEntry::now(
            LogLevel::Success,
            "Auto-refresh started",
        ))),
        UiEvent::Pushed(BridgeEvent::RefreshStateChanged(RefreshState {
            enabled: true,
            interval_ms: 9_000,
        })),
        UiEvent::Pushed(BridgeEvent::WindowStateChanged(WindowState::Maximized)),
        UiEvent::Version("0.9.0".to_string()),
    ];
    for event in events {
        h.ui_tx.send(event).expect("send");
    }

    assert_eq!(h.controller.process_ui_events(), 4);

    let state = h.controller.state();
    assert_eq!(state.logs.front().map(|e| e.message.as_str()), Some("Auto-refresh started"));
    assert!(state.refresh.enabled);
    assert_eq!(state.refresh.interval_ms, 9_000);
    assert_eq!(state.window, WindowState::Maximized);
    assert_eq!(h.controller.tree().header.title, "Manager v0.9.0");
    assert_eq!(h.controller.take_window_request(), Some(WindowState::Maximized));
    assert_eq!(h.controller.take_window_request(), None);
}

#[test]
fn lock_follows_host_and_unlock_results() {
    let mut h = harness();
    h.ui_tx
        .send(UiEvent::HostReady {
            requires_unlock: true,
        })
        .expect("send");
    h.controller.process_ui_events();
    assert!(h.controller.state().locked);

    h.ui_tx
        .send(UiEvent::UnlockResult(UnlockOutcome {
            unlocked: false,
            message: Some("invalid credentials".to_string()),
        }))
        .expect("send");
    h.controller.process_ui_events();
    assert!(h.controller.state().locked);
    assert_eq!(h.controller.status(), "invalid credentials");

    h.ui_tx
        .send(UiEvent::UnlockResult(UnlockOutcome {
            unlocked: true,
            message: None,
        }))
        .expect("send");
    h.controller.process_ui_events();
    assert!(!h.controller.state().locked);
}

#[test]
fn connectivity_is_reported_only_on_change() {
    let mut h = harness();

    h.controller.set_online(true);
    h.controller.set_online(false);
    h.controller.set_online(false);

    assert!(matches!(
        queued(&h.cmd_rx).as_slice(),
        [BackendCommand::ReportConnectivity { online: false }]
    ));
    assert!(!h.controller.state().online);
}

#[test]
fn disconnected_worker_is_logged_as_an_error() {
    let mut h = harness();
    drop(h.cmd_rx);

    h.controller.window(WindowAction::Minimize);

    let log = newest_log(&h.controller);
    assert_eq!(log.level, LogLevel::Error);
    assert!(log.message.contains("disconnected"));
}

#[test]
fn host_startup_failure_clears_cached_refresh_state() {
    let mut h = harness();
    h.ui_tx
        .send(UiEvent::Pushed(BridgeEvent::RefreshStateChanged(RefreshState {
            enabled: true,
            interval_ms: 5_000,
        })))
        .expect("send");
    h.ui_tx
        .send(UiEvent::Error(UiError::from_message(
            UiErrorContext::Startup,
            "host unavailable: disk error",
        )))
        .expect("send");

    h.controller.process_ui_events();

    assert_eq!(h.controller.state().refresh, RefreshState::disabled(5_000));
    assert_eq!(newest_log(&h.controller).level, LogLevel::Error);
}

#[test]
fn configured_lock_applies_before_the_host_reports_in() {
    let mut h = harness_with_lock(true);

    assert!(h.controller.state().locked);
    assert!(h.controller.tree().header.locked);
    assert!(!h.controller.add_entry(EntryKind::Products, "Widget"));
    h.controller.delete_entry(EntryKind::Products, "Widget");
    h.controller.start_refresh("30");
    h.controller.stop_refresh();

    assert!(queued(&h.cmd_rx).is_empty());
    assert!(h.controller.state().products.is_empty());
    assert_eq!(h.snapshots.get("manager.products"), None);
    let log = newest_log(&h.controller);
    assert_eq!(log.level, LogLevel::Warning);
    assert!(log.message.contains("while locked"));
}

#[test]
fn lock_stays_on_when_the_host_fails_to_start() {
    let mut h = harness_with_lock(true);
    h.ui_tx
        .send(UiEvent::Error(UiError::from_message(
            UiErrorContext::Startup,
            "host unavailable: disk error",
        )))
        .expect("send");
    h.controller.process_ui_events();

    assert!(h.controller.state().locked);
    assert!(!h.controller.add_entry(EntryKind::Keywords, "sale"));
}

#[test]
fn window_controls_apply_locally_when_the_worker_is_gone() {
    let mut h = harness();
    drop(h.cmd_rx);

    h.controller.window(WindowAction::Maximize);
    assert_eq!(h.controller.take_window_request(), Some(WindowState::Maximized));
    h.controller.window(WindowAction::Maximize);
    assert_eq!(h.controller.take_window_request(), Some(WindowState::Normal));
    h.controller.window(WindowAction::Close);
    assert_eq!(h.controller.take_window_request(), Some(WindowState::Closed));
}

#[test]
fn undelivered_window_control_from_the_worker_is_applied() {
    let mut h = harness();
    h.ui_tx
        .send(UiEvent::ApplyWindowLocally(WindowAction::Close))
        .expect("send");

    h.controller.process_ui_events();

    assert_eq!(h.controller.state().window, WindowState::Closed);
    assert_eq!(h.controller.take_window_request(), Some(WindowState::Closed));
}

#[test]
fn maximize_corrects_a_stale_window_state_first() {
    let mut h = harness();
    h.ui_tx
        .send(UiEvent::Pushed(BridgeEvent::WindowStateChanged(
            WindowState::Minimized,
        )))
        .expect("send");
    h.controller.process_ui_events();
    h.controller.take_window_request();

    // Restored from the taskbar; the platform reports a normal window.
    h.controller.toggle_maximize(Some(false));

    assert!(matches!(
        queued(&h.cmd_rx).as_slice(),
        [
            BackendCommand::SyncWindow(WindowState::Normal),
            BackendCommand::Window(WindowAction::Maximize)
        ]
    ));
}

#[test]
fn maximize_without_a_platform_report_only_toggles() {
    let mut h = harness();

    h.controller.toggle_maximize(None);
    h.controller.toggle_maximize(Some(false));

    assert!(matches!(
        queued(&h.cmd_rx).as_slice(),
        [
            BackendCommand::Window(WindowAction::Maximize),
            BackendCommand::Window(WindowAction::Maximize)
        ]
    ));
}
