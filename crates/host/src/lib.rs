//! In-process stand-in for the privileged main process.
//!
//! Answers bridge calls for the manager window: persists saved lists, owns the
//! auto-refresh timer, checks unlock credentials and pushes window, log and
//! refresh-state events through the shared [`EventHub`].

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex as StdMutex, PoisonError,
    },
    time::Duration,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bridge::{EventHub, RemoteTransport};
use sha2::{Digest, Sha256};
use shared::{
    domain::{EntryKind, LogEntry, LogLevel, RefreshState, WindowState},
    error::HostError,
    limits::{refresh_interval_in_bounds, DEFAULT_REFRESH_INTERVAL_MS, MAX_LIST_ENTRIES},
    protocol::{BridgeEvent, BridgeRequest, CallResult, Credentials, UnlockOutcome},
};
use storage::Storage;
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

pub mod config;

pub use config::{load_settings, prepare_database_url, HostSettings};

/// Publishes host events, optionally mirroring them on the legacy alias
/// channels older windows listen on.
#[derive(Clone)]
struct Emitter {
    hub: EventHub,
    legacy_aliases: bool,
}

impl Emitter {
    fn emit(&self, event: &BridgeEvent) {
        let kind = event.kind();
        self.hub.emit(kind.primary_channel(), event);
        if self.legacy_aliases {
            if let Some(legacy) = kind.legacy_channel() {
                self.hub.emit(legacy, event);
            }
        }
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(&BridgeEvent::LogAppended(LogEntry::now(level, message)));
    }
}

struct RefreshSlot {
    state: RefreshState,
    task: Option<JoinHandle<()>>,
}

pub struct MainProcessHost {
    storage: Storage,
    emitter: Emitter,
    lock_digest: Option<[u8; 32]>,
    refresh: Mutex<RefreshSlot>,
    window: StdMutex<WindowState>,
    online: AtomicBool,
}

impl MainProcessHost {
    pub async fn open(settings: &HostSettings, events: EventHub) -> Result<Arc<Self>> {
        let database_url = prepare_database_url(&settings.database_url)?;
        let storage = Storage::new(&database_url)
            .await
            .with_context(|| format!("failed to open host storage at '{database_url}'"))?;
        storage.health_check().await?;
        Self::with_storage(settings, storage, events).await
    }

    pub async fn with_storage(
        settings: &HostSettings,
        storage: Storage,
        events: EventHub,
    ) -> Result<Arc<Self>> {
        let interval_ms = storage
            .load_refresh_settings()
            .await?
            .map(|stored| stored.interval_ms)
            .filter(|interval_ms| refresh_interval_in_bounds(*interval_ms))
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);

        let lock_digest = settings
            .lock_credentials()
            .map(|(user, pass)| credential_digest(user, pass));

        info!(
            interval_ms,
            lock_enabled = lock_digest.is_some(),
            legacy_event_aliases = settings.legacy_event_aliases,
            "main-process host ready"
        );

        Ok(Arc::new(Self {
            storage,
            emitter: Emitter {
                hub: events,
                legacy_aliases: settings.legacy_event_aliases,
            },
            lock_digest,
            refresh: Mutex::new(RefreshSlot {
                state: RefreshState::disabled(interval_ms),
                task: None,
            }),
            window: StdMutex::new(WindowState::Normal),
            online: AtomicBool::new(true),
        }))
    }

    pub fn requires_unlock(&self) -> bool {
        self.lock_digest.is_some()
    }

    pub async fn refresh_state(&self) -> RefreshState {
        self.refresh.lock().await.state
    }

    pub fn window_state(&self) -> WindowState {
        *self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn saved_entries(&self, kind: EntryKind) -> Result<Vec<String>> {
        self.storage.load_entries(kind).await
    }

    /// Pushes the authoritative refresh and window state so a freshly
    /// subscribed window can reconcile its cache.
    pub async fn announce_state(&self) {
        let refresh = self.refresh_state().await;
        self.emitter.emit(&BridgeEvent::RefreshStateChanged(refresh));
        self.emitter
            .emit(&BridgeEvent::WindowStateChanged(self.window_state()));
    }

    pub async fn shutdown(&self) {
        let mut slot = self.refresh.lock().await;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        slot.state.enabled = false;
    }

    async fn save_list(&self, kind: EntryKind, entries: Vec<String>) -> CallResult {
        if entries.len() > MAX_LIST_ENTRIES {
            return HostError::validation(format!(
                "{} list has {} entries, at most {MAX_LIST_ENTRIES} are allowed",
                kind.label(),
                entries.len()
            ))
            .into();
        }

        match self.storage.replace_entries(kind, &entries).await {
            Ok(()) => {
                debug!(kind = kind.label(), count = entries.len(), "saved list");
                CallResult::ok()
            }
            Err(err) => {
                warn!("failed to save {} list: {err:#}", kind.label());
                HostError::internal(format!("could not save {} list: {err:#}", kind.label()))
                    .into()
            }
        }
    }

    async fn start_refresh(&self, interval_ms: u64) -> CallResult {
        if !refresh_interval_in_bounds(interval_ms) {
            return HostError::validation(format!(
                "refresh interval {interval_ms} ms is out of range"
            ))
            .into();
        }

        let state = {
            let mut slot = self.refresh.lock().await;
            if let Some(previous) = slot.task.take() {
                previous.abort();
            }
            slot.task = Some(tokio::spawn(run_refresh_loop(
                self.emitter.clone(),
                Duration::from_millis(interval_ms),
            )));
            slot.state = RefreshState {
                enabled: true,
                interval_ms,
            };
            slot.state
        };

        if let Err(err) = self.storage.save_refresh_interval(interval_ms).await {
            warn!("refresh interval not persisted: {err:#}");
        }

        self.emitter.emit(&BridgeEvent::RefreshStateChanged(state));
        self.emitter.log(
            LogLevel::Success,
            format!("Auto-refresh started ({})", describe_interval(interval_ms)),
        );
        CallResult::ok()
    }

    async fn stop_refresh(&self) -> CallResult {
        let state = {
            let mut slot = self.refresh.lock().await;
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            slot.state.enabled = false;
            slot.state
        };

        self.emitter.emit(&BridgeEvent::RefreshStateChanged(state));
        self.emitter.log(LogLevel::Info, "Auto-refresh stopped");
        CallResult::ok()
    }

    fn try_unlock(&self, credentials: &Credentials) -> CallResult {
        let Some(expected) = self.lock_digest else {
            return CallResult::ok_with(UnlockOutcome {
                unlocked: true,
                message: Some("no lock configured".to_string()),
            });
        };

        let supplied = credential_digest(&credentials.user, &credentials.pass);
        if digests_match(&expected, &supplied) {
            self.emitter.log(
                LogLevel::Success,
                format!("Unlocked by {}", credentials.user),
            );
            CallResult::ok_with(UnlockOutcome {
                unlocked: true,
                message: None,
            })
        } else {
            self.emitter
                .log(LogLevel::Warning, "Unlock attempt with invalid credentials");
            CallResult::ok_with(UnlockOutcome {
                unlocked: false,
                message: Some("invalid credentials".to_string()),
            })
        }
    }

    fn apply_notification(&self, request: &BridgeRequest) -> Result<()> {
        match request {
            BridgeRequest::MinimizeWindow => self.set_window_state(|_| WindowState::Minimized),
            BridgeRequest::MaximizeWindow => self.set_window_state(|current| match current {
                WindowState::Maximized => WindowState::Normal,
                _ => WindowState::Maximized,
            }),
            BridgeRequest::CloseWindow => self.set_window_state(|_| WindowState::Closed),
            BridgeRequest::ReportWindowState { state } => {
                // The shell already shows this state; nothing to push back.
                let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
                if *window != *state {
                    debug!(from = window.label(), to = state.label(), "window state corrected");
                    *window = *state;
                }
            }
            BridgeRequest::ReportConnectivity { online } => {
                let previous = self.online.swap(*online, Ordering::SeqCst);
                if previous != *online {
                    if *online {
                        self.emitter
                            .log(LogLevel::Success, "Network connection restored");
                    } else {
                        self.emitter
                            .log(LogLevel::Warning, "Network connection lost");
                    }
                }
            }
            other => bail!("{} expects a reply and cannot be sent as a notification", other.method()),
        }
        Ok(())
    }

    fn set_window_state(&self, next: impl FnOnce(WindowState) -> WindowState) {
        let state = {
            let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
            *window = next(*window);
            *window
        };
        self.emitter.emit(&BridgeEvent::WindowStateChanged(state));
    }
}

impl Drop for MainProcessHost {
    fn drop(&mut self) {
        if let Some(task) = self.refresh.get_mut().task.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl RemoteTransport for MainProcessHost {
    async fn invoke(&self, request: BridgeRequest) -> Result<CallResult> {
        debug!(method = request.method(), "host handling call");
        let reply = match request {
            BridgeRequest::SaveList { kind, entries } => self.save_list(kind, entries).await,
            BridgeRequest::StartRefresh { interval_ms } => self.start_refresh(interval_ms).await,
            BridgeRequest::StopRefresh => self.stop_refresh().await,
            BridgeRequest::TryUnlock { credentials } => self.try_unlock(&credentials),
            BridgeRequest::GetVersion => CallResult::ok_with(env!("CARGO_PKG_VERSION")),
            other => {
                self.apply_notification(&other)?;
                CallResult::ok()
            }
        };
        Ok(reply)
    }

    fn notify(&self, request: BridgeRequest) -> Result<()> {
        self.apply_notification(&request)
    }
}

async fn run_refresh_loop(emitter: Emitter, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut cycle: u64 = 0;
    loop {
        ticker.tick().await;
        cycle += 1;
        emitter.log(LogLevel::Info, format!("Auto-refresh cycle {cycle}"));
    }
}

fn describe_interval(interval_ms: u64) -> String {
    if interval_ms % 60_000 == 0 {
        format!("every {} min", interval_ms / 60_000)
    } else if interval_ms % 1_000 == 0 {
        format!("every {} s", interval_ms / 1_000)
    } else {
        format!("every {interval_ms} ms")
    }
}

fn credential_digest(user: &str, pass: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(user.as_bytes());
    hasher.update([0u8]);
    hasher.update(pass.as_bytes());
    hasher.finalize().into()
}

fn digests_match(expected: &[u8; 32], supplied: &[u8; 32]) -> bool {
    expected
        .iter()
        .zip(supplied)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
