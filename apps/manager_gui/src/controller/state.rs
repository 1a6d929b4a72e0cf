//! View state owned by the manager window and the store that mutates it.

use std::collections::VecDeque;

use shared::{
    domain::{EntryKind, LogEntry, LogLevel, RefreshState, WindowState},
    limits::MAX_LIST_ENTRIES,
};
use thiserror::Error;

use crate::{
    persistence::SnapshotStore,
    ui::view::{self, Section, ViewTree},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub products: Vec<String>,
    pub keywords: Vec<String>,
    /// Newest first.
    pub logs: VecDeque<LogEntry>,
    pub max_logs: usize,
    pub refresh: RefreshState,
    pub online: bool,
    pub window: WindowState,
    pub locked: bool,
    pub version: Option<String>,
}

impl ViewState {
    pub fn new(max_logs: usize) -> Self {
        Self {
            products: Vec::new(),
            keywords: Vec::new(),
            logs: VecDeque::new(),
            max_logs: max_logs.max(1),
            refresh: RefreshState::default(),
            online: true,
            window: WindowState::Normal,
            locked: false,
            version: None,
        }
    }

    pub fn entries(&self, kind: EntryKind) -> &[String] {
        match kind {
            EntryKind::Products => &self.products,
            EntryKind::Keywords => &self.keywords,
        }
    }

    fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<String> {
        match kind {
            EntryKind::Products => &mut self.products,
            EntryKind::Keywords => &mut self.keywords,
        }
    }
}

/// Why an entry was not added. Rejections are soft: they become a warning in
/// the activity log and leave the list untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryRejection {
    #[error("{} cannot be empty", .kind.label())]
    Empty { kind: EntryKind },
    #[error("{} is {len} characters long, the limit is {max}", .kind.label())]
    TooLong {
        kind: EntryKind,
        len: usize,
        max: usize,
    },
    #[error("{} \"{entry}\" is already in the list", .kind.label())]
    Duplicate { kind: EntryKind, entry: String },
    #[error("{} list already holds {max} entries", .kind.label())]
    ListFull { kind: EntryKind, max: usize },
}

pub struct ViewStateStore {
    state: ViewState,
    tree: ViewTree,
    snapshots: Box<dyn SnapshotStore>,
}

impl ViewStateStore {
    pub fn new(state: ViewState, snapshots: Box<dyn SnapshotStore>) -> Self {
        let tree = view::render(&state);
        Self {
            state,
            tree,
            snapshots,
        }
    }

    /// Restores both lists from their snapshots. A missing snapshot starts
    /// empty; an unreadable or malformed one starts empty and is reported in
    /// the activity log.
    pub fn load(snapshots: Box<dyn SnapshotStore>, max_logs: usize) -> Self {
        let mut store = Self::new(ViewState::new(max_logs), snapshots);
        for kind in EntryKind::ALL {
            match read_snapshot(store.snapshots.as_ref(), kind) {
                Ok(entries) => *store.state.entries_mut(kind) = entries,
                Err(reason) => {
                    tracing::warn!(key = kind.storage_key(), "discarding snapshot: {reason}");
                    store.append_log(
                        LogLevel::Warning,
                        format!("Saved {} list could not be read; starting empty", kind.label()),
                    );
                }
            }
            store.tree.rebuild(Section::for_list(kind), &store.state);
        }
        store
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn entries(&self, kind: EntryKind) -> &[String] {
        self.state.entries(kind)
    }

    pub fn add_entry(&mut self, kind: EntryKind, input: &str) -> Result<(), EntryRejection> {
        match self.admit(kind, input) {
            Ok(entry) => {
                self.state.entries_mut(kind).push(entry.clone());
                self.persist(kind);
                self.tree.rebuild(Section::for_list(kind), &self.state);
                self.append_log(LogLevel::Info, format!("Added {}: {entry}", kind.label()));
                Ok(())
            }
            Err(rejection) => {
                self.append_log(
                    LogLevel::Warning,
                    format!("Cannot add {}: {rejection}", kind.label()),
                );
                Err(rejection)
            }
        }
    }

    /// Returns `false` and changes nothing when `entry` is not in the list.
    pub fn delete_entry(&mut self, kind: EntryKind, entry: &str) -> bool {
        let entries = self.state.entries_mut(kind);
        let Some(position) = entries.iter().position(|existing| existing == entry) else {
            tracing::debug!(kind = kind.label(), entry, "delete of absent entry ignored");
            return false;
        };
        let removed = entries.remove(position);

        self.persist(kind);
        self.tree.rebuild(Section::for_list(kind), &self.state);
        self.append_log(LogLevel::Info, format!("Removed {}: {removed}", kind.label()));
        true
    }

    pub fn append_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.push_log(LogEntry::now(level, message));
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.state.logs.push_front(entry);
        self.state.logs.truncate(self.state.max_logs);
        self.tree.rebuild(Section::Log, &self.state);
    }

    pub fn clear_logs(&mut self) {
        self.state.logs.clear();
        self.tree.rebuild(Section::Log, &self.state);
    }

    pub fn set_refresh_state(&mut self, state: RefreshState) {
        let clamped = state.clamped();
        if clamped != state {
            tracing::warn!(
                pushed = state.interval_ms,
                clamped = clamped.interval_ms,
                "refresh interval out of range; clamped"
            );
        }
        self.state.refresh = clamped;
        self.tree.rebuild(Section::Refresh, &self.state);
    }

    pub fn clear_refresh_state(&mut self) {
        self.state.refresh = RefreshState::disabled(self.state.refresh.interval_ms);
        self.tree.rebuild(Section::Refresh, &self.state);
    }

    pub fn set_online(&mut self, online: bool) {
        self.state.online = online;
        self.tree.rebuild(Section::Header, &self.state);
    }

    pub fn set_window_state(&mut self, window: WindowState) {
        self.state.window = window;
        self.tree.rebuild(Section::Header, &self.state);
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.state.locked = locked;
        self.tree.rebuild(Section::Header, &self.state);
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.state.version = Some(version.into());
        self.tree.rebuild(Section::Header, &self.state);
    }

    fn admit(&self, kind: EntryKind, input: &str) -> Result<String, EntryRejection> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EntryRejection::Empty { kind });
        }

        let len = trimmed.chars().count();
        let max = kind.max_entry_chars();
        if len > max {
            return Err(EntryRejection::TooLong { kind, len, max });
        }

        let entry = kind.normalize(trimmed);
        let folded = entry.to_lowercase();
        let entries = self.state.entries(kind);
        if entries.iter().any(|existing| existing.to_lowercase() == folded) {
            return Err(EntryRejection::Duplicate { kind, entry });
        }
        if entries.len() >= MAX_LIST_ENTRIES {
            return Err(EntryRejection::ListFull {
                kind,
                max: MAX_LIST_ENTRIES,
            });
        }
        Ok(entry)
    }

    fn persist(&mut self, kind: EntryKind) {
        let result = serde_json::to_string(self.state.entries(kind))
            .map_err(anyhow::Error::from)
            .and_then(|serialized| self.snapshots.write(kind.storage_key(), &serialized));
        if let Err(err) = result {
            tracing::warn!(key = kind.storage_key(), "snapshot write failed: {err:#}");
            self.append_log(
                LogLevel::Warning,
                format!("Could not save {} list locally", kind.label()),
            );
        }
    }
}

fn read_snapshot(snapshots: &dyn SnapshotStore, kind: EntryKind) -> Result<Vec<String>, String> {
    let raw = match snapshots.read(kind.storage_key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(Vec::new()),
        Err(err) => return Err(format!("{err:#}")),
    };
    let stored: Vec<String> = serde_json::from_str(&raw).map_err(|err| err.to_string())?;

    // Older snapshots may predate the current limits; keep what still fits.
    let mut entries: Vec<String> = Vec::with_capacity(stored.len());
    for value in stored {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().count() > kind.max_entry_chars() {
            continue;
        }
        let entry = kind.normalize(trimmed);
        let folded = entry.to_lowercase();
        if entries.iter().any(|existing| existing.to_lowercase() == folded) {
            continue;
        }
        entries.push(entry);
        if entries.len() == MAX_LIST_ENTRIES {
            break;
        }
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "../tests/state_tests.rs"]
mod tests;
