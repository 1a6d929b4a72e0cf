//! Declarative view tree built from [`ViewState`].
//!
//! `render` is pure: the same state always yields the same tree. The store
//! keeps a cached tree and rebuilds one section at a time after a mutation;
//! the egui shell only paints what is here.

use chrono::Local;
use shared::{
    domain::{EntryKind, LogLevel, WindowState},
    limits::MAX_LIST_ENTRIES,
};

use crate::controller::state::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Products,
    Keywords,
    Refresh,
    Log,
}

impl Section {
    pub fn for_list(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Products => Self::Products,
            EntryKind::Keywords => Self::Keywords,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTree {
    pub header: HeaderView,
    pub products: ListView,
    pub keywords: ListView,
    pub refresh: RefreshView,
    pub log: LogView,
}

impl ViewTree {
    pub fn list(&self, kind: EntryKind) -> &ListView {
        match kind {
            EntryKind::Products => &self.products,
            EntryKind::Keywords => &self.keywords,
        }
    }

    pub fn rebuild(&mut self, section: Section, state: &ViewState) {
        match section {
            Section::Header => self.header = render_header(state),
            Section::Products => self.products = render_list(state, EntryKind::Products),
            Section::Keywords => self.keywords = render_list(state, EntryKind::Keywords),
            Section::Refresh => self.refresh = render_refresh(state),
            Section::Log => self.log = render_log(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub title: String,
    pub online: bool,
    pub connectivity_label: &'static str,
    pub maximized: bool,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub kind: EntryKind,
    pub title: &'static str,
    pub count_label: String,
    pub rows: Vec<String>,
    pub empty_hint: Option<&'static str>,
    pub full: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshView {
    pub enabled: bool,
    pub interval_ms: u64,
    pub status_label: String,
    pub toggle_label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogView {
    pub rows: Vec<LogRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

pub fn render(state: &ViewState) -> ViewTree {
    ViewTree {
        header: render_header(state),
        products: render_list(state, EntryKind::Products),
        keywords: render_list(state, EntryKind::Keywords),
        refresh: render_refresh(state),
        log: render_log(state),
    }
}

fn render_header(state: &ViewState) -> HeaderView {
    let title = match &state.version {
        Some(version) => format!("Manager v{version}"),
        None => "Manager".to_string(),
    };
    HeaderView {
        title,
        online: state.online,
        connectivity_label: if state.online { "Online" } else { "Offline" },
        maximized: state.window == WindowState::Maximized,
        locked: state.locked,
    }
}

fn render_list(state: &ViewState, kind: EntryKind) -> ListView {
    let entries = state.entries(kind);
    let (title, empty_hint) = match kind {
        EntryKind::Products => ("Products", "No products yet"),
        EntryKind::Keywords => ("Keywords", "No keywords yet"),
    };
    ListView {
        kind,
        title,
        count_label: format!("{} / {MAX_LIST_ENTRIES}", entries.len()),
        rows: entries.to_vec(),
        empty_hint: entries.is_empty().then_some(empty_hint),
        full: entries.len() >= MAX_LIST_ENTRIES,
    }
}

fn render_refresh(state: &ViewState) -> RefreshView {
    let seconds = state.refresh.interval_ms as f64 / 1000.0;
    let status_label = if state.refresh.enabled {
        format!("Running every {seconds} s")
    } else {
        "Stopped".to_string()
    };
    RefreshView {
        enabled: state.refresh.enabled,
        interval_ms: state.refresh.interval_ms,
        status_label,
        toggle_label: if state.refresh.enabled { "Stop" } else { "Start" },
    }
}

fn render_log(state: &ViewState) -> LogView {
    LogView {
        rows: state
            .logs
            .iter()
            .map(|entry| LogRow {
                time: entry
                    .timestamp
                    .with_timezone(&Local)
                    .format("%H:%M:%S")
                    .to_string(),
                level: entry.level,
                message: entry.message.clone(),
            })
            .collect(),
    }
}
