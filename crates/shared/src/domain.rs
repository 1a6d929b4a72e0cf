use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::limits::{
    DEFAULT_REFRESH_INTERVAL_MS, MAX_KEYWORD_CHARS, MAX_PRODUCT_CHARS, MAX_REFRESH_INTERVAL_MS,
    MIN_REFRESH_INTERVAL_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Products,
    Keywords,
}

impl EntryKind {
    pub const ALL: [EntryKind; 2] = [EntryKind::Products, EntryKind::Keywords];

    /// Key of the local snapshot holding this list.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Products => "manager.products",
            Self::Keywords => "manager.keywords",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Products => "product",
            Self::Keywords => "keyword",
        }
    }

    pub fn max_entry_chars(self) -> usize {
        match self {
            Self::Products => MAX_PRODUCT_CHARS,
            Self::Keywords => MAX_KEYWORD_CHARS,
        }
    }

    /// Form in which an entry is stored. Keywords are kept lowercase,
    /// products keep the casing the user typed.
    pub fn normalize(self, trimmed: &str) -> String {
        match self {
            Self::Products => trimmed.to_string(),
            Self::Keywords => trimmed.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshState {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl RefreshState {
    pub fn disabled(interval_ms: u64) -> Self {
        Self {
            enabled: false,
            interval_ms,
        }
    }

    /// Pulls the interval back into range; an enabled state never carries an
    /// out-of-bounds interval.
    pub fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            interval_ms: self
                .interval_ms
                .clamp(MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS),
        }
    }
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::disabled(DEFAULT_REFRESH_INTERVAL_MS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Minimized,
    Closed,
}

impl WindowState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Maximized => "maximized",
            Self::Minimized => "minimized",
            Self::Closed => "closed",
        }
    }
}
