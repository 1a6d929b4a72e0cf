//! Worker-to-UI events and error modeling for the manager controller.

use bridge::BridgeError;
use shared::{
    domain::{EntryKind, LogLevel},
    protocol::{BridgeEvent, UnlockOutcome},
};

use crate::backend_bridge::commands::WindowAction;

#[derive(Debug)]
pub enum UiEvent {
    /// Host is up; `requires_unlock` decides whether the lock screen shows.
    HostReady { requires_unlock: bool },
    Info(String),
    Pushed(BridgeEvent),
    /// A window control the host never received.
    ApplyWindowLocally(WindowAction),
    ListSaved { kind: EntryKind, count: usize },
    UnlockResult(UnlockOutcome),
    Version(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Transport,
    Remote,
    Auth,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    SaveList,
    Refresh,
    Unlock,
    Window,
    Startup,
    General,
}

impl UiErrorContext {
    pub fn label(self) -> &'static str {
        match self {
            Self::SaveList => "Save",
            Self::Refresh => "Auto-refresh",
            Self::Unlock => "Unlock",
            Self::Window => "Window",
            Self::Startup => "Startup",
            Self::General => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let category = classify(&message);
        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_bridge(context: UiErrorContext, err: &BridgeError) -> Self {
        let message = err.to_string();
        let category = match err {
            BridgeError::Validation { .. } => UiErrorCategory::Validation,
            BridgeError::Unavailable { .. } => UiErrorCategory::Transport,
            BridgeError::Remote { message, .. } => match classify(message) {
                UiErrorCategory::Auth => UiErrorCategory::Auth,
                _ => UiErrorCategory::Remote,
            },
            BridgeError::MalformedReply { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    /// Bad input is a warning; anything that failed after crossing is an
    /// error.
    pub fn log_level(&self) -> LogLevel {
        match self.category {
            UiErrorCategory::Validation => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn classify(message: &str) -> UiErrorCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("invalid credential")
        || lower.contains("locked")
    {
        UiErrorCategory::Auth
    } else if lower.contains("invalid")
        || lower.contains("out of range")
        || lower.contains("missing")
        || lower.contains("malformed")
        || lower.contains("at most")
    {
        UiErrorCategory::Validation
    } else if lower.contains("timeout")
        || lower.contains("connection")
        || lower.contains("unavailable")
        || lower.contains("disconnected")
        || lower.contains("could not reach")
    {
        UiErrorCategory::Transport
    } else {
        UiErrorCategory::Unknown
    }
}

#[cfg(test)]
#[path = "../tests/events_tests.rs"]
mod tests;
