use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroize;

use crate::{
    domain::{EntryKind, LogEntry, RefreshState, WindowState},
    error::HostError,
};

/// Physical channel names for pushed events. Log and refresh-state events
/// have a legacy alias that older hosts still publish on.
pub mod channels {
    pub const WINDOW_STATE: &str = "window:state-changed";
    pub const LOG_APPEND: &str = "log:append";
    pub const LOG_APPEND_LEGACY: &str = "log-message";
    pub const REFRESH_STATE: &str = "refresh:state";
    pub const REFRESH_STATE_LEGACY: &str = "auto-refresh-state";
}

/// Unlock credentials as they cross the bridge. Never persisted; the password
/// buffer is wiped when the value is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.pass.zeroize();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BridgeRequest {
    MinimizeWindow,
    MaximizeWindow,
    CloseWindow,
    /// Window state observed by the shell, for changes made outside the
    /// window controls (taskbar restore, OS shortcuts).
    ReportWindowState {
        state: WindowState,
    },
    SaveList {
        kind: EntryKind,
        entries: Vec<String>,
    },
    StartRefresh {
        interval_ms: u64,
    },
    StopRefresh,
    ReportConnectivity {
        online: bool,
    },
    TryUnlock {
        credentials: Credentials,
    },
    GetVersion,
}

impl BridgeRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::MinimizeWindow => "window.minimize",
            Self::MaximizeWindow => "window.maximize",
            Self::CloseWindow => "window.close",
            Self::ReportWindowState { .. } => "window.report_state",
            Self::SaveList {
                kind: EntryKind::Products,
                ..
            } => "products.save",
            Self::SaveList {
                kind: EntryKind::Keywords,
                ..
            } => "keywords.save",
            Self::StartRefresh { .. } => "refresh.start",
            Self::StopRefresh => "refresh.stop",
            Self::ReportConnectivity { .. } => "connectivity.report",
            Self::TryUnlock { .. } => "lock.try_unlock",
            Self::GetVersion => "app.version",
        }
    }
}

/// Reply envelope for every request/response call: `{success, error?, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CallResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn ok_with(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                success: true,
                error: None,
                data: Some(data),
            },
            Err(err) => Self::failure(format!("failed to encode reply: {err}")),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            data: None,
        }
    }
}

impl From<HostError> for CallResult {
    fn from(value: HostError) -> Self {
        Self::failure(value.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockOutcome {
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WindowState,
    Log,
    RefreshState,
}

impl EventKind {
    pub fn channels(self) -> &'static [&'static str] {
        match self {
            Self::WindowState => &[channels::WINDOW_STATE],
            Self::Log => &[channels::LOG_APPEND, channels::LOG_APPEND_LEGACY],
            Self::RefreshState => &[channels::REFRESH_STATE, channels::REFRESH_STATE_LEGACY],
        }
    }

    pub fn primary_channel(self) -> &'static str {
        self.channels()[0]
    }

    pub fn legacy_channel(self) -> Option<&'static str> {
        self.channels().get(1).copied()
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        [Self::WindowState, Self::Log, Self::RefreshState]
            .into_iter()
            .find(|kind| kind.channels().contains(&channel))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BridgeEvent {
    WindowStateChanged(WindowState),
    LogAppended(LogEntry),
    RefreshStateChanged(RefreshState),
}

impl BridgeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WindowStateChanged(_) => EventKind::WindowState,
            Self::LogAppended(_) => EventKind::Log,
            Self::RefreshStateChanged(_) => EventKind::RefreshState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogLevel;

    #[test]
    fn requests_use_adjacent_snake_case_tags() {
        let request = BridgeRequest::StartRefresh { interval_ms: 5_000 };
        let json = serde_json::to_value(&request).expect("encode");
        assert_eq!(
            json,
            serde_json::json!({"type": "start_refresh", "payload": {"interval_ms": 5000}})
        );

        let unit = serde_json::to_value(BridgeRequest::StopRefresh).expect("encode");
        assert_eq!(unit, serde_json::json!({"type": "stop_refresh"}));
    }

    #[test]
    fn refresh_state_uses_camel_case_interval() {
        let json = serde_json::to_value(RefreshState {
            enabled: true,
            interval_ms: 3_000,
        })
        .expect("encode");
        assert_eq!(json, serde_json::json!({"enabled": true, "intervalMs": 3000}));
    }

    #[test]
    fn call_result_omits_absent_fields() {
        let json = serde_json::to_string(&CallResult::ok()).expect("encode");
        assert_eq!(json, r#"{"success":true}"#);

        let failed: CallResult =
            serde_json::from_str(r#"{"success":false,"error":"boom"}"#).expect("decode");
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.data.is_none());
    }

    #[test]
    fn credentials_debug_output_hides_password() {
        let rendered = format!("{:?}", Credentials::new("bob", "hunter2"));
        assert!(rendered.contains("bob"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn aliased_event_kinds_resolve_from_either_channel() {
        assert_eq!(
            EventKind::from_channel(channels::LOG_APPEND_LEGACY),
            Some(EventKind::Log)
        );
        assert_eq!(
            EventKind::from_channel(channels::REFRESH_STATE),
            Some(EventKind::RefreshState)
        );
        assert_eq!(EventKind::WindowState.legacy_channel(), None);
        assert_eq!(EventKind::from_channel("unknown"), None);
    }

    #[test]
    fn event_kind_matches_payload() {
        let event = BridgeEvent::LogAppended(LogEntry::now(LogLevel::Info, "hi"));
        assert_eq!(event.kind(), EventKind::Log);
    }
}
