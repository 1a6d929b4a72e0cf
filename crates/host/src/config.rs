use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const SETTINGS_FILE_NAME: &str = "manager.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    pub database_url: String,
    pub unlock_user: Option<String>,
    pub unlock_pass: Option<String>,
    pub legacy_event_aliases: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/manager-host.db".into(),
            unlock_user: None,
            unlock_pass: None,
            legacy_event_aliases: false,
        }
    }
}

impl HostSettings {
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            database_url: format!(
                "sqlite://{}",
                data_dir
                    .join("manager-host.db")
                    .to_string_lossy()
                    .replace('\\', "/")
            ),
            ..Self::default()
        }
    }

    /// Both halves of the lock credential pair must be configured for the
    /// lock screen to be enforced.
    pub fn lock_credentials(&self) -> Option<(&str, &str)> {
        match (self.unlock_user.as_deref(), self.unlock_pass.as_deref()) {
            (Some(user), Some(pass)) if !user.trim().is_empty() && !pass.is_empty() => {
                Some((user.trim(), pass))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    database_url: Option<String>,
    unlock_user: Option<String>,
    unlock_pass: Option<String>,
    legacy_event_aliases: Option<bool>,
}

/// Defaults, then `manager.toml` in `data_dir` (if present), then `MANAGER_*`
/// environment variables.
pub fn load_settings(data_dir: &Path) -> HostSettings {
    load_settings_with(data_dir, |name| std::env::var(name).ok())
}

pub fn load_settings_with(
    data_dir: &Path,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> HostSettings {
    let mut settings = HostSettings::for_data_dir(data_dir);

    let settings_path = data_dir.join(SETTINGS_FILE_NAME);
    if let Ok(raw) = fs::read_to_string(&settings_path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.database_url {
                    settings.database_url = v;
                }
                if let Some(v) = file_cfg.unlock_user {
                    settings.unlock_user = Some(v);
                }
                if let Some(v) = file_cfg.unlock_pass {
                    settings.unlock_pass = Some(v);
                }
                if let Some(v) = file_cfg.legacy_event_aliases {
                    settings.legacy_event_aliases = v;
                }
            }
            Err(err) => tracing::warn!(
                "ignoring unreadable settings file '{}': {err}",
                settings_path.display()
            ),
        }
    }

    if let Some(v) = env_lookup("MANAGER_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env_lookup("MANAGER_UNLOCK_USER") {
        settings.unlock_user = Some(v);
    }
    if let Some(v) = env_lookup("MANAGER_UNLOCK_PASS") {
        settings.unlock_pass = Some(v);
    }
    if let Some(v) = env_lookup("MANAGER_LEGACY_EVENT_ALIASES") {
        settings.legacy_event_aliases = matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return HostSettings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
