use std::path::PathBuf;

use clap::Parser;
use host::HostSettings;
use shared::limits::DEFAULT_MAX_LOGS;

#[derive(Debug, Clone, Parser)]
#[command(name = "manager", version, about = "Products and keywords manager window")]
pub struct StartupConfig {
    /// Directory holding snapshots, the host database and `manager.toml`.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Activity log entries kept in memory.
    #[arg(long, default_value_t = DEFAULT_MAX_LOGS)]
    pub max_logs: usize,

    /// Also publish log and refresh events on their legacy channel names.
    #[arg(long)]
    pub legacy_event_aliases: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_logs: DEFAULT_MAX_LOGS,
            legacy_event_aliases: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub snapshot_path: PathBuf,
}

impl AppPaths {
    /// Explicit `--data-dir`, then the per-user local data dir, then `./data`.
    pub fn from_startup(startup: &StartupConfig) -> Self {
        let root = match &startup.data_dir {
            Some(dir) => dir.clone(),
            None => match dirs::data_local_dir() {
                Some(base) => base.join("browser_manager"),
                None => {
                    tracing::warn!("no local data directory for this user; using ./data");
                    PathBuf::from("data")
                }
            },
        };

        Self {
            snapshot_path: root.join("snapshots.json"),
            data_root: root,
        }
    }

    pub fn host_settings(&self, startup: &StartupConfig) -> HostSettings {
        let mut settings = host::load_settings(&self.data_root);
        if startup.legacy_event_aliases {
            settings.legacy_event_aliases = true;
        }
        settings
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
