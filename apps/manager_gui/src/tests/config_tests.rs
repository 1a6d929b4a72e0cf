use super::*;

#[test]
fn parses_flags() {
    let startup = StartupConfig::try_parse_from([
        "manager",
        "--data-dir",
        "/tmp/manager",
        "--max-logs",
        "20",
        "--legacy-event-aliases",
    ])
    .expect("valid flags");

    assert_eq!(startup.data_dir, Some(PathBuf::from("/tmp/manager")));
    assert_eq!(startup.max_logs, 20);
    assert!(startup.legacy_event_aliases);
}

#[test]
fn flags_default_to_the_standard_log_size() {
    let startup = StartupConfig::try_parse_from(["manager"]).expect("no flags");

    assert_eq!(startup.max_logs, DEFAULT_MAX_LOGS);
    assert!(startup.data_dir.is_none());
    assert!(!startup.legacy_event_aliases);
}

#[test]
fn explicit_data_dir_holds_every_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let startup = StartupConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..StartupConfig::default()
    };

    let paths = AppPaths::from_startup(&startup);
    assert_eq!(paths.data_root, dir.path());
    assert_eq!(paths.snapshot_path, dir.path().join("snapshots.json"));

    let settings = paths.host_settings(&startup);
    assert!(settings.database_url.contains("manager-host.db"));
}

#[test]
fn legacy_alias_flag_overrides_host_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let startup = StartupConfig {
        data_dir: Some(dir.path().to_path_buf()),
        legacy_event_aliases: true,
        ..StartupConfig::default()
    };

    let settings = AppPaths::from_startup(&startup).host_settings(&startup);
    assert!(settings.legacy_event_aliases);
}
