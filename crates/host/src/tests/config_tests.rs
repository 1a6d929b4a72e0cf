use super::{load_settings_with, normalize_database_url, prepare_database_url, HostSettings};

use std::{collections::HashMap, fs};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn empty_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        HostSettings::default().database_url
    );
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[test]
fn defaults_place_database_in_data_dir() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_with(temp_root.path(), no_env);

    assert!(settings.database_url.starts_with("sqlite://"));
    assert!(settings.database_url.ends_with("manager-host.db"));
    assert!(settings.lock_credentials().is_none());
    assert!(!settings.legacy_event_aliases);
}

#[test]
fn file_settings_are_overridden_by_environment() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp_root.path().join("manager.toml"),
        r#"
unlock_user = "operator"
unlock_pass = "from-file"
legacy_event_aliases = true
"#,
    )
    .expect("write settings");

    let env: HashMap<&str, &str> = HashMap::from([
        ("MANAGER_UNLOCK_PASS", "from-env"),
        ("MANAGER_DATABASE_URL", "sqlite::memory:"),
    ]);
    let settings = load_settings_with(temp_root.path(), |name| {
        env.get(name).map(|value| value.to_string())
    });

    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.lock_credentials(), Some(("operator", "from-env")));
    assert!(settings.legacy_event_aliases);
}

#[test]
fn unreadable_settings_file_is_ignored() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    fs::write(temp_root.path().join("manager.toml"), "not = [valid").expect("write");

    let settings = load_settings_with(temp_root.path(), no_env);
    assert_eq!(settings, HostSettings::for_data_dir(temp_root.path()));
}

#[test]
fn lock_requires_both_halves() {
    let settings = HostSettings {
        unlock_user: Some("operator".into()),
        ..HostSettings::default()
    };
    assert!(settings.lock_credentials().is_none());
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("host.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
