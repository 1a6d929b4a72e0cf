use super::*;

fn entries(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn loads_empty_list_before_first_save() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let products = storage
        .load_entries(EntryKind::Products)
        .await
        .expect("load");
    assert!(products.is_empty());
}

#[tokio::test]
async fn replace_keeps_order_and_overwrites_previous_list() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    storage
        .replace_entries(EntryKind::Products, &entries(&["Zeta", "alpha", "Mid"]))
        .await
        .expect("first save");
    assert_eq!(
        storage
            .load_entries(EntryKind::Products)
            .await
            .expect("load"),
        entries(&["Zeta", "alpha", "Mid"])
    );

    storage
        .replace_entries(EntryKind::Products, &entries(&["only"]))
        .await
        .expect("second save");
    assert_eq!(
        storage
            .load_entries(EntryKind::Products)
            .await
            .expect("load"),
        entries(&["only"])
    );
}

#[tokio::test]
async fn lists_are_keyed_independently() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .replace_entries(EntryKind::Products, &entries(&["widget"]))
        .await
        .expect("products");
    storage
        .replace_entries(EntryKind::Keywords, &entries(&["sale", "promo"]))
        .await
        .expect("keywords");

    storage
        .replace_entries(EntryKind::Products, &[])
        .await
        .expect("clear products");

    assert!(storage
        .load_entries(EntryKind::Products)
        .await
        .expect("products")
        .is_empty());
    assert_eq!(
        storage
            .load_entries(EntryKind::Keywords)
            .await
            .expect("keywords"),
        entries(&["sale", "promo"])
    );
}

#[tokio::test]
async fn refresh_interval_upserts_single_row() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage
        .load_refresh_settings()
        .await
        .expect("load")
        .is_none());

    storage.save_refresh_interval(5_000).await.expect("save");
    storage.save_refresh_interval(60_000).await.expect("save");

    let settings = storage
        .load_refresh_settings()
        .await
        .expect("load")
        .expect("row present");
    assert_eq!(settings.interval_ms, 60_000);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("host.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn in_memory_url_has_no_parent_directory() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/host.db?mode=rwc"),
        Some(PathBuf::from("./data/host.db"))
    );
}
