use super::*;
use serde_json::json;
use shared::records::WaitlistRecord;

#[tokio::test]
async fn appends_and_lists_documents_per_collection() {
    let store = DocumentStore::new("sqlite::memory:").await.expect("db");
    store
        .insert_document(Collection::Waitlist, &json!({ "email": "a@b.co" }))
        .await
        .expect("waitlist insert");
    store
        .insert_document(Collection::Wishlist, &json!({ "email": "a@b.co", "storage": "2TB" }))
        .await
        .expect("wishlist insert");
    store
        .insert_document(Collection::Waitlist, &json!({ "email": "c@d.io" }))
        .await
        .expect("waitlist insert");

    let waitlist = store.documents(Collection::Waitlist).await.expect("list");
    assert_eq!(waitlist.len(), 2);
    assert_eq!(waitlist[0].body["email"], json!("a@b.co"));
    assert_eq!(waitlist[1].body["email"], json!("c@d.io"));
    assert_eq!(store.count(Collection::Wishlist).await.expect("count"), 1);
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = DocumentStore::new("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("landing.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = DocumentStore::new(&database_url).await.expect("db");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn persistence_client_append_returns_document_ref() {
    let store = DocumentStore::new("sqlite::memory:").await.expect("db");
    let record = WaitlistRecord::new("a@b.co", Utc::now());

    let receipt = append_record(&store, Collection::Waitlist, &record)
        .await
        .expect("append");
    let AppendReceipt::Stored(doc) = receipt else {
        panic!("sqlite store should persist the record");
    };
    assert_eq!(doc.collection, Collection::Waitlist);

    let stored = store.documents(Collection::Waitlist).await.expect("list");
    assert_eq!(stored[0].id, doc.id);
    assert_eq!(stored[0].body["email"], json!("a@b.co"));
    assert!(stored[0].body["timestamp"].is_string());
}

#[tokio::test]
async fn disabled_store_skips_without_error() {
    let receipt = DisabledStore
        .append(Collection::Wishlist, json!({ "email": "a@b.co" }))
        .await
        .expect("append");
    assert_eq!(receipt, AppendReceipt::Skipped);
    assert!(!receipt.is_stored());
}

#[tokio::test]
async fn memory_store_keeps_collections_apart() {
    let store = MemoryStore::new();
    store
        .append(Collection::Waitlist, json!({ "email": "a@b.co" }))
        .await
        .expect("append");
    assert_eq!(store.documents(Collection::Waitlist).await.len(), 1);
    assert!(store.documents(Collection::Wishlist).await.is_empty());
    assert_eq!(store.len().await, 1);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/landing.db"),
        "sqlite://./data/landing.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\landing.db"),
        "sqlite://data/landing.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn memory_urls_have_no_parent_directory() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://data/landing.db?mode=rwc"),
        Some(PathBuf::from("data/landing.db"))
    );
}
