//! Integration tests for the SQLite vector store

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use bookmark_agent::config::DatabaseConfig;
use bookmark_agent::storage::{
    Filter, HashingEmbedder, Metadata, SqliteVectorStore, VectorStore,
};

fn metadata(url: &str, category: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("url".into(), json!(url));
    metadata.insert("category".into(), json!(category));
    metadata
}

async fn create_store() -> SqliteVectorStore {
    SqliteVectorStore::new_in_memory(Arc::new(HashingEmbedder::new(128)))
        .await
        .expect("Failed to create in-memory store")
}

#[tokio::test]
async fn test_upsert_replaces_by_id() {
    let store = create_store().await;

    store
        .upsert("a", "first version", &metadata("https://a.example", "X"))
        .await
        .unwrap();
    store
        .upsert("a", "second version", &metadata("https://a.example", "Y"))
        .await
        .unwrap();

    let docs = store.get(&Filter::All).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document, "second version");
    assert_eq!(docs[0].metadata["category"], "Y");
}

#[tokio::test]
async fn test_equals_and_prefix_filters() {
    let store = create_store().await;
    for (id, category) in [("1", "Tech"), ("2", "Tech/AI"), ("3", "Techno"), ("4", "News/Tech")] {
        store
            .upsert(id, id, &metadata(&format!("https://{id}.example"), category))
            .await
            .unwrap();
    }

    let exact = store.get(&Filter::equals("category", "Tech")).await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, "1");

    let mut prefixed: Vec<String> = store
        .get(&Filter::prefix("category", "Tech"))
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    prefixed.sort();
    assert_eq!(prefixed, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_delete_ignores_unknown_ids() {
    let store = create_store().await;
    store
        .upsert("keep", "doc", &metadata("https://keep.example", ""))
        .await
        .unwrap();
    store
        .upsert("drop", "doc", &metadata("https://drop.example", ""))
        .await
        .unwrap();

    store
        .delete(&["drop".to_string(), "missing".to_string()])
        .await
        .unwrap();

    let ids: Vec<String> = store
        .get(&Filter::All)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["keep"]);
}

#[tokio::test]
async fn test_query_ranks_by_similarity() {
    let store = create_store().await;
    store
        .upsert("rust", "Rust programming language book", &metadata("https://rust.example", ""))
        .await
        .unwrap();
    store
        .upsert("bread", "Banana bread baking recipe", &metadata("https://bread.example", ""))
        .await
        .unwrap();

    let matches = store.query("rust programming", 1).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].document.id, "rust");

    let all = store.query("banana recipe", 10).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].document.id, "bread");
    assert!(all[0].similarity >= all[1].similarity);

    assert!(store.query("anything", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("nested").join("bookmarks.db"),
        max_connections: 2,
        collection: "first".to_string(),
    };
    let embedder = Arc::new(HashingEmbedder::new(32));

    let first = SqliteVectorStore::new(&config, embedder.clone()).await.unwrap();
    first
        .upsert("a", "doc", &metadata("https://a.example", ""))
        .await
        .unwrap();

    let second = SqliteVectorStore::new(&config, embedder)
        .await
        .unwrap()
        .with_collection("second");
    assert!(second.get(&Filter::All).await.unwrap().is_empty());
    assert_eq!(first.get(&Filter::All).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_on_disk_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("bookmarks.db"),
        max_connections: 1,
        collection: "bookmarks".to_string(),
    };

    {
        let store = SqliteVectorStore::new(&config, Arc::new(HashingEmbedder::new(32)))
            .await
            .unwrap();
        store
            .upsert("a", "persisted", &metadata("https://a.example", "Tech"))
            .await
            .unwrap();
        store.pool().close().await;
    }

    let store = SqliteVectorStore::new(&config, Arc::new(HashingEmbedder::new(32)))
        .await
        .unwrap();
    let docs = store.get(&Filter::All).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document, "persisted");
}

#[tokio::test]
async fn test_invalid_filter_field_is_rejected() {
    let store = create_store().await;
    assert!(store
        .get(&Filter::equals("bad field", "x"))
        .await
        .is_err());
}
