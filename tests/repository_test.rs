//! Integration tests for the bookmark repository

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bookmark_agent::bookmark::{Bookmark, CategoryTree};
use bookmark_agent::error::{StorageError, StorageResult};
use bookmark_agent::repository::{bookmark_id, BookmarkRepository};
use bookmark_agent::storage::{Embedder, Filter, HashingEmbedder, SqliteVectorStore, VectorStore};

/// Embedder that starts failing once `fail` is set
struct SwitchableEmbedder {
    inner: HashingEmbedder,
    fail: AtomicBool,
}

#[async_trait]
impl Embedder for SwitchableEmbedder {
    async fn embed(&self, text: &str) -> StorageResult<Vec<f32>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Embedding {
                message: "connection reset".to_string(),
            });
        }
        self.inner.embed(text).await
    }
}

async fn create_repository() -> (BookmarkRepository, Arc<SqliteVectorStore>) {
    let store = Arc::new(
        SqliteVectorStore::new_in_memory(Arc::new(HashingEmbedder::new(128)))
            .await
            .expect("Failed to create in-memory store"),
    );
    (BookmarkRepository::new(store.clone()), store)
}

fn bookmark(url: &str, title: &str, category: &str) -> Bookmark {
    Bookmark::new(url, title, format!("About {title}"))
        .unwrap()
        .with_category(category)
}

#[tokio::test]
async fn test_upsert_twice_keeps_one_record_and_second_wins() {
    let (repository, store) = create_repository().await;

    repository
        .upsert(&bookmark("https://example.com", "First", "A"))
        .await
        .unwrap();
    repository
        .upsert(&bookmark("https://example.com", "Second", "B"))
        .await
        .unwrap();

    let all = repository.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Second");
    assert_eq!(all[0].category, "B");

    let docs = store.get(&Filter::All).await.unwrap();
    assert_eq!(docs[0].id, bookmark_id("https://example.com"));
    assert_eq!(docs[0].metadata["url"], "https://example.com");
    assert_eq!(docs[0].metadata["title"], "Second");
    assert_eq!(docs[0].metadata["category"], "B");
}

#[tokio::test]
async fn test_upsert_removes_stray_entries_for_the_same_url() {
    let (repository, store) = create_repository().await;

    let stray = bookmark("https://example.com", "Stray", "Old");
    let mut metadata = bookmark_agent::storage::Metadata::new();
    metadata.insert("url".into(), "https://example.com".into());
    metadata.insert("category".into(), "Old".into());
    store
        .upsert("legacy-id", &stray.to_document(), &metadata)
        .await
        .unwrap();

    repository
        .upsert(&bookmark("https://example.com", "Fresh", "New"))
        .await
        .unwrap();

    let docs = store.get(&Filter::All).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, bookmark_id("https://example.com"));
}

#[tokio::test]
async fn test_failed_replace_keeps_previous_record() {
    let embedder = Arc::new(SwitchableEmbedder {
        inner: HashingEmbedder::new(64),
        fail: AtomicBool::new(false),
    });
    let store = SqliteVectorStore::new_in_memory(embedder.clone())
        .await
        .expect("Failed to create in-memory store");
    let repository = BookmarkRepository::new(Arc::new(store));

    let original = bookmark("https://example.com", "Example", "Old");
    repository.upsert(&original).await.unwrap();

    embedder.fail.store(true, Ordering::SeqCst);
    let moved = original.clone().with_category("New");
    assert!(matches!(
        repository.upsert(&moved).await,
        Err(StorageError::Embedding { .. })
    ));

    assert_eq!(
        repository.find_by_url("https://example.com").await.unwrap(),
        Some(original)
    );
}

#[tokio::test]
async fn test_find_and_delete_by_url() {
    let (repository, _) = create_repository().await;
    let saved = bookmark("https://example.com", "Example", "General");
    repository.upsert(&saved).await.unwrap();

    assert_eq!(
        repository.find_by_url("https://example.com").await.unwrap(),
        Some(saved)
    );
    assert_eq!(
        repository.find_by_url("https://example.org").await.unwrap(),
        None
    );

    repository.delete_by_url("https://example.org").await.unwrap();
    repository.delete_by_url("https://example.com").await.unwrap();
    assert!(repository.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_category_prefix_is_textual() {
    let (repository, _) = create_repository().await;
    for (url, category) in [
        ("https://a.example", "Tech"),
        ("https://b.example", "Tech/AI"),
        ("https://c.example", "Techno"),
        ("https://d.example", "News"),
    ] {
        repository
            .upsert(&bookmark(url, url, category))
            .await
            .unwrap();
    }

    let mut categories: Vec<String> = repository
        .find_by_category_prefix("Tech")
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.category)
        .collect();
    categories.sort();
    assert_eq!(categories, vec!["Tech", "Tech/AI", "Techno"]);

    let exact = repository.find_by_category("Tech").await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].url, "https://a.example");
}

#[tokio::test]
async fn test_category_paths_and_tree() {
    let (repository, _) = create_repository().await;
    repository
        .upsert(&bookmark("https://a.example", "A", "A/B/C"))
        .await
        .unwrap();
    repository
        .upsert(&bookmark("https://b.example", "B", ""))
        .await
        .unwrap();

    assert_eq!(
        repository.all_category_paths().await.unwrap(),
        vec!["A", "A/B", "A/B/C"]
    );

    let tree = repository.category_tree().await.unwrap();
    assert_eq!(tree, CategoryTree::from_paths(["A/B/C"]));
    assert!(tree.contains("A/B"));
}

#[tokio::test]
async fn test_search_returns_best_match_first() {
    let (repository, _) = create_repository().await;
    repository
        .upsert(&bookmark("https://rust.example", "Rust programming", "Tech"))
        .await
        .unwrap();
    repository
        .upsert(&bookmark("https://bread.example", "Banana bread", "Food"))
        .await
        .unwrap();

    let results = repository.search("banana bread", 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://bread.example");

    assert_eq!(repository.search("banana bread", 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreadable_documents_are_skipped() {
    let (repository, store) = create_repository().await;
    store
        .upsert("junk", "not a bookmark", &Default::default())
        .await
        .unwrap();
    repository
        .upsert(&bookmark("https://example.com", "Example", "General"))
        .await
        .unwrap();

    let all = repository.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Example");
}
