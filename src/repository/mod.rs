//! Bookmark persistence on top of a [`VectorStore`].
//!
//! The repository owns the mapping between [`Bookmark`] records and stored
//! documents: URL identity, metadata layout, and category queries.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::bookmark::{all_category_paths, Bookmark, CategoryTree};
use crate::error::StorageResult;
use crate::storage::{Filter, Metadata, StoredDocument, VectorStore};

const URL_FIELD: &str = "url";
const TITLE_FIELD: &str = "title";
const CATEGORY_FIELD: &str = "category";

/// Store key for a bookmark URL; stable across restarts.
pub fn bookmark_id(url: &str) -> String {
    format!("bookmark_{}", Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()))
}

/// Repository of bookmarks keyed by URL.
#[derive(Clone)]
pub struct BookmarkRepository {
    store: Arc<dyn VectorStore>,
}

impl BookmarkRepository {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Insert or replace the bookmark with this URL.
    ///
    /// The record is written in place under [`bookmark_id`]; any other entry
    /// carrying the same URL is removed afterwards, so at most one record
    /// per URL exists. A failed write leaves the previous record untouched.
    pub async fn upsert(&self, bookmark: &Bookmark) -> StorageResult<()> {
        let id = bookmark_id(&bookmark.url);

        let mut metadata = Metadata::new();
        metadata.insert(URL_FIELD.into(), bookmark.url.clone().into());
        metadata.insert(TITLE_FIELD.into(), bookmark.title.clone().into());
        metadata.insert(CATEGORY_FIELD.into(), bookmark.category.clone().into());

        self.store
            .upsert(&id, &bookmark.to_document(), &metadata)
            .await?;

        let stray: Vec<String> = self
            .store
            .get(&Filter::equals(URL_FIELD, &bookmark.url))
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .filter(|doc_id| *doc_id != id)
            .collect();
        if !stray.is_empty() {
            self.store.delete(&stray).await?;
        }

        debug!(url = %bookmark.url, category = %bookmark.category, removed = stray.len(), "Bookmark stored");
        Ok(())
    }

    pub async fn find_by_url(&self, url: &str) -> StorageResult<Option<Bookmark>> {
        let documents = self.store.get(&Filter::equals(URL_FIELD, url)).await?;
        Ok(parse_documents(documents).into_iter().next())
    }

    /// Remove the bookmark with this URL; no-op when absent.
    pub async fn delete_by_url(&self, url: &str) -> StorageResult<()> {
        let ids: Vec<String> = self
            .store
            .get(&Filter::equals(URL_FIELD, url))
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        self.store.delete(&ids).await
    }

    /// Bookmarks whose category equals `path` exactly.
    pub async fn find_by_category(&self, path: &str) -> StorageResult<Vec<Bookmark>> {
        let documents = self.store.get(&Filter::equals(CATEGORY_FIELD, path)).await?;
        Ok(parse_documents(documents))
    }

    /// Bookmarks whose category starts with `prefix` as raw text.
    ///
    /// Not segment aware: `"Tech"` also matches `"Techno"`.
    pub async fn find_by_category_prefix(&self, prefix: &str) -> StorageResult<Vec<Bookmark>> {
        let documents = self
            .store
            .get(&Filter::prefix(CATEGORY_FIELD, prefix))
            .await?;
        Ok(parse_documents(documents))
    }

    pub async fn all(&self) -> StorageResult<Vec<Bookmark>> {
        Ok(parse_documents(self.store.get(&Filter::All).await?))
    }

    /// Similarity search over stored documents, best match first.
    pub async fn search(&self, query: &str, max_results: usize) -> StorageResult<Vec<Bookmark>> {
        let matches = self.store.query(query, max_results).await?;
        Ok(parse_documents(matches.into_iter().map(|m| m.document)))
    }

    pub async fn category_tree(&self) -> StorageResult<CategoryTree> {
        let bookmarks = self.all().await?;
        Ok(CategoryTree::from_paths(
            bookmarks.iter().map(|b| b.category.as_str()),
        ))
    }

    /// Every category path and all of their prefixes, sorted.
    pub async fn all_category_paths(&self) -> StorageResult<Vec<String>> {
        let bookmarks = self.all().await?;
        Ok(all_category_paths(bookmarks.iter().map(|b| b.category.as_str())))
    }
}

fn parse_documents(documents: impl IntoIterator<Item = StoredDocument>) -> Vec<Bookmark> {
    documents
        .into_iter()
        .filter_map(|doc| match Bookmark::from_document(&doc.document) {
            Ok(bookmark) => Some(bookmark),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "Skipping unreadable bookmark document");
                None
            }
        })
        .collect()
}
