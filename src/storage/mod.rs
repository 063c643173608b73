//! Vector store layer for bookmark documents.
//!
//! This module provides the [`VectorStore`] contract the repository depends
//! on, a SQLite-backed implementation, and the embedders used to rank
//! documents for similarity search.

mod embedding;
mod sqlite;

pub use embedding::*;
pub use sqlite::SqliteVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// Flat metadata stored next to each document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A document as stored in the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store key.
    pub id: String,
    /// Embedded document text.
    pub document: String,
    /// Metadata used for filtering.
    pub metadata: Metadata,
}

/// A document returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// The matched document.
    pub document: StoredDocument,
    /// Cosine similarity to the query (higher is closer).
    pub similarity: f32,
}

/// Metadata filter for [`VectorStore::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every document in the collection.
    All,
    /// Documents whose metadata `field` equals `value` exactly.
    Equals { field: String, value: String },
    /// Documents whose metadata `field` starts with `prefix` (raw text, not
    /// path-segment aware).
    Prefix { field: String, prefix: String },
}

impl Filter {
    /// Exact-match filter
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Textual prefix filter
    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }
}

/// Contract for an embedding-backed document store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the document stored under `id`.
    async fn upsert(&self, id: &str, document: &str, metadata: &Metadata) -> StorageResult<()>;
    /// Fetch documents matching a metadata filter, oldest first.
    async fn get(&self, filter: &Filter) -> StorageResult<Vec<StoredDocument>>;
    /// Delete documents by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> StorageResult<()>;
    /// Nearest-neighbour text search, best match first.
    async fn query(&self, text: &str, limit: usize) -> StorageResult<Vec<QueryMatch>>;
}

/// Cosine similarity of two vectors; 0.0 when either has zero length.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for i in 0..len {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
