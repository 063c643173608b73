use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{cosine_similarity, Embedder, Filter, Metadata, QueryMatch, StoredDocument, VectorStore};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed vector store.
///
/// Documents live in one table keyed by `(collection, id)`; embeddings are
/// stored as little-endian `f32` blobs and ranked in process.
#[derive(Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorStore {
    /// Open (or create) the database file described by `config`
    pub async fn new(config: &DatabaseConfig, embedder: Arc<dyn Embedder>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self {
            pool,
            collection: config.collection.clone(),
            embedder,
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create a private in-memory store (tests and dry runs)
    pub async fn new_in_memory(embedder: Arc<dyn Embedder>) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // Every connection to :memory: is its own database, so keep exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let store = Self {
            pool,
            collection: "bookmarks".to_string(),
            embedder,
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Use a different collection in the same database
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Name of the collection this store reads and writes
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, id: &str, document: &str, metadata: &Metadata) -> StorageResult<()> {
        let embedding = self.embedder.embed(document).await?;
        let metadata = serde_json::to_string(metadata).map_err(|e| StorageError::Query {
            message: format!("Failed to serialize metadata: {}", e),
        })?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, document, metadata, embedding, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET
                document = excluded.document,
                metadata = excluded.metadata,
                embedding = excluded.embedding,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.collection)
        .bind(id)
        .bind(document)
        .bind(&metadata)
        .bind(encode_embedding(&embedding))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(collection = %self.collection, id = %id, "Document upserted");
        Ok(())
    }

    async fn get(&self, filter: &Filter) -> StorageResult<Vec<StoredDocument>> {
        let rows: Vec<DocumentRow> = match filter {
            Filter::All => {
                sqlx::query_as(
                    r#"
                    SELECT id, document, metadata, embedding
                    FROM documents
                    WHERE collection = ?
                    ORDER BY created_at ASC, id ASC
                    "#,
                )
                .bind(&self.collection)
                .fetch_all(&self.pool)
                .await?
            }
            Filter::Equals { field, value } => {
                sqlx::query_as(
                    r#"
                    SELECT id, document, metadata, embedding
                    FROM documents
                    WHERE collection = ? AND json_extract(metadata, ?) = ?
                    ORDER BY created_at ASC, id ASC
                    "#,
                )
                .bind(&self.collection)
                .bind(json_path(field)?)
                .bind(value)
                .fetch_all(&self.pool)
                .await?
            }
            Filter::Prefix { field, prefix } => {
                sqlx::query_as(
                    r#"
                    SELECT id, document, metadata, embedding
                    FROM documents
                    WHERE collection = ?
                      AND substr(json_extract(metadata, ?), 1, length(?)) = ?
                    ORDER BY created_at ASC, id ASC
                    "#,
                )
                .bind(&self.collection)
                .bind(json_path(field)?)
                .bind(prefix)
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|row| row.into_document()).collect())
    }

    async fn delete(&self, ids: &[String]) -> StorageResult<()> {
        for id in ids {
            sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(&self.collection)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        debug!(collection = %self.collection, count = ids.len(), "Documents deleted");
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> StorageResult<Vec<QueryMatch>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, document, metadata, embedding
            FROM documents
            WHERE collection = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut matches: Vec<QueryMatch> = rows
            .into_iter()
            .map(|row| {
                let embedding = decode_embedding(&row.embedding);
                if embedding.len() != query_embedding.len() {
                    warn!(
                        id = %row.id,
                        stored = embedding.len(),
                        query = query_embedding.len(),
                        "Embedding dimension mismatch"
                    );
                }
                QueryMatch {
                    similarity: cosine_similarity(&query_embedding, &embedding),
                    document: row.into_document(),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }
}

/// JSON path for a top-level metadata key
fn json_path(field: &str) -> StorageResult<String> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StorageError::Query {
            message: format!("Invalid metadata field name: {:?}", field),
        });
    }
    Ok(format!("$.{}", field))
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    document: String,
    metadata: String,
    embedding: Vec<u8>,
}

impl DocumentRow {
    fn into_document(self) -> StoredDocument {
        let metadata = serde_json::from_str(&self.metadata).unwrap_or_else(|e| {
            warn!(id = %self.id, error = %e, "Unreadable document metadata");
            Metadata::new()
        });

        StoredDocument {
            id: self.id,
            document: self.document,
            metadata,
        }
    }
}
