//! # Bookmark Agent
//!
//! A conversational bookmarking assistant. A language model decides, turn by
//! turn, whether to fetch and summarize a page, classify it into a category
//! hierarchy, store it, or query, move and delete existing bookmarks.
//!
//! ## Architecture
//!
//! ```text
//! Client → ChatServer (JSON-RPC, stdio) → ToolOrchestrator → Responses API (HTTP)
//!                                               ↓
//!                       ToolDispatcher → BookmarkRepository → SqliteVectorStore
//!                             ↓
//!               HttpFetcher, PageSummarizer, CategoryClassifier
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bookmark_agent::{Config, AppState, ChatServer};
//! use bookmark_agent::fetcher::HttpFetcher;
//! use bookmark_agent::llm::OpenAiClient;
//! use bookmark_agent::repository::BookmarkRepository;
//! use bookmark_agent::storage::{embedder_from_config, SqliteVectorStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let embedder = embedder_from_config(&config.embedding, &config.openai, &config.request)?;
//!     let store = SqliteVectorStore::new(&config.database, embedder).await?;
//!     let repository = BookmarkRepository::new(Arc::new(store));
//!     let client = OpenAiClient::new(&config.openai, config.request.clone())?;
//!     let fetcher = HttpFetcher::new(&config.fetch)?;
//!     let state = AppState::new(repository, Arc::new(client), Arc::new(fetcher), 25);
//!     ChatServer::new(Arc::new(state)).run().await?;
//!     Ok(())
//! }
//! ```

/// Bookmark record, serialized form and category hierarchy.
pub mod bookmark;
/// Category assignment via structured completions.
pub mod classifier;
/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Web page fetching and text extraction.
pub mod fetcher;
/// Completion endpoint client and wire types.
pub mod llm;
/// Tool declarations, dispatch and the chat turn loop.
pub mod orchestrator;
/// Prompt text sent to the completion endpoint.
pub mod prompts;
/// Bookmark persistence over the vector store.
pub mod repository;
/// JSON-RPC server and shared state.
pub mod server;
/// Vector store contract, SQLite implementation and embedders.
pub mod storage;
/// Page summaries for new bookmarks.
pub mod summarizer;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, ChatServer, SharedState};
