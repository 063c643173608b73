//! JSON-RPC front end for the bookmark assistant.
//!
//! This module provides:
//! - A line-delimited JSON-RPC 2.0 server over stdio
//! - Method handlers for chat and bookmark listing
//! - Shared application state with one orchestrator per conversation

mod handlers;
mod rpc;

pub use handlers::*;
pub use rpc::*;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::CategoryClassifier;
use crate::fetcher::PageFetcher;
use crate::llm::CompletionClient;
use crate::orchestrator::{ToolDispatcher, ToolOrchestrator};
use crate::repository::BookmarkRepository;
use crate::summarizer::PageSummarizer;

/// A conversation's orchestrator; the lock admits one turn at a time.
pub type Conversation = Arc<Mutex<ToolOrchestrator>>;

/// Default cap on live conversations.
pub const DEFAULT_MAX_CONVERSATIONS: usize = 100;

struct ConversationEntry {
    conversation: Conversation,
    last_used: Instant,
}

/// Application state shared across handlers.
pub struct AppState {
    /// Bookmark persistence.
    pub repository: BookmarkRepository,
    completion: Arc<dyn CompletionClient>,
    dispatcher: ToolDispatcher,
    history_limit: usize,
    max_conversations: usize,
    conversations: Mutex<HashMap<String, ConversationEntry>>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        repository: BookmarkRepository,
        completion: Arc<dyn CompletionClient>,
        fetcher: Arc<dyn PageFetcher>,
        history_limit: usize,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(
            repository.clone(),
            fetcher,
            PageSummarizer::new(completion.clone()),
            CategoryClassifier::new(completion.clone()),
        );

        Self {
            repository,
            completion,
            dispatcher,
            history_limit,
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Cap the number of live conversations; the least recently used one is
    /// evicted when a new conversation would exceed it.
    pub fn with_max_conversations(mut self, max_conversations: usize) -> Self {
        self.max_conversations = max_conversations.max(1);
        self
    }

    /// A fresh orchestrator wired to this state's collaborators
    pub fn new_orchestrator(&self) -> ToolOrchestrator {
        ToolOrchestrator::new(
            self.completion.clone(),
            self.dispatcher.clone(),
            self.history_limit,
        )
    }

    /// Look up a conversation, creating it when the id is unknown or absent.
    pub async fn conversation(&self, id: Option<&str>) -> (String, Conversation) {
        let mut conversations = self.conversations.lock().await;

        if let Some(id) = id {
            if let Some(entry) = conversations.get_mut(id) {
                entry.last_used = Instant::now();
                return (id.to_string(), entry.conversation.clone());
            }
        }

        while conversations.len() >= self.max_conversations {
            let Some(oldest) = conversations
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            conversations.remove(&oldest);
            debug!(conversation_id = %oldest, "Evicted least recently used conversation");
        }

        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let orchestrator = self.new_orchestrator().with_conversation_id(id.clone());
        let conversation = Arc::new(Mutex::new(orchestrator));
        conversations.insert(
            id.clone(),
            ConversationEntry {
                conversation: conversation.clone(),
                last_used: Instant::now(),
            },
        );

        info!(conversation_id = %id, "Conversation started");
        (id, conversation)
    }

    /// Number of live conversations
    pub async fn conversation_count(&self) -> usize {
        self.conversations.lock().await.len()
    }
}

/// Shared application state handle.
pub type SharedState = Arc<AppState>;
