use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Default browser User-Agent sent with page fetches
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub fetch: FetchConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub collection: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration for the completion and embedding endpoints
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Web page fetch configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

/// Which embedder backs the vector store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// OpenAI embeddings endpoint.
    OpenAi,
    /// Local feature-hashing embedder, no network.
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimensions: usize,
}

/// Conversation configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Maximum number of transcript turns kept between chat turns.
    pub history_limit: usize,
    /// Maximum number of conversations the server keeps alive.
    pub max_conversations: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let openai = OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY").map_err(|_| AppError::Config {
                message: "OPENAI_API_KEY is required".to_string(),
            })?,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: env::var("MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/bookmarks.db".to_string()),
            ),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5),
            collection: env::var("BOOKMARK_COLLECTION")
                .unwrap_or_else(|_| "bookmarks".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_var("REQUEST_TIMEOUT_MS", 30000),
            max_retries: parse_var("MAX_RETRIES", 3),
            retry_delay_ms: parse_var("RETRY_DELAY_MS", 1000),
        };

        let fetch = FetchConfig {
            timeout_ms: parse_var("FETCH_TIMEOUT_MS", 10000),
            user_agent: env::var("FETCH_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        };

        let embedding = EmbeddingConfig {
            provider: match env::var("EMBEDDING_PROVIDER")
                .unwrap_or_else(|_| "openai".to_string())
                .to_lowercase()
                .as_str()
            {
                "hashing" | "local" => EmbeddingProvider::Hashing,
                _ => EmbeddingProvider::OpenAi,
            },
            model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            dimensions: parse_var("EMBEDDING_DIMENSIONS", 256),
        };

        let chat = ChatConfig {
            history_limit: parse_var("CHAT_HISTORY_LIMIT", 25),
            max_conversations: parse_var("CHAT_MAX_CONVERSATIONS", 100),
        };

        Ok(Config {
            openai,
            database,
            logging,
            request,
            fetch,
            embedding,
            chat,
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset or unparseable.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-small".to_string(),
            dimensions: 256,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 25,
            max_conversations: 100,
        }
    }
}
