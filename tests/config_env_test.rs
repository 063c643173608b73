//! Config environment variable tests
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use bookmark_agent::config::{Config, EmbeddingProvider, LogFormat};
use serial_test::serial;
use std::env;

fn with_api_key() {
    env::set_var("OPENAI_API_KEY", "test-key");
}

#[test]
#[serial]
fn test_config_requires_api_key() {
    env::remove_var("OPENAI_API_KEY");

    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
#[serial]
fn test_config_defaults() {
    with_api_key();

    let config = Config::from_env().unwrap();
    assert_eq!(config.openai.api_key, "test-key");
    assert_eq!(config.openai.model, "gpt-4o-mini");
    assert_eq!(config.chat.history_limit, 25);
    assert_eq!(config.chat.max_conversations, 100);
    assert_eq!(config.fetch.timeout_ms, 10000);
    assert_eq!(config.database.collection, "bookmarks");
}

#[test]
#[serial]
fn test_config_custom_model_and_base_url() {
    with_api_key();
    env::set_var("OPENAI_BASE_URL", "http://localhost:8080");
    env::set_var("MODEL", "gpt-4o");

    let config = Config::from_env().unwrap();
    assert_eq!(config.openai.base_url, "http://localhost:8080");
    assert_eq!(config.openai.model, "gpt-4o");

    env::remove_var("OPENAI_BASE_URL");
    env::remove_var("MODEL");
}

#[test]
#[serial]
fn test_config_custom_database() {
    with_api_key();
    env::set_var("DATABASE_PATH", "/custom/bookmarks.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");
    env::set_var("BOOKMARK_COLLECTION", "reading_list");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/bookmarks.db");
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.database.collection, "reading_list");

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
    env::remove_var("BOOKMARK_COLLECTION");
}

#[test]
#[serial]
fn test_config_json_log_format() {
    with_api_key();
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_chat_and_fetch_overrides() {
    with_api_key();
    env::set_var("CHAT_HISTORY_LIMIT", "40");
    env::set_var("CHAT_MAX_CONVERSATIONS", "8");
    env::set_var("FETCH_TIMEOUT_MS", "2500");
    env::set_var("FETCH_USER_AGENT", "test-agent/1.0");

    let config = Config::from_env().unwrap();
    assert_eq!(config.chat.history_limit, 40);
    assert_eq!(config.chat.max_conversations, 8);
    assert_eq!(config.fetch.timeout_ms, 2500);
    assert_eq!(config.fetch.user_agent, "test-agent/1.0");

    env::remove_var("CHAT_HISTORY_LIMIT");
    env::remove_var("CHAT_MAX_CONVERSATIONS");
    env::remove_var("FETCH_TIMEOUT_MS");
    env::remove_var("FETCH_USER_AGENT");
}

#[test]
#[serial]
fn test_config_embedding_provider() {
    with_api_key();
    env::set_var("EMBEDDING_PROVIDER", "hashing");
    env::set_var("EMBEDDING_DIMENSIONS", "128");

    let config = Config::from_env().unwrap();
    assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
    assert_eq!(config.embedding.dimensions, 128);

    env::remove_var("EMBEDDING_PROVIDER");
    env::remove_var("EMBEDDING_DIMENSIONS");
}

#[test]
#[serial]
fn test_config_invalid_numbers_fall_back() {
    with_api_key();
    env::set_var("MAX_RETRIES", "lots");
    env::set_var("REQUEST_TIMEOUT_MS", "-1");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.max_retries, 3);
    assert_eq!(config.request.timeout_ms, 30000);

    env::remove_var("MAX_RETRIES");
    env::remove_var("REQUEST_TIMEOUT_MS");
}
