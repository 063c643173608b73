use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::error::{AppError, AppResult, ValidationError};
use crate::orchestrator::ChatMessage;

/// Parameters of `chat/respond`.
#[derive(Debug, Deserialize)]
pub struct ChatParams {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Result of `chat/respond`.
#[derive(Debug, Serialize)]
pub struct ChatResult {
    pub reply: String,
    pub conversation_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub category: Option<String>,
}

/// Route a method call to its handler. `None` for unknown methods.
pub async fn handle_method(
    state: &SharedState,
    method: &str,
    params: Option<Value>,
) -> Option<AppResult<Value>> {
    let result = match method {
        "chat/respond" => handle_chat_respond(state, params).await,
        "bookmarks/list" => handle_bookmarks_list(state, params).await,
        "categories/tree" => handle_categories_tree(state).await,
        _ => return None,
    };
    Some(result)
}

/// Handle chat/respond: one turn of a conversation
async fn handle_chat_respond(state: &SharedState, params: Option<Value>) -> AppResult<Value> {
    let params: ChatParams = parse_params("chat/respond", params)?;

    let (conversation_id, conversation) = state
        .conversation(params.conversation_id.as_deref())
        .await;
    info!(conversation_id = %conversation_id, "Handling chat message");

    let reply = conversation
        .lock()
        .await
        .respond(&params.message, &params.history)
        .await;

    to_value(ChatResult {
        reply,
        conversation_id,
    })
}

/// Handle bookmarks/list, optionally narrowed to a category prefix
async fn handle_bookmarks_list(state: &SharedState, params: Option<Value>) -> AppResult<Value> {
    let params: ListParams = match params {
        Some(Value::Null) | None => ListParams::default(),
        params => parse_params("bookmarks/list", params)?,
    };

    let bookmarks = match params.category.as_deref() {
        Some(prefix) => state.repository.find_by_category_prefix(prefix).await?,
        None => state.repository.all().await?,
    };

    to_value(serde_json::json!({ "bookmarks": bookmarks }))
}

/// Handle categories/tree
async fn handle_categories_tree(state: &SharedState) -> AppResult<Value> {
    let tree = state.repository.category_tree().await?;
    let paths = state.repository.all_category_paths().await?;
    to_value(serde_json::json!({ "tree": tree, "paths": paths }))
}

/// Helper to parse params with consistent error handling
fn parse_params<T: serde::de::DeserializeOwned>(method: &str, params: Option<Value>) -> AppResult<T> {
    let invalid = |message: String| {
        AppError::from(ValidationError::InvalidArguments {
            tool_name: method.to_string(),
            message,
        })
    };

    match params {
        Some(params) => serde_json::from_value(params).map_err(|e| invalid(e.to_string())),
        None => Err(invalid("Missing params".to_string())),
    }
}

fn to_value(result: impl Serialize) -> AppResult<Value> {
    serde_json::to_value(result).map_err(|e| AppError::Internal {
        message: format!("Failed to serialize result: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chat_params_defaults() {
        let params: ChatParams =
            parse_params("chat/respond", Some(json!({"message": "hi"}))).unwrap();
        assert_eq!(params.message, "hi");
        assert!(params.conversation_id.is_none());
        assert!(params.history.is_empty());
    }

    #[test]
    fn test_parse_params_missing() {
        let result: AppResult<ChatParams> = parse_params("chat/respond", None);
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::InvalidArguments { .. }))
        ));
    }

    #[test]
    fn test_parse_params_wrong_type() {
        let result: AppResult<ChatParams> =
            parse_params("chat/respond", Some(json!({"message": 42})));
        assert!(result.is_err());
    }
}
