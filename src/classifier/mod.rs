//! Hierarchical category assignment through schema-constrained completions.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::bookmark::{Bookmark, CATEGORY_SEPARATOR};
use crate::error::{CompletionError, CompletionResult};
use crate::llm::{CompletionClient, CompletionRequest, TextConfig};
use crate::prompts::category_prompt;

/// Picks a category path for a bookmark.
#[derive(Clone)]
pub struct CategoryClassifier {
    client: Arc<dyn CompletionClient>,
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    category: CategoryValue,
}

/// The model returns segments; some models answer with an already joined path.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryValue {
    Segments(Vec<String>),
    Path(String),
}

impl CategoryClassifier {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Output schema: `{"category": ["Segment", ...]}`.
    pub fn output_format() -> TextConfig {
        TextConfig::json_schema(
            "category",
            "A JSON schema defining the category path for the bookmark",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "array",
                        "description": "An array representing the hierarchical category path for the bookmark",
                        "items": {
                            "type": "string",
                            "description": "A string representing a part of the category path"
                        }
                    }
                },
                "required": ["category"],
                "additionalProperties": false
            }),
        )
    }

    /// Category path for `bookmark`, using existing categories as hints.
    pub async fn classify(
        &self,
        bookmark: &Bookmark,
        existing_categories: &[String],
        guidance: Option<&str>,
    ) -> CompletionResult<String> {
        let request = CompletionRequest::prompt(category_prompt(
            bookmark,
            existing_categories,
            guidance,
        ))
        .with_text(Self::output_format());

        let completion = self.client.complete(request).await?;
        let category = parse_category(&completion.output_text())?;

        debug!(url = %bookmark.url, category = %category, "Bookmark classified");
        Ok(category)
    }
}

/// Parse the structured output into a `/`-joined path.
fn parse_category(output: &str) -> CompletionResult<String> {
    let response: CategoryResponse =
        serde_json::from_str(output).map_err(|e| CompletionError::InvalidResponse {
            message: format!("Failed to parse category output: {}", e),
        })?;

    let segments: Vec<String> = match response.category {
        CategoryValue::Segments(segments) => segments,
        CategoryValue::Path(path) => path
            .split(CATEGORY_SEPARATOR)
            .map(str::to_string)
            .collect(),
    };

    let segments: Vec<&str> = segments
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(CompletionError::InvalidResponse {
            message: "Category output contained an empty path".to_string(),
        });
    }

    Ok(segments.join("/"))
}
