use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in the conversation input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Developer,
    System,
}

/// One item of the conversation sent to the Responses API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message {
        role: Role,
        content: String,
    },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

impl InputItem {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        InputItem::Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        InputItem::Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a developer message
    pub fn developer(content: impl Into<String>) -> Self {
        InputItem::Message {
            role: Role::Developer,
            content: content.into(),
        }
    }
}

/// Declaration of a callable function tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub strict: bool,
}

impl FunctionTool {
    /// Create a strict function tool
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
            strict: true,
        }
    }
}

/// Whether the model may call tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
}

/// Structured output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub format: TextFormat,
}

/// Output format constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFormat {
    Text,
    JsonSchema {
        name: String,
        description: String,
        schema: Value,
        strict: bool,
    },
}

impl TextConfig {
    /// Constrain output to a strict JSON schema
    pub fn json_schema(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            format: TextFormat::JsonSchema {
                name: name.into(),
                description: description.into(),
                schema,
                strict: true,
            },
        }
    }
}

/// Request to the Responses API (model is added by the client)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub input: Vec<InputItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,
}

impl CompletionRequest {
    /// Create a request from conversation input
    pub fn new(input: Vec<InputItem>) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    /// Single user prompt
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![InputItem::user(prompt)])
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<FunctionTool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_text(mut self, text: TextConfig) -> Self {
        self.text = Some(text);
        self
    }
}

/// Response from the Responses API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

/// One item of model output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(other)]
    Other,
}

/// Content part of an output message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText {
        text: String,
    },
    Refusal {
        refusal: String,
    },
    #[serde(other)]
    Other,
}

impl OutputItem {
    /// Concatenated text of a message item; `None` for other items
    pub fn text(&self) -> Option<String> {
        match self {
            OutputItem::Message { content } => Some(
                content
                    .iter()
                    .filter_map(|part| match part {
                        OutputContent::OutputText { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl Completion {
    /// All output text, concatenated in order
    pub fn output_text(&self) -> String {
        self.output.iter().filter_map(OutputItem::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_input_items_serialize_with_type_tag() {
        let items = vec![
            InputItem::user("hi"),
            InputItem::FunctionCall {
                call_id: "call_1".into(),
                name: "get_categories".into(),
                arguments: "{}".into(),
            },
            InputItem::FunctionCallOutput {
                call_id: "call_1".into(),
                output: "{\"status\":\"found\"}".into(),
            },
            InputItem::developer("note"),
        ];
        assert_eq!(
            serde_json::to_value(&items).unwrap(),
            json!([
                {"type": "message", "role": "user", "content": "hi"},
                {"type": "function_call", "call_id": "call_1", "name": "get_categories", "arguments": "{}"},
                {"type": "function_call_output", "call_id": "call_1", "output": "{\"status\":\"found\"}"},
                {"type": "message", "role": "developer", "content": "note"}
            ])
        );
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let request = CompletionRequest::prompt("hello");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"input": [{"type": "message", "role": "user", "content": "hello"}]})
        );

        let request = CompletionRequest::prompt("hello").with_tool_choice(ToolChoice::None);
        assert_eq!(serde_json::to_value(&request).unwrap()["tool_choice"], "none");
    }

    #[test]
    fn test_json_schema_format_shape() {
        let text = TextConfig::json_schema("category", "desc", json!({"type": "object"}));
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({"format": {
                "type": "json_schema",
                "name": "category",
                "description": "desc",
                "schema": {"type": "object"},
                "strict": true
            }})
        );
    }

    #[test]
    fn test_completion_parses_mixed_output() {
        let completion: Completion = serde_json::from_value(json!({
            "id": "resp_1",
            "object": "response",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {
                    "type": "message",
                    "id": "msg_1",
                    "role": "assistant",
                    "content": [
                        {"type": "output_text", "text": "Hello ", "annotations": []},
                        {"type": "output_text", "text": "there", "annotations": []}
                    ]
                },
                {
                    "type": "function_call",
                    "id": "fc_1",
                    "call_id": "call_1",
                    "name": "add_bookmarks",
                    "arguments": "{\"urls\":[]}",
                    "status": "completed"
                }
            ]
        }))
        .unwrap();

        assert_eq!(completion.output.len(), 3);
        assert_eq!(completion.output[0], OutputItem::Other);
        assert_eq!(completion.output_text(), "Hello there");
        assert_eq!(
            completion.output[2],
            OutputItem::FunctionCall {
                call_id: "call_1".into(),
                name: "add_bookmarks".into(),
                arguments: "{\"urls\":[]}".into(),
            }
        );
    }
}
