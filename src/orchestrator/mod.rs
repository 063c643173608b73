//! Tool-call orchestration for the bookmark assistant.
//!
//! A turn runs at most two completion calls. The first may request tools;
//! each request is dispatched in order and answered in the transcript. When
//! any tool ran, a developer note is appended and a second call, with tool
//! calling disabled, produces the reply the user sees.

mod handlers;
mod tools;
mod transcript;

pub use handlers::*;
pub use tools::*;
pub use transcript::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, CompletionResult};
use crate::llm::{CompletionClient, CompletionRequest, FunctionTool, OutputItem, ToolChoice};
use crate::prompts::{ASSISTANT_INSTRUCTIONS, FOLLOW_UP_NOTE};

/// Reply returned when a completion call fails.
pub const APOLOGY: &str = "I encountered an error while processing your request. Please try again.";

/// A message of client-side chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Drives one conversation: owns its transcript and runs turns.
pub struct ToolOrchestrator {
    client: Arc<dyn CompletionClient>,
    dispatcher: ToolDispatcher,
    tools: Vec<FunctionTool>,
    transcript: Transcript,
    history_limit: usize,
    conversation_id: String,
}

impl ToolOrchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        dispatcher: ToolDispatcher,
        history_limit: usize,
    ) -> Self {
        Self {
            client,
            dispatcher,
            tools: tool_declarations(),
            transcript: Transcript::new(),
            history_limit,
            conversation_id: Uuid::new_v4().to_string(),
        }
    }

    /// Use a caller-chosen conversation id
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Answer one user message.
    ///
    /// An empty `history` starts a fresh conversation. Never fails: a failed
    /// completion call yields [`APOLOGY`].
    #[instrument(skip(self, message, history), fields(conversation_id = %self.conversation_id))]
    pub async fn respond(&mut self, message: &str, history: &[ChatMessage]) -> String {
        if history.is_empty() && !self.transcript.is_empty() {
            debug!("Empty history, resetting transcript");
            self.transcript.clear();
        }
        self.transcript.push(Turn::UserMessage(message.to_string()));

        let reply = match self.run_turn().await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Chat turn failed");
                APOLOGY.to_string()
            }
        };

        self.transcript.trim(self.history_limit);
        reply
    }

    async fn run_turn(&mut self) -> CompletionResult<String> {
        let request = CompletionRequest::new(self.transcript.to_input())
            .with_instructions(ASSISTANT_INSTRUCTIONS)
            .with_tools(self.tools.clone())
            .with_tool_choice(ToolChoice::Auto);
        let completion = self.client.complete(request).await?;
        let first_reply = completion.output_text();

        let mut tools_ran = 0usize;
        for item in completion.output {
            match item {
                OutputItem::Message { .. } => {
                    if let Some(text) = item.text().filter(|t| !t.is_empty()) {
                        self.transcript.push(Turn::AssistantMessage(text));
                    }
                }
                OutputItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } => {
                    let invocation = match resolve(&name, &arguments) {
                        Dispatch::Ignored { name } => {
                            warn!(tool = %name, "Ignoring call to undeclared tool");
                            continue;
                        }
                        Dispatch::Reject { tool, error } => Err((tool, error)),
                        Dispatch::Invoke(invocation) => Ok(invocation),
                    };

                    self.transcript.push(Turn::ToolRequest {
                        call_id: call_id.clone(),
                        name,
                        arguments,
                    });
                    let outcome = match invocation {
                        Ok(invocation) => self.dispatcher.execute(invocation).await,
                        Err((tool, error)) => {
                            warn!(tool = %tool.name(), error = %error, "Rejected tool arguments");
                            ToolOutcome::from_error(&AppError::from(error))
                        }
                    };
                    self.transcript.push(Turn::ToolResult {
                        call_id,
                        output: outcome.to_output(),
                    });
                    tools_ran += 1;
                }
                OutputItem::Other => {}
            }
        }

        if tools_ran == 0 {
            return Ok(first_reply);
        }

        info!(tools = tools_ran, "Tools ran, requesting confirmation reply");
        self.transcript.push(Turn::DeveloperNote(FOLLOW_UP_NOTE.to_string()));

        let request = CompletionRequest::new(self.transcript.to_input())
            .with_instructions(ASSISTANT_INSTRUCTIONS)
            .with_tools(self.tools.clone())
            .with_tool_choice(ToolChoice::None);
        let reply = self.client.complete(request).await?.output_text();

        if !reply.is_empty() {
            self.transcript.push(Turn::AssistantMessage(reply.clone()));
        }
        Ok(reply)
    }
}
