//! Completion endpoint client.
//!
//! Speaks the OpenAI Responses API: conversation items and declared function
//! tools in, assistant text and function calls out.

mod client;
mod types;

pub use client::*;
pub use types::*;
