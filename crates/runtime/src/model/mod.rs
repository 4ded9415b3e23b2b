//! LLM protocol types and backend trait.

mod conversation;
pub mod errors;
pub mod types;

pub use conversation::Conversation;
pub use errors::ModelError;
pub use types::{
    Backend, Message, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult, Usage,
};
