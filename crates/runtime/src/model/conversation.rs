//! Append-only message history for a single loop invocation.

use super::types::{Message, Role, ToolResult};
use crate::{Error, Result};

/// An ordered, append-only sequence of messages.
///
/// Starts with an optional system message followed by the user query. Tool
/// messages may only answer calls from the latest assistant message, and an
/// assistant message may not be appended while calls are still unanswered.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: Vec<String>,
}

impl Conversation {
    pub fn new(system: Option<&str>, query: impl Into<String>) -> Self {
        let mut messages = Vec::with_capacity(4);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(query));
        Self {
            messages,
            pending: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Tool call ids from the latest assistant message that have no result yet.
    pub fn pending_calls(&self) -> &[String] {
        &self.pending
    }

    pub fn push_assistant(&mut self, message: Message) -> Result<()> {
        if message.role != Role::Assistant {
            return Err(Error::InvalidConversation(format!(
                "expected an assistant message, got {:?}",
                message.role
            )));
        }
        if !self.pending.is_empty() {
            return Err(Error::InvalidConversation(format!(
                "unanswered tool calls: {}",
                self.pending.join(", ")
            )));
        }
        self.pending = message
            .tool_calls()
            .into_iter()
            .map(|call| call.id.clone())
            .collect();
        self.messages.push(message);
        Ok(())
    }

    pub fn push_tool_result(&mut self, result: ToolResult) -> Result<()> {
        let Some(index) = self.pending.iter().position(|id| *id == result.tool_call_id) else {
            return Err(Error::InvalidConversation(format!(
                "tool result for unknown call id '{}'",
                result.tool_call_id
            )));
        };
        self.pending.remove(index);
        self.messages.push(Message::tool(result));
        Ok(())
    }
}
