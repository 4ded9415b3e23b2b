//! Routing by model-declared transfer.

use super::{RouteStrategy, SpecialistId, Specialists};
use crate::model::{Backend, Conversation, ModelRequest};
use crate::query::Query;
use crate::tools::{ToolArguments, ToolError, ToolSpec};
use crate::{Error, Result};
use tracing::{info, warn};

/// Tool name prefix for transfers: `transfer_to_<specialist>`.
pub const TRANSFER_PREFIX: &str = "transfer_to_";

const DEFAULT_INSTRUCTIONS: &str = "You are a triage agent. Decide which specialist should \
     answer the user's query and hand it off by calling exactly one transfer tool.";

/// Offers one transfer tool per specialist and reads the model's pick.
pub struct HandoffRouter<'a, B> {
    backend: &'a B,
    instructions: Option<&'a str>,
    model: Option<&'a str>,
}

impl<'a, B: Backend> HandoffRouter<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            instructions: None,
            model: None,
        }
    }

    /// Replace the built-in triage instructions.
    pub fn instructions(mut self, instructions: Option<&'a str>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Override the backend's default model.
    pub fn model(mut self, model: Option<&'a str>) -> Self {
        self.model = model;
        self
    }

    /// One parameterless transfer tool per specialist, in set order.
    pub fn transfer_tools(specialists: &Specialists) -> Vec<ToolSpec> {
        specialists
            .members()
            .iter()
            .map(|id| {
                ToolSpec::new(
                    format!("{TRANSFER_PREFIX}{id}"),
                    format!("Hand off the conversation to {id}."),
                )
            })
            .collect()
    }
}

impl<B: Backend> RouteStrategy for HandoffRouter<'_, B> {
    #[tracing::instrument(name = "handoff", skip_all, fields(trace_id = tracing::field::Empty))]
    async fn route(&self, query: &Query, specialists: &Specialists) -> Result<SpecialistId> {
        query.record_trace();
        let tools = Self::transfer_tools(specialists);
        let instructions = format!(
            "{}{}",
            self.instructions.unwrap_or(DEFAULT_INSTRUCTIONS),
            specialists.default_hint()
        );
        let conversation = Conversation::new(Some(instructions.as_str()), query.text());

        let response = self
            .backend
            .complete(
                ModelRequest::new(conversation.messages())
                    .with_tools(&tools)
                    .with_model(self.model),
            )
            .await?;

        // Every call is checked before the first one is honoured.
        let mut targets = Vec::new();
        for call in response.message.tool_calls() {
            let spec = tools
                .iter()
                .find(|t| t.name == call.name)
                .ok_or_else(|| Error::UnknownTool(call.name.clone()))?;
            let malformed = |e: ToolError| Error::MalformedToolArguments {
                tool: call.name.clone(),
                reason: e.to_string(),
            };
            let args = ToolArguments::parse(&call.arguments).map_err(malformed)?;
            spec.validate(&args).map_err(malformed)?;

            let name = &call.name[TRANSFER_PREFIX.len()..];
            if let Some(id) = specialists.find(name) {
                targets.push(id.clone());
            }
        }

        match targets.len() {
            0 => specialists.fallback(response.message.text().trim()),
            n => {
                if n > 1 {
                    warn!(count = n, "several transfers requested, using the first");
                }
                let id = targets.swap_remove(0);
                info!(specialist = %id, "handed off");
                Ok(id)
            }
        }
    }
}
