//! The tool-calling round trip.
//!
//! One query goes through at most two model calls: the first may request
//! tools, which are validated, executed in order, and fed back; the second
//! produces the final answer without tools on offer.

use crate::model::{Backend, Conversation, ModelRequest, ToolCall, ToolResult, Usage};
use crate::query::Query;
use crate::tools::{ToolArguments, ToolError, ToolHost};
use crate::{Error, Result};
use tracing::{debug, info};

/// The answer produced by one loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAnswer {
    pub text: String,
    /// Number of model calls issued (1 or 2).
    pub model_calls: u32,
    /// Token usage summed over all model calls.
    pub usage: Usage,
}

/// Drives a single query through the model and the tool host.
pub struct ToolCallLoop<'a, B, H> {
    backend: &'a B,
    host: &'a H,
    system: Option<&'a str>,
    model: Option<&'a str>,
}

impl<'a, B: Backend, H: ToolHost> ToolCallLoop<'a, B, H> {
    pub fn new(backend: &'a B, host: &'a H) -> Self {
        Self {
            backend,
            host,
            system: None,
            model: None,
        }
    }

    /// Set the system prompt.
    pub fn system(mut self, system: Option<&'a str>) -> Self {
        self.system = system;
        self
    }

    /// Override the backend's default model.
    pub fn model(mut self, model: Option<&'a str>) -> Self {
        self.model = model;
        self
    }

    #[tracing::instrument(
        name = "tool_loop",
        skip_all,
        fields(trace_id = tracing::field::Empty, tools = self.host.specs().len())
    )]
    pub async fn run(&self, query: &Query) -> Result<FinalAnswer> {
        query.record_trace();
        let mut conversation = Conversation::new(self.system, query.text());

        let first = self
            .backend
            .complete(
                ModelRequest::new(conversation.messages())
                    .with_tools(self.host.specs())
                    .with_model(self.model),
            )
            .await?;
        let mut usage = first.usage;

        if !first.message.has_tool_calls() {
            debug!("answered without tools");
            let text = first.message.text();
            conversation.push_assistant(first.message)?;
            return Ok(FinalAnswer {
                text,
                model_calls: 1,
                usage,
            });
        }

        let calls: Vec<ToolCall> = first.message.tool_calls().into_iter().cloned().collect();
        info!(count = calls.len(), "tool calls requested");

        // Nothing runs unless every call names a declared tool with valid arguments.
        let prepared = calls
            .iter()
            .map(|call| self.prepare(call))
            .collect::<Result<Vec<_>>>()?;

        conversation.push_assistant(first.message)?;
        for (call, args) in calls.iter().zip(&prepared) {
            info!(tool = %call.name, args = %args, "calling tool");
            let content = self
                .host
                .execute(&call.name, args)
                .await
                .map_err(|source| Error::ToolFailed {
                    tool: call.name.clone(),
                    source,
                })?;
            debug!(tool = %call.name, bytes = content.len(), "tool returned");
            conversation.push_tool_result(ToolResult {
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
                content,
            })?;
        }

        let follow_up = self
            .backend
            .complete(ModelRequest::new(conversation.messages()).with_model(self.model))
            .await?;
        usage += follow_up.usage;

        let extra = follow_up.message.tool_calls().len();
        if extra > 0 {
            return Err(Error::UnexpectedToolCalls(extra));
        }

        let text = follow_up.message.text();
        conversation.push_assistant(follow_up.message)?;
        Ok(FinalAnswer {
            text,
            model_calls: 2,
            usage,
        })
    }

    fn prepare(&self, call: &ToolCall) -> Result<ToolArguments> {
        let spec = self
            .host
            .spec(&call.name)
            .ok_or_else(|| Error::UnknownTool(call.name.clone()))?;
        let malformed = |e: ToolError| Error::MalformedToolArguments {
            tool: call.name.clone(),
            reason: e.to_string(),
        };
        let args = ToolArguments::parse(&call.arguments).map_err(malformed)?;
        spec.validate(&args).map_err(malformed)?;
        Ok(args)
    }
}

/// Run one query with an optional system prompt and the host's tools.
pub async fn run<B: Backend, H: ToolHost>(
    backend: &B,
    query: &Query,
    system: Option<&str>,
    host: &H,
) -> Result<FinalAnswer> {
    ToolCallLoop::new(backend, host).system(system).run(query).await
}
