//! Handoff runtime: the tool-calling loop and specialist routing.
//!
//! This crate provides the provider-agnostic core for answering a query with
//! a language model, optionally after running local tools, and for choosing
//! which specialist agent should answer it.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Backend**: A trait abstracting LLM providers (OpenAI-compatible, etc.).
//! - **ToolHost**: The set of tools a model may call, with their schemas.
//! - **ToolCallLoop**: One model call, optional tool execution, one follow-up.
//! - **RouteStrategy**: Picks one specialist from a closed set, either by a
//!   classification call or by a model-issued transfer.
//! - **Agent**: Leaf and routing agent records executed by [`run_agent`].
//!
//! # Example
//!
//! ```ignore
//! use runtime::{FunctionTools, OpenAiBackend, Query, tool_loop};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = OpenAiBackend::builder("sk-...").model("gpt-4o-mini").build();
//! let tools = FunctionTools::new();
//! let answer = tool_loop::run(&backend, &Query::new("Hello!"), None, &tools).await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```

mod agent;
mod error;
pub mod model;
pub mod providers;
mod query;
pub mod router;
pub mod tool_loop;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent::{Agent, LeafAgent, Outcome, RoutingAgent, run_agent};
pub use error::{Error, Result};
pub use model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Role, Usage};
pub use providers::{OpenAiBackend, OpenAiBackendBuilder};
pub use query::{Query, TraceId};
pub use router::{ClassifierRouter, HandoffRouter, RouteStrategy, SpecialistId, Specialists};
pub use tool_loop::{FinalAnswer, ToolCallLoop};
pub use tools::{
    FunctionTools, ParamSpec, ParamType, ToolArguments, ToolError, ToolFn, ToolHost, ToolSpec,
};
