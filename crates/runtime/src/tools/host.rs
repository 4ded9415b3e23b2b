//! Tool host trait.

use super::{ToolArguments, ToolError, ToolSpec};
use std::future::Future;

/// Trait for tool execution hosts.
///
/// Implementations provide tool specifications and execute tool calls.
/// This is the boundary between the model loop and side effects. Arguments
/// handed to `execute` have already been validated against the spec.
pub trait ToolHost: Send + Sync {
    /// Get available tool specifications.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a tool by name.
    fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
    ) -> impl Future<Output = Result<String, ToolError>> + Send;

    /// Look up a declared tool by name.
    fn spec(&self, name: &str) -> Option<&ToolSpec> {
        self.specs().iter().find(|spec| spec.name == name)
    }
}
