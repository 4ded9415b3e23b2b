//! Tool host backed by plain functions.

use super::{ToolArguments, ToolError, ToolHost, ToolSpec};

/// A synchronous tool implementation.
pub type ToolFn = fn(&ToolArguments) -> Result<String, ToolError>;

/// An ordered registry of tools implemented as plain functions.
///
/// The default value has no tools, which is what a specialist without
/// capabilities (or the classifier call) uses.
#[derive(Debug, Clone, Default)]
pub struct FunctionTools {
    specs: Vec<ToolSpec>,
    handlers: Vec<ToolFn>,
}

impl FunctionTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later registration with the same name replaces
    /// the earlier one in place.
    pub fn with_tool(mut self, spec: ToolSpec, handler: ToolFn) -> Self {
        match self.specs.iter().position(|s| s.name == spec.name) {
            Some(index) => {
                self.specs[index] = spec;
                self.handlers[index] = handler;
            }
            None => {
                self.specs.push(spec);
                self.handlers.push(handler);
            }
        }
        self
    }

}

impl ToolHost for FunctionTools {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, name: &str, args: &ToolArguments) -> Result<String, ToolError> {
        let index = self
            .specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        (self.handlers[index])(args)
    }
}
