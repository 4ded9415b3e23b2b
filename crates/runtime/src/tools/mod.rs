//! Tool specifications, argument parsing, and tool hosts.

pub mod errors;
mod function;
mod host;
mod types;

pub use errors::ToolError;
pub use function::{FunctionTools, ToolFn};
pub use host::ToolHost;
pub use types::{ParamSpec, ParamType, ToolArguments, ToolSpec};
