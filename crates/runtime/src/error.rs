use crate::model::ModelError;
use crate::tools::ToolError;
use thiserror::Error;

/// Errors surfaced by the tool loop and the router.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The model API could not be reached or answered with an error.
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),

    /// The model requested a tool outside the declared set.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool call arguments failed strict parsing or schema validation.
    #[error("malformed arguments for tool '{tool}': {reason}")]
    MalformedToolArguments { tool: String, reason: String },

    /// A tool executor returned an error.
    #[error("tool '{tool}' failed: {source}")]
    ToolFailed {
        tool: String,
        #[source]
        source: ToolError,
    },

    /// The follow-up reply asked for more tools; only one round is supported.
    #[error("model requested {0} more tool call(s) after the tool round")]
    UnexpectedToolCalls(usize),

    /// The classifier answered with something outside the specialist set.
    #[error("unrecognized specialist: {0:?}")]
    UnrecognizedSpecialist(String),

    /// A message would break the conversation's ordering rules.
    #[error("invalid conversation: {0}")]
    InvalidConversation(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether retrying the whole invocation could succeed.
    ///
    /// Only model availability problems are transient; everything else
    /// points at a prompt, schema, or configuration mismatch.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ModelUnavailable(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
