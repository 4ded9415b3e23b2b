use thiserror::Error;

/// Errors from LLM provider calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The provider asked us to slow down (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The LLM provider returned an error response.
    #[error("provider api ({status}): {body}")]
    Api { status: u16, body: String },

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}
