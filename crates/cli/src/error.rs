//! CLI error types.

use crate::config::ConfigError;
use activity::{ActivityError, Retryable};
use thiserror::Error;

/// A runtime failure inside an activity attempt.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StepError(#[from] pub runtime::Error);

impl Retryable for StepError {
    fn is_retryable(&self) -> bool {
        self.0.is_transient()
    }
}

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An activity gave up.
    #[error("activity '{name}' failed: {source}")]
    Activity {
        name: String,
        #[source]
        source: ActivityError<StepError>,
    },
}

impl Error {
    /// Wrap an activity failure, for use with `map_err`.
    pub fn activity(name: &str) -> impl FnOnce(ActivityError<StepError>) -> Self + use<> {
        let name = name.to_string();
        move |source| Self::Activity { name, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
