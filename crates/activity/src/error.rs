use std::time::Duration;
use thiserror::Error;

/// Why an activity gave up.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActivityError<E> {
    /// The last attempt ran past the start-to-close timeout.
    #[error("timed out after {attempts} attempt(s) of {timeout:?} each")]
    Timeout { attempts: u32, timeout: Duration },

    /// The work failed with an error that is not worth retrying.
    #[error("{source}")]
    NonRetryable {
        attempts: u32,
        #[source]
        source: E,
    },

    /// The retry budget ran out.
    #[error("gave up after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: E,
    },
}

impl<E> ActivityError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. }
            | Self::NonRetryable { attempts, .. }
            | Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }

    /// The underlying failure, unless the activity timed out.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Timeout { .. } => None,
            Self::NonRetryable { source, .. } | Self::RetriesExhausted { source, .. } => {
                Some(source)
            }
        }
    }
}
