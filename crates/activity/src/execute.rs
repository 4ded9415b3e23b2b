//! Running an activity under its options.

use crate::{ActivityError, ActivityOptions};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// Classifies failures for the retry loop.
pub trait Retryable {
    /// Whether another attempt could succeed.
    fn is_retryable(&self) -> bool;
}

enum Failure<E> {
    Error(E),
    TimedOut,
}

/// Run `work` until it succeeds, fails permanently, or the retry budget
/// runs out.
///
/// Each attempt gets a fresh future from `work` and is cancelled when it
/// exceeds the start-to-close timeout. Timeouts are retried like any other
/// retryable failure.
#[tracing::instrument(skip_all, fields(activity = name))]
pub async fn execute<T, E, F, Fut>(
    name: &str,
    options: &ActivityOptions,
    mut work: F,
) -> Result<T, ActivityError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let policy = &options.retry_policy;
    let timeout = options.start_to_close_timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        debug!(attempt = attempts, "starting attempt");

        let failure = match tokio::time::timeout(timeout, work()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(source)) if !source.is_retryable() => {
                return Err(ActivityError::NonRetryable { attempts, source });
            }
            Ok(Err(source)) => Failure::Error(source),
            Err(_) => Failure::TimedOut,
        };

        if !policy.allows_another(attempts) {
            return Err(match failure {
                Failure::Error(source) => ActivityError::RetriesExhausted { attempts, source },
                Failure::TimedOut => ActivityError::Timeout { attempts, timeout },
            });
        }

        let delay = policy.delay_for(attempts);
        match &failure {
            Failure::Error(e) => {
                warn!(attempt = attempts, ?delay, error = %e, "attempt failed, retrying");
            }
            Failure::TimedOut => {
                warn!(attempt = attempts, ?delay, ?timeout, "attempt timed out, retrying");
            }
        }
        tokio::time::sleep(delay).await;
    }
}
