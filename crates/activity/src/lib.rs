//! Retryable units of work.
//!
//! An activity is an async closure run under [`ActivityOptions`]: every
//! attempt is bounded by a start-to-close timeout, and failures the error
//! type marks as [`Retryable`] are retried with exponential backoff.
//!
//! # Example
//!
//! ```ignore
//! use activity::{ActivityOptions, execute};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ActivityOptions::default();
//! let answer = execute("ask_model", &options, || async { call_model().await }).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod execute;
mod policy;

pub use error::ActivityError;
pub use execute::{Retryable, execute};
pub use policy::{ActivityOptions, RetryPolicy};
