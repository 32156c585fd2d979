//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Startup work against a store (seeding):
//!     → retries.rs (retry transient failures)
//!     → backoff.rs (exponential delay + jitter between attempts)
//!     → the caller bounds the whole loop with a deadline
//! ```
//!
//! # Design Decisions
//! - Only transient failures are retried; everything else fails fast
//! - Jittered backoff prevents thundering herd

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{retry_transient, RetryPolicy};
