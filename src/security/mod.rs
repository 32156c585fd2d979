//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     BaseUrlConfig + CorsConfig → cors.rs (CorsPolicy capability)
//!     IdentityConfig             → policy.rs (PolicyTable capability)
//!
//! Request:
//!     Origin header       → CorsPolicy::evaluate → allow / reject / preflight
//!     Matched route policy → AuthPolicy::permits(principal)
//! ```
//!
//! # Design Decisions
//! - Policies are data, resolved once at startup
//! - Route policies are referenced by name; unknown names fail startup

pub mod cors;
pub mod policy;

pub use cors::{CorsDecision, CorsPolicy};
pub use policy::{AuthPolicy, PolicyTable};
