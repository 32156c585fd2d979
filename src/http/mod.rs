//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, transport layers, request ID)
//!     → pipeline.rs (ordered stages)
//!         exception → https-redirect → routing → cors → authorization → dispatch
//!     → error.rs (problem responses)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod server;

pub use error::{ApiError, Problem};
pub use pipeline::{Next, Pipeline, Stage};
pub use server::HttpServer;
