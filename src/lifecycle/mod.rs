//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, steps.rs):
//!     Validate plan → run steps in order → freeze registry at build
//!     → seed → assemble pipeline → Application
//!
//! Serving:
//!     Application::serve(listener, shutdown receiver)
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → trigger → stop accepting → drain connections → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup, validated before any step runs
//! - Any startup failure is fatal; no listener is bound
//! - The capability registry is immutable once frozen

pub mod registry;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod steps;

pub use registry::{CapabilityKey, CapabilityRegistry, RegistryBuilder, RegistryError};
pub use shutdown::Shutdown;
pub use startup::{Application, Bootstrap, BootstrapStep, StartupContext, StartupError};
