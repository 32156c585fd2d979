//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteSpec[] (path, method, target, policy name, required capabilities)
//!     → resolve policy names against PolicyTable
//!     → compile into matchit tree
//!     → Freeze as immutable RouteTable (registered capability)
//!
//! Incoming Request (method, path)
//!     → RouteTable::at
//!     → Found(route, params) | MethodNotAllowed(allowed) | NotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - The health probe is a route like any other; its target differs

pub mod router;

pub use router::{
    PathParams, RouteEntry, RouteError, RouteMatch, RouteSpec, RouteTable, RouteTableBuilder,
    RouteTarget,
};
