//! eShop public API: bootstrap sequencer and request pipeline.

// Startup and serving
pub mod config;
pub mod lifecycle;
pub mod http;
pub mod routing;

// Application
pub mod endpoints;
pub mod services;
pub mod persistence;
pub mod identity;
pub mod cache;
pub mod openapi;

// Cross-cutting concerns
pub mod health;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Bootstrap, Shutdown, StartupError};
