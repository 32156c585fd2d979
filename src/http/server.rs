//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router whose only handler is the request pipeline
//! - Wire transport layers (timeout, request ID, tracing)
//! - Serve a listener until shutdown is signalled
//!
//! # Design Decisions
//! - Routing is owned by the pipeline, so Axum sees a single fallback
//! - Request IDs are assigned before the pipeline runs and echoed back

use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::pipeline::Pipeline;
use crate::http::request::X_REQUEST_ID;

pub struct HttpServer {
    config: Arc<AppConfig>,
    pipeline: Arc<Pipeline>,
}

impl HttpServer {
    pub fn new(config: Arc<AppConfig>, pipeline: Arc<Pipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Build the Axum router with all transport layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(run_pipeline)
            .with_state(self.pipeline.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Serve `listener` until `shutdown` receives a message or its sender drops.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn run_pipeline(State(pipeline): State<Arc<Pipeline>>, req: Request) -> Response {
    pipeline.handle(req).await
}
