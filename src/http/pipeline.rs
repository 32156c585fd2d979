//! Request pipeline runner.
//!
//! A pipeline is an ordered list of [`Stage`]s. Each stage receives the
//! request and a [`Next`] cursor over the stages after it; it either returns
//! a response of its own (short-circuit) or calls [`Next::run`].
//!
//! ```text
//! request → [exception] → [https] → [routing] → [cors] → [authorization] → [dispatch]
//!                ↑                                                              │
//!                └──────────────────────── response ◀───────────────────────────┘
//! ```

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::http::error::{ApiError, Problem};
use crate::http::request::request_id;
use crate::observability::metrics;

/// One ordered unit of request handling.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, ApiError>;
}

/// The remainder of the pipeline after the current stage.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
}

impl<'a> Next<'a> {
    pub async fn run(self, req: Request) -> Result<Response, ApiError> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(req, Next { stages: rest }).await,
            None => Err(ApiError::internal("request fell through the pipeline")),
        }
    }
}

/// An ordered, immutable chain of stages.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run a request through every stage.
    ///
    /// Errors escaping the first stage still become a single problem
    /// response; the connection never sees a fault.
    pub async fn handle(&self, req: Request) -> Response {
        let started = Instant::now();
        let method = req.method().to_string();
        let request_id = request_id(req.headers());

        let response = match (Next { stages: &self.stages }).run(req).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "Unhandled error escaped the pipeline");
                Problem::new(err.status(), err.code(), "An unexpected error occurred.")
                    .with_request_id(request_id)
                    .into_response()
            }
        };

        metrics::record_request(&method, response.status().as_u16(), started);
        response
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    /// Append a stage; stages run in the order they are added.
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
