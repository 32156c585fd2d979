//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use public_api::config::{AppConfig, ConfigSource};
use public_api::lifecycle::{Application, Bootstrap, Shutdown};

pub const PASSWORD: &str = "Pass@word1";
pub const DEMO_USER: &str = "demouser@microsoft.com";
pub const ADMIN_USER: &str = "admin@microsoft.com";
pub const WEB_ORIGIN: &str = "http://localhost:44315";

/// Defaults with quick seeding retries.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.seeding.base_delay_ms = 1;
    config.seeding.max_delay_ms = 5;
    config.timeouts.startup_secs = 10;
    config
}

pub async fn bootstrap(config: AppConfig) -> Application {
    Bootstrap::standard(ConfigSource::Inline(config))
        .run()
        .await
        .expect("bootstrap failed")
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_server(config: AppConfig) -> TestServer {
    let app = bootstrap(config).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(async move { app.serve(listener, receiver).await });
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authenticate_request(user: &str) -> Request<Body> {
    json_request(
        "POST",
        "/api/authenticate",
        json!({ "username": user, "password": PASSWORD }),
        None,
    )
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
