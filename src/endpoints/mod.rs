//! Application endpoints.
//!
//! Every endpoint is an async function from [`EndpointContext`] to a
//! response. The route declarations in [`routes`] bind them to paths,
//! authorization policies and the capabilities they resolve.

pub mod auth;
pub mod catalog_brands;
pub mod catalog_items;
pub mod catalog_types;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::request::Parts;
use axum::http::{header, Method};
use axum::response::Response;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::http::error::ApiError;
use crate::identity::{Principal, TokenService, UserManager};
use crate::lifecycle::registry::CapabilityRegistry;
use crate::routing::{PathParams, RouteSpec};
use crate::security::policy::ADMIN;
use crate::services::CatalogService;

#[async_trait]
pub trait EndpointHandler: Send + Sync {
    async fn call(&self, ctx: EndpointContext) -> Result<Response, ApiError>;
}

#[async_trait]
impl<F, Fut> EndpointHandler for F
where
    F: Fn(EndpointContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    async fn call(&self, ctx: EndpointContext) -> Result<Response, ApiError> {
        (self)(ctx).await
    }
}

/// Everything an endpoint sees of a request.
pub struct EndpointContext {
    pub parts: Parts,
    pub body: Bytes,
    pub params: PathParams,
    pub principal: Option<Principal>,
    registry: Arc<CapabilityRegistry>,
}

impl EndpointContext {
    pub fn new(
        parts: Parts,
        body: Bytes,
        params: PathParams,
        principal: Option<Principal>,
        registry: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            parts,
            body,
            params,
            principal,
            registry,
        }
    }

    pub fn path_param<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        let raw = self
            .params
            .get(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing route value '{name}'")))?;
        raw.parse()
            .map_err(|_| ApiError::BadRequest(format!("route value '{name}' is not valid: {raw}")))
    }

    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Query::<T>::try_from_uri(&self.parts.uri)
            .map(|Query(value)| value)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let is_json = self
            .parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(true, |value| value.starts_with("application/json"));
        if !is_json {
            return Err(ApiError::BadRequest("expected an application/json body".into()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ApiError> {
        Ok(self.registry.get::<T>()?)
    }

    pub fn resolve<T: Any + Send + Sync + Clone>(&self) -> Result<T, ApiError> {
        Ok(self.registry.resolve::<T>()?)
    }
}

/// Application routes, health and documentation excluded.
pub fn routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::handler(Method::POST, "/api/authenticate", auth::authenticate)
            .name("Authenticate")
            .summary("Authenticates a user and returns a bearer token")
            .tag("AuthEndpoints")
            .requires::<UserManager>()
            .requires::<TokenService>(),
        RouteSpec::handler(Method::GET, "/api/catalog-brands", catalog_brands::list)
            .name("ListCatalogBrands")
            .summary("List Catalog Brands")
            .tag("CatalogBrandEndpoints")
            .requires::<CatalogService>()
            .requires::<MemoryCache>(),
        RouteSpec::handler(Method::GET, "/api/catalog-types", catalog_types::list)
            .name("ListCatalogTypes")
            .summary("List Catalog Types")
            .tag("CatalogTypeEndpoints")
            .requires::<CatalogService>()
            .requires::<MemoryCache>(),
        RouteSpec::handler(Method::GET, "/api/catalog-items", catalog_items::list_paged)
            .name("ListPagedCatalogItems")
            .summary("List Catalog Items (paged)")
            .tag("CatalogItemEndpoints")
            .requires::<CatalogService>(),
        RouteSpec::handler(Method::GET, "/api/catalog-items/{catalogItemId}", catalog_items::get_by_id)
            .name("GetCatalogItemById")
            .summary("Get a Catalog Item by Id")
            .tag("CatalogItemEndpoints")
            .requires::<CatalogService>(),
        RouteSpec::handler(Method::POST, "/api/catalog-items", catalog_items::create)
            .name("CreateCatalogItem")
            .summary("Creates a new Catalog Item")
            .tag("CatalogItemEndpoints")
            .policy(ADMIN)
            .requires::<CatalogService>(),
        RouteSpec::handler(Method::PUT, "/api/catalog-items", catalog_items::update)
            .name("UpdateCatalogItem")
            .summary("Updates a Catalog Item")
            .tag("CatalogItemEndpoints")
            .policy(ADMIN)
            .requires::<CatalogService>(),
        RouteSpec::handler(Method::DELETE, "/api/catalog-items/{catalogItemId}", catalog_items::delete)
            .name("DeleteCatalogItem")
            .summary("Deletes a Catalog Item")
            .tag("CatalogItemEndpoints")
            .policy(ADMIN)
            .requires::<CatalogService>(),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::lifecycle::registry::RegistryBuilder;
    use axum::http::Request;

    /// Context over `registry` for a request with an optional JSON body.
    pub fn context(
        registry: RegistryBuilder,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
        params: &[(&str, &str)],
    ) -> EndpointContext {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        let body = body.map(|b| Bytes::from(b.to_string())).unwrap_or_default();
        EndpointContext::new(
            parts,
            body,
            PathParams::from_pairs(params),
            None,
            Arc::new(registry.freeze()),
        )
    }

    pub async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
