//! OpenAPI document generated from the route table.
//!
//! The document is rendered once at startup and served verbatim from the
//! documentation path.

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use utoipa::openapi::path::{
    HttpMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathsBuilder,
};
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
use utoipa::openapi::{ComponentsBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Required};

use crate::config::DocumentationConfig;
use crate::endpoints::EndpointContext;
use crate::http::error::ApiError;
use crate::routing::{RouteEntry, RouteTable};

const BEARER_SCHEME: &str = "Bearer";

/// The rendered document, registered as a capability.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    json: Arc<serde_json::Value>,
}

impl ApiDocument {
    pub fn generate(config: &DocumentationConfig, routes: &RouteTable) -> Result<Self, serde_json::Error> {
        let document = build_openapi(config, routes);
        Ok(Self {
            json: Arc::new(serde_json::to_value(&document)?),
        })
    }

    pub fn json(&self) -> &serde_json::Value {
        &self.json
    }

    pub fn respond(&self) -> Response {
        Json(self.json.as_ref().clone()).into_response()
    }
}

/// Endpoint serving the registered [`ApiDocument`].
pub async fn serve_document(ctx: EndpointContext) -> Result<Response, ApiError> {
    Ok(ctx.get::<ApiDocument>()?.respond())
}

fn http_method(method: &Method) -> Option<HttpMethod> {
    Some(match *method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::DELETE => HttpMethod::Delete,
        Method::PATCH => HttpMethod::Patch,
        Method::HEAD => HttpMethod::Head,
        Method::OPTIONS => HttpMethod::Options,
        _ => return None,
    })
}

/// `{name}` segments of a route pattern.
fn path_parameters(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
}

fn operation(route: &RouteEntry) -> Operation {
    let mut builder = OperationBuilder::new()
        .operation_id(Some(route.name.clone()))
        .summary(route.summary.clone())
        .response("200", ResponseBuilder::new().description("Success").build());

    if let Some(tag) = &route.tag {
        builder = builder.tag(tag.clone());
    }
    for name in path_parameters(&route.path) {
        builder = builder.parameter(
            ParameterBuilder::new()
                .name(name)
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .build(),
        );
    }
    if route.policy.requires_authentication() {
        builder = builder
            .security(SecurityRequirement::new(BEARER_SCHEME, Vec::<String>::new()))
            .response("401", ResponseBuilder::new().description("Unauthorized").build())
            .response("403", ResponseBuilder::new().description("Forbidden").build());
    }
    builder.build()
}

fn build_openapi(config: &DocumentationConfig, routes: &RouteTable) -> OpenApi {
    let mut paths = PathsBuilder::new();
    for route in routes.routes() {
        let Some(method) = http_method(&route.method) else {
            continue;
        };
        paths = paths.path(route.path.clone(), PathItem::new(method, operation(route)));
    }

    let components = ComponentsBuilder::new()
        .security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("JWT Authorization header using the Bearer scheme."))
                    .build(),
            ),
        )
        .build();

    OpenApiBuilder::new()
        .info(InfoBuilder::new().title(config.title.clone()).version(config.version.clone()).build())
        .paths(paths.build())
        .components(Some(components))
        .build()
}
