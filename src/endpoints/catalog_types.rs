//! `GET /api/catalog-types`

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::EndpointContext;
use crate::cache::MemoryCache;
use crate::http::error::ApiError;
use crate::services::CatalogService;

pub const CACHE_KEY: &str = "catalog-types";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTypeDto {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCatalogTypesResponse {
    pub catalog_types: Vec<CatalogTypeDto>,
}

pub async fn list(ctx: EndpointContext) -> Result<Response, ApiError> {
    let service = ctx.get::<CatalogService>()?;
    let cache = ctx.get::<MemoryCache>()?;

    let catalog_types = cache
        .get_or_try_insert_with(CACHE_KEY, move || async move {
            let types = service.list_types().await?;
            Ok::<_, ApiError>(
                types
                    .into_iter()
                    .map(|t| CatalogTypeDto { id: t.id, name: t.kind })
                    .collect::<Vec<_>>(),
            )
        })
        .await?;

    Ok(Json(ListCatalogTypesResponse { catalog_types }).into_response())
}
