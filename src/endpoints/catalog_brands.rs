//! `GET /api/catalog-brands`

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::EndpointContext;
use crate::cache::MemoryCache;
use crate::http::error::ApiError;
use crate::services::CatalogService;

pub const CACHE_KEY: &str = "catalog-brands";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogBrandDto {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCatalogBrandsResponse {
    pub catalog_brands: Vec<CatalogBrandDto>,
}

pub async fn list(ctx: EndpointContext) -> Result<Response, ApiError> {
    let service = ctx.get::<CatalogService>()?;
    let cache = ctx.get::<MemoryCache>()?;

    let catalog_brands = cache
        .get_or_try_insert_with(CACHE_KEY, move || async move {
            let brands = service.list_brands().await?;
            Ok::<_, ApiError>(
                brands
                    .into_iter()
                    .map(|b| CatalogBrandDto { id: b.id, name: b.brand })
                    .collect::<Vec<_>>(),
            )
        })
        .await?;

    Ok(Json(ListCatalogBrandsResponse { catalog_brands }).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_support::{context, json_body};
    use crate::lifecycle::registry::RegistryBuilder;
    use crate::persistence::seed::CatalogSeed;
    use crate::persistence::{CatalogRepository, InMemoryCatalog};
    use crate::services::UriComposer;
    use axum::http::Method;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_brands_listed_and_cached() {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalog::new());
        CatalogSeed::new(catalog.clone()).seed().await.unwrap();

        let mut registry = RegistryBuilder::new();
        registry
            .register(CatalogService::new(catalog.clone(), UriComposer::new("http://localhost")))
            .unwrap();
        registry.register(MemoryCache::new(Duration::from_secs(30))).unwrap();
        let ctx = context(registry, Method::GET, "/api/catalog-brands", None, &[]);
        let cache = ctx.get::<MemoryCache>().unwrap();

        let body = json_body(list(ctx).await.unwrap()).await;
        let brands = body["catalogBrands"].as_array().unwrap();
        assert_eq!(brands.len(), 5);
        assert_eq!(brands[0]["name"], "Azure");
        assert!(cache.get::<Vec<CatalogBrandDto>>(CACHE_KEY).is_some());
    }
}
