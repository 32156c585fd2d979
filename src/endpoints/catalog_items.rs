//! Catalog item endpoints.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::EndpointContext;
use crate::http::error::ApiError;
use crate::persistence::{CatalogFilter, CatalogItem};
use crate::services::{CatalogService, ItemDraft};

const ITEM_ID: &str = "catalogItemId";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub picture_uri: String,
    pub catalog_type_id: i32,
    pub catalog_brand_id: i32,
}

impl From<CatalogItem> for CatalogItemDto {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            price: item.price,
            picture_uri: item.picture_uri,
            catalog_type_id: item.catalog_type_id,
            catalog_brand_id: item.catalog_brand_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPagedCatalogItemRequest {
    pub page_size: Option<usize>,
    pub page_index: Option<usize>,
    pub catalog_brand_id: Option<i32>,
    pub catalog_type_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPagedCatalogItemResponse {
    pub catalog_items: Vec<CatalogItemDto>,
    pub page_count: usize,
}

/// Shared by the get, create and update responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemResponse {
    pub catalog_item: CatalogItemDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogItemRequest {
    pub catalog_brand_id: i32,
    pub catalog_type_id: i32,
    #[serde(default)]
    pub description: String,
    pub name: String,
    pub picture_name: Option<String>,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCatalogItemRequest {
    pub id: i32,
    pub catalog_brand_id: i32,
    pub catalog_type_id: i32,
    #[serde(default)]
    pub description: String,
    pub name: String,
    pub picture_name: Option<String>,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct DeleteCatalogItemResponse {
    pub status: &'static str,
}

pub async fn list_paged(ctx: EndpointContext) -> Result<Response, ApiError> {
    let request: ListPagedCatalogItemRequest = ctx.query()?;
    let service = ctx.get::<CatalogService>()?;

    let filter = CatalogFilter {
        brand_id: request.catalog_brand_id,
        type_id: request.catalog_type_id,
    };
    let page = service
        .list_items(filter, request.page_size, request.page_index.unwrap_or(0))
        .await?;

    Ok(Json(ListPagedCatalogItemResponse {
        catalog_items: page.items.into_iter().map(CatalogItemDto::from).collect(),
        page_count: page.page_count,
    })
    .into_response())
}

pub async fn get_by_id(ctx: EndpointContext) -> Result<Response, ApiError> {
    let id: i32 = ctx.path_param(ITEM_ID)?;
    let item = ctx.get::<CatalogService>()?.get_item(id).await?;
    Ok(Json(CatalogItemResponse { catalog_item: item.into() }).into_response())
}

pub async fn create(ctx: EndpointContext) -> Result<Response, ApiError> {
    let request: CreateCatalogItemRequest = ctx.json()?;
    let item = ctx
        .get::<CatalogService>()?
        .create_item(ItemDraft {
            name: request.name,
            description: request.description,
            price: request.price,
            picture_name: request.picture_name,
            catalog_type_id: request.catalog_type_id,
            catalog_brand_id: request.catalog_brand_id,
        })
        .await?;

    let location = HeaderValue::from_str(&format!("/api/catalog-items/{}", item.id))
        .map_err(|err| ApiError::internal_from("invalid location header", err))?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CatalogItemResponse { catalog_item: item.into() }),
    )
        .into_response())
}

pub async fn update(ctx: EndpointContext) -> Result<Response, ApiError> {
    let request: UpdateCatalogItemRequest = ctx.json()?;
    let item = ctx
        .get::<CatalogService>()?
        .update_item(
            request.id,
            ItemDraft {
                name: request.name,
                description: request.description,
                price: request.price,
                picture_name: request.picture_name,
                catalog_type_id: request.catalog_type_id,
                catalog_brand_id: request.catalog_brand_id,
            },
        )
        .await?;
    Ok(Json(CatalogItemResponse { catalog_item: item.into() }).into_response())
}

pub async fn delete(ctx: EndpointContext) -> Result<Response, ApiError> {
    let id: i32 = ctx.path_param(ITEM_ID)?;
    ctx.get::<CatalogService>()?.delete_item(id).await?;
    Ok(Json(DeleteCatalogItemResponse { status: "Deleted" }).into_response())
}
