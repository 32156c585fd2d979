//! Catalog use cases shared by the catalog endpoints.

use std::sync::Arc;

use crate::http::error::ApiError;
use crate::persistence::seed::PICTURE_BASE_PLACEHOLDER;
use crate::persistence::{
    CatalogBrand, CatalogFilter, CatalogItem, CatalogRepository, CatalogType, NewCatalogItem,
};
use crate::services::uri_composer::UriComposer;

/// Picture used when a new item names none.
pub const DEFAULT_PICTURE: &str = "eCatalog-item-default.png";

/// One page of catalog items.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub total: usize,
    pub page_count: usize,
}

/// Item fields accepted on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub picture_name: Option<String>,
    pub catalog_type_id: i32,
    pub catalog_brand_id: i32,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    uris: UriComposer,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>, uris: UriComposer) -> Self {
        Self { repository, uris }
    }

    pub async fn list_brands(&self) -> Result<Vec<CatalogBrand>, ApiError> {
        Ok(self.repository.list_brands().await?)
    }

    pub async fn list_types(&self) -> Result<Vec<CatalogType>, ApiError> {
        Ok(self.repository.list_types().await?)
    }

    /// `page_size` of `None` or 0 returns every matching item as one page.
    pub async fn list_items(
        &self,
        filter: CatalogFilter,
        page_size: Option<usize>,
        page_index: usize,
    ) -> Result<CatalogPage, ApiError> {
        let page_size = page_size.filter(|size| *size > 0);
        let skip = page_size.map_or(0, |size| size.saturating_mul(page_index));
        let (items, total) = self.repository.list_items(filter, skip, page_size).await?;

        let page_count = match page_size {
            Some(size) => total.div_ceil(size),
            None => usize::from(total > 0),
        };

        Ok(CatalogPage {
            items: items.into_iter().map(|item| self.present(item)).collect(),
            total,
            page_count,
        })
    }

    pub async fn get_item(&self, id: i32) -> Result<CatalogItem, ApiError> {
        self.repository
            .get_item(id)
            .await?
            .map(|item| self.present(item))
            .ok_or_else(|| ApiError::NotFound(format!("Catalog item {id} not found")))
    }

    pub async fn create_item(&self, draft: ItemDraft) -> Result<CatalogItem, ApiError> {
        Self::check(&draft)?;
        let picture = draft.picture_name.as_deref().unwrap_or(DEFAULT_PICTURE);
        let item = self
            .repository
            .add_item(NewCatalogItem {
                picture_uri: Self::picture_uri(picture),
                name: draft.name,
                description: draft.description,
                price: draft.price,
                catalog_type_id: draft.catalog_type_id,
                catalog_brand_id: draft.catalog_brand_id,
            })
            .await?;
        tracing::info!(item_id = item.id, name = %item.name, "Catalog item created");
        Ok(self.present(item))
    }

    pub async fn update_item(&self, id: i32, draft: ItemDraft) -> Result<CatalogItem, ApiError> {
        Self::check(&draft)?;
        let existing = self
            .repository
            .get_item(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Catalog item {id} not found")))?;

        let picture_uri = match draft.picture_name.as_deref() {
            Some(picture) => Self::picture_uri(picture),
            None => existing.picture_uri,
        };
        let item = self
            .repository
            .update_item(CatalogItem {
                id,
                name: draft.name,
                description: draft.description,
                price: draft.price,
                picture_uri,
                catalog_type_id: draft.catalog_type_id,
                catalog_brand_id: draft.catalog_brand_id,
            })
            .await?;
        Ok(self.present(item))
    }

    pub async fn delete_item(&self, id: i32) -> Result<(), ApiError> {
        self.repository.delete_item(id).await?;
        tracing::info!(item_id = id, "Catalog item deleted");
        Ok(())
    }

    fn check(draft: &ItemDraft) -> Result<(), ApiError> {
        if draft.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name is required".into()));
        }
        if !draft.price.is_finite() || draft.price < 0.0 {
            return Err(ApiError::BadRequest("price must be a non-negative number".into()));
        }
        Ok(())
    }

    fn picture_uri(picture: &str) -> String {
        format!("{PICTURE_BASE_PLACEHOLDER}/images/products/{picture}")
    }

    fn present(&self, mut item: CatalogItem) -> CatalogItem {
        item.picture_uri = self.uris.compose(&item.picture_uri);
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::seed::CatalogSeed;
    use crate::persistence::InMemoryCatalog;

    async fn service() -> CatalogService {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalog::new());
        CatalogSeed::new(catalog.clone()).seed().await.unwrap();
        CatalogService::new(catalog, UriComposer::new("http://localhost:44315"))
    }

    fn draft(name: &str) -> ItemDraft {
        ItemDraft {
            name: name.into(),
            description: "test".into(),
            price: 4.5,
            picture_name: None,
            catalog_type_id: 1,
            catalog_brand_id: 1,
        }
    }

    #[tokio::test]
    async fn test_page_count() {
        let service = service().await;
        let page = service.list_items(CatalogFilter::default(), Some(5), 2).await.unwrap();
        assert_eq!((page.items.len(), page.total, page.page_count), (2, 12, 3));

        let all = service.list_items(CatalogFilter::default(), None, 0).await.unwrap();
        assert_eq!((all.items.len(), all.page_count), (12, 1));
    }

    #[tokio::test]
    async fn test_pictures_are_composed() {
        let item = service().await.get_item(1).await.unwrap();
        assert_eq!(item.picture_uri, "http://localhost:44315/images/products/1.png");
    }

    #[tokio::test]
    async fn test_create_duplicate_and_invalid() {
        let service = service().await;
        let created = service.create_item(draft("Gopher Mug")).await.unwrap();
        assert!(created.picture_uri.ends_with("eCatalog-item-default.png"));

        assert!(matches!(
            service.create_item(draft("Gopher Mug")).await,
            Err(ApiError::Duplicate(_))
        ));
        assert!(matches!(
            service.create_item(draft("  ")).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let service = service().await;
        assert!(matches!(
            service.update_item(999, draft("Ghost")).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(service.delete_item(999).await, Err(ApiError::NotFound(_))));

        let updated = service.update_item(1, draft("Renamed")).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert!(updated.picture_uri.ends_with("/images/products/1.png"));
    }
}
