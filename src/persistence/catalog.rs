//! Catalog context: brands, types and items.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, Ordering};

use super::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBrand {
    pub id: i32,
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogType {
    pub id: i32,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub picture_uri: String,
    pub catalog_type_id: i32,
    pub catalog_brand_id: i32,
}

/// An item before the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogItem {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub picture_uri: String,
    pub catalog_type_id: i32,
    pub catalog_brand_id: i32,
}

impl NewCatalogItem {
    fn with_id(self, id: i32) -> CatalogItem {
        CatalogItem {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            picture_uri: self.picture_uri,
            catalog_type_id: self.catalog_type_id,
            catalog_brand_id: self.catalog_brand_id,
        }
    }
}

/// Optional brand and type restriction for item listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub brand_id: Option<i32>,
    pub type_id: Option<i32>,
}

impl CatalogFilter {
    fn matches(&self, item: &CatalogItem) -> bool {
        self.brand_id.map_or(true, |id| item.catalog_brand_id == id)
            && self.type_id.map_or(true, |id| item.catalog_type_id == id)
    }
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_brands(&self) -> Result<Vec<CatalogBrand>, StoreError>;
    async fn list_types(&self) -> Result<Vec<CatalogType>, StoreError>;
    async fn add_brand(&self, brand: &str) -> Result<CatalogBrand, StoreError>;
    async fn add_type(&self, kind: &str) -> Result<CatalogType, StoreError>;

    async fn get_item(&self, id: i32) -> Result<Option<CatalogItem>, StoreError>;

    /// One page of items (ordered by id) plus the total matching count.
    async fn list_items(
        &self,
        filter: CatalogFilter,
        skip: usize,
        take: Option<usize>,
    ) -> Result<(Vec<CatalogItem>, usize), StoreError>;

    async fn add_item(&self, item: NewCatalogItem) -> Result<CatalogItem, StoreError>;
    async fn update_item(&self, item: CatalogItem) -> Result<CatalogItem, StoreError>;
    async fn delete_item(&self, id: i32) -> Result<(), StoreError>;

    async fn brand_count(&self) -> Result<usize, StoreError>;
    async fn type_count(&self) -> Result<usize, StoreError>;
    async fn item_count(&self) -> Result<usize, StoreError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Catalog held in process memory.
#[derive(Debug)]
pub struct InMemoryCatalog {
    brands: DashMap<i32, CatalogBrand>,
    types: DashMap<i32, CatalogType>,
    items: DashMap<i32, CatalogItem>,
    // Lower-cased item name → id; the unique index on item names.
    item_names: DashMap<String, i32>,
    next_brand: AtomicI32,
    next_type: AtomicI32,
    next_item: AtomicI32,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self {
            brands: DashMap::new(),
            types: DashMap::new(),
            items: DashMap::new(),
            item_names: DashMap::new(),
            next_brand: AtomicI32::new(1),
            next_type: AtomicI32::new(1),
            next_item: AtomicI32::new(1),
        }
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    fn sorted<T: Clone>(map: &DashMap<i32, T>) -> Vec<T> {
        let mut rows: Vec<(i32, T)> = map.iter().map(|r| (*r.key(), r.value().clone())).collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn list_brands(&self) -> Result<Vec<CatalogBrand>, StoreError> {
        Ok(Self::sorted(&self.brands))
    }

    async fn list_types(&self) -> Result<Vec<CatalogType>, StoreError> {
        Ok(Self::sorted(&self.types))
    }

    async fn add_brand(&self, brand: &str) -> Result<CatalogBrand, StoreError> {
        let id = self.next_brand.fetch_add(1, Ordering::Relaxed);
        let row = CatalogBrand { id, brand: brand.to_string() };
        self.brands.insert(id, row.clone());
        Ok(row)
    }

    async fn add_type(&self, kind: &str) -> Result<CatalogType, StoreError> {
        let id = self.next_type.fetch_add(1, Ordering::Relaxed);
        let row = CatalogType { id, kind: kind.to_string() };
        self.types.insert(id, row.clone());
        Ok(row)
    }

    async fn get_item(&self, id: i32) -> Result<Option<CatalogItem>, StoreError> {
        Ok(self.items.get(&id).map(|r| r.value().clone()))
    }

    async fn list_items(
        &self,
        filter: CatalogFilter,
        skip: usize,
        take: Option<usize>,
    ) -> Result<(Vec<CatalogItem>, usize), StoreError> {
        let matching: Vec<CatalogItem> = Self::sorted(&self.items)
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(skip)
            .take(take.unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn add_item(&self, item: NewCatalogItem) -> Result<CatalogItem, StoreError> {
        match self.item_names.entry(Self::name_key(&item.name)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "A catalogItem with name {} already exists",
                item.name
            ))),
            Entry::Vacant(slot) => {
                let id = self.next_item.fetch_add(1, Ordering::Relaxed);
                let row = item.with_id(id);
                slot.insert(id);
                self.items.insert(id, row.clone());
                Ok(row)
            }
        }
    }

    async fn update_item(&self, item: CatalogItem) -> Result<CatalogItem, StoreError> {
        let previous = self
            .items
            .get(&item.id)
            .map(|r| r.value().name.clone())
            .ok_or_else(|| StoreError::NotFound(format!("Catalog item {} not found", item.id)))?;

        let (old_key, new_key) = (Self::name_key(&previous), Self::name_key(&item.name));
        if old_key != new_key {
            match self.item_names.entry(new_key) {
                Entry::Occupied(_) => {
                    return Err(StoreError::Duplicate(format!(
                        "A catalogItem with name {} already exists",
                        item.name
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(item.id);
                }
            }
            self.item_names.remove(&old_key);
        }

        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: i32) -> Result<(), StoreError> {
        let (_, removed) = self
            .items
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Catalog item {id} not found")))?;
        self.item_names.remove(&Self::name_key(&removed.name));
        Ok(())
    }

    async fn brand_count(&self) -> Result<usize, StoreError> {
        Ok(self.brands.len())
    }

    async fn type_count(&self) -> Result<usize, StoreError> {
        Ok(self.types.len())
    }

    async fn item_count(&self) -> Result<usize, StoreError> {
        Ok(self.items.len())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, brand: i32, kind: i32) -> NewCatalogItem {
        NewCatalogItem {
            name: name.into(),
            description: name.into(),
            price: 12.0,
            picture_uri: String::new(),
            catalog_type_id: kind,
            catalog_brand_id: brand,
        }
    }

    #[tokio::test]
    async fn test_item_names_are_unique() {
        let catalog = InMemoryCatalog::new();
        catalog.add_item(item("Roslyn Red Sheet", 1, 1)).await.unwrap();
        let err = catalog.add_item(item("roslyn red sheet", 2, 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(catalog.item_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filtered_paging() {
        let catalog = InMemoryCatalog::new();
        for (index, brand) in [1, 2, 1, 1, 2].into_iter().enumerate() {
            catalog.add_item(item(&format!("item {index}"), brand, 1)).await.unwrap();
        }

        let filter = CatalogFilter { brand_id: Some(1), type_id: None };
        let (page, total) = catalog.list_items(filter, 1, Some(1)).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "item 2");

        let (all, total) = catalog.list_items(CatalogFilter::default(), 0, None).await.unwrap();
        assert_eq!((all.len(), total), (5, 5));
    }

    #[tokio::test]
    async fn test_rename_frees_old_name() {
        let catalog = InMemoryCatalog::new();
        let mut mug = catalog.add_item(item("Mug", 1, 1)).await.unwrap();
        mug.name = "Cup".into();
        catalog.update_item(mug).await.unwrap();

        assert!(catalog.add_item(item("Mug", 1, 1)).await.is_ok());
        assert!(matches!(
            catalog.add_item(item("Cup", 1, 1)).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_item() {
        let catalog = InMemoryCatalog::new();
        assert!(matches!(catalog.delete_item(42).await, Err(StoreError::NotFound(_))));
    }
}
