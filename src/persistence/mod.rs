//! Persistence contexts.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     DatabaseConfig → InMemoryCatalog + InMemoryIdentityStore
//!     → registered as Arc<dyn CatalogRepository> / Arc<dyn IdentityStore>
//!     → seed.rs populates reference data after the build point
//!
//! Request:
//!     endpoint → service → repository trait → store
//! ```
//!
//! # Design Decisions
//! - Stores sit behind async traits so seeding and endpoints never name a
//!   concrete backend
//! - Uniqueness is enforced by the store, like a unique index would

pub mod catalog;
pub mod identity;
pub mod seed;

use thiserror::Error;

pub use catalog::{
    CatalogBrand, CatalogFilter, CatalogItem, CatalogRepository, CatalogType, InMemoryCatalog,
    NewCatalogItem,
};
pub use identity::{ApplicationUser, IdentityStore, InMemoryIdentityStore};
pub use seed::{CatalogSeed, IdentitySeed, SeedReport};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    /// The store cannot be reached right now; callers may retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid data: {0}")]
    Invalid(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
