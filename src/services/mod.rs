//! Domain services registered for the endpoints.

pub mod catalog;
pub mod uri_composer;

pub use catalog::{CatalogPage, CatalogService, ItemDraft};
pub use uri_composer::UriComposer;
