//! Rewrites seeded picture URIs onto the configured catalog host.

use crate::config::BaseUrlConfig;
use crate::persistence::seed::PICTURE_BASE_PLACEHOLDER;

#[derive(Debug, Clone)]
pub struct UriComposer {
    catalog_base: String,
}

impl UriComposer {
    pub fn new(catalog_base: impl Into<String>) -> Self {
        Self {
            catalog_base: catalog_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &BaseUrlConfig) -> Self {
        Self::new(config.catalog_base.as_str())
    }

    pub fn compose(&self, uri: &str) -> String {
        uri.replace(PICTURE_BASE_PLACEHOLDER, &self.catalog_base)
    }
}
