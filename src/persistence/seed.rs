//! Reference data seeding.
//!
//! # Responsibilities
//! - Populate the catalog brands, types and items that are missing
//! - Ensure the administrator role and the demo and admin users exist
//!
//! # Design Decisions
//! - Converges per row: each reference row is looked up by name before it
//!   is written, so a second run writes nothing and a run cut short by a
//!   store failure is completed by the retry
//! - Item rows reference brands and types by name, resolved after those
//!   tables are seeded

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::identity::UserManager;
use crate::observability::metrics;
use crate::persistence::{CatalogFilter, CatalogRepository, NewCatalogItem, StoreError};

/// Placeholder host in seeded picture URIs, rewritten when items are served.
pub const PICTURE_BASE_PLACEHOLDER: &str = "http://catalogbaseurltobereplaced";

pub const DEMO_USER: &str = "demouser@microsoft.com";
pub const ADMIN_USER: &str = "admin@microsoft.com";

const BRANDS: &[&str] = &["Azure", ".NET", "Visual Studio", "SQL Server", "Other"];
const TYPES: &[&str] = &["Mug", "T-Shirt", "Sheet", "USB Memory Stick"];

// (type, brand, name, price, picture number)
const ITEMS: &[(&str, &str, &str, f64, u32)] = &[
    ("T-Shirt", ".NET", ".NET Bot Black Sweatshirt", 19.5, 1),
    ("Mug", ".NET", ".NET Black & White Mug", 8.50, 2),
    ("T-Shirt", "Other", "Prism White T-Shirt", 12.0, 3),
    ("T-Shirt", ".NET", ".NET Foundation Sweatshirt", 12.0, 4),
    ("Sheet", "Other", "Roslyn Red Sheet", 8.5, 5),
    ("T-Shirt", ".NET", ".NET Blue Sweatshirt", 12.0, 6),
    ("T-Shirt", "Other", "Roslyn Red T-Shirt", 12.0, 7),
    ("T-Shirt", "Other", "Kudu Purple Sweatshirt", 8.5, 8),
    ("Mug", "Other", "Cup<T> White Mug", 12.0, 9),
    ("Sheet", ".NET", ".NET Foundation Sheet", 12.0, 10),
    ("Sheet", ".NET", "Cup<T> Sheet", 8.5, 11),
    ("T-Shirt", "Other", "Prism White TShirt", 12.0, 12),
];

/// Rows written by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub brands: usize,
    pub types: usize,
    pub items: usize,
    pub roles: usize,
    pub users: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == SeedReport::default()
    }

    fn merge(self, other: SeedReport) -> SeedReport {
        SeedReport {
            brands: self.brands + other.brands,
            types: self.types + other.types,
            items: self.items + other.items,
            roles: self.roles + other.roles,
            users: self.users + other.users,
        }
    }
}

pub struct CatalogSeed {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogSeed {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Insert every reference row that is missing, matched by name.
    ///
    /// Rows already present are left alone, so a run interrupted halfway
    /// is completed by the next one.
    pub async fn seed(&self) -> Result<SeedReport, StoreError> {
        let mut report = SeedReport::default();

        let mut brands: HashMap<String, i32> = self
            .catalog
            .list_brands()
            .await?
            .into_iter()
            .map(|b| (b.brand, b.id))
            .collect();
        for &brand in BRANDS {
            if !brands.contains_key(brand) {
                let row = self.catalog.add_brand(brand).await?;
                brands.insert(row.brand, row.id);
                report.brands += 1;
            }
        }

        let mut types: HashMap<String, i32> = self
            .catalog
            .list_types()
            .await?
            .into_iter()
            .map(|t| (t.kind, t.id))
            .collect();
        for &kind in TYPES {
            if !types.contains_key(kind) {
                let row = self.catalog.add_type(kind).await?;
                types.insert(row.kind, row.id);
                report.types += 1;
            }
        }

        let (existing, _) = self.catalog.list_items(CatalogFilter::default(), 0, None).await?;
        let existing: HashSet<String> = existing.into_iter().map(|item| item.name.to_lowercase()).collect();

        for &(kind, brand, name, price, picture) in ITEMS {
            if existing.contains(&name.to_lowercase()) {
                continue;
            }
            let lookup = |table: &HashMap<String, i32>, key: &str| {
                table
                    .get(key)
                    .copied()
                    .ok_or_else(|| StoreError::Invalid(format!("seed item '{name}' references unknown '{key}'")))
            };
            self.catalog
                .add_item(NewCatalogItem {
                    name: name.to_string(),
                    description: name.to_string(),
                    price,
                    picture_uri: format!("{PICTURE_BASE_PLACEHOLDER}/images/products/{picture}.png"),
                    catalog_type_id: lookup(&types, kind)?,
                    catalog_brand_id: lookup(&brands, brand)?,
                })
                .await?;
            report.items += 1;
        }

        metrics::record_seeded("catalog_brands", report.brands);
        metrics::record_seeded("catalog_types", report.types);
        metrics::record_seeded("catalog_items", report.items);
        Ok(report)
    }
}

pub struct IdentitySeed {
    users: Arc<UserManager>,
    admin_role: String,
    password: String,
}

impl IdentitySeed {
    pub fn new(users: Arc<UserManager>, admin_role: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            users,
            admin_role: admin_role.into(),
            password: password.into(),
        }
    }

    pub async fn seed(&self) -> Result<SeedReport, StoreError> {
        let mut report = SeedReport::default();

        if !self.users.role_exists(&self.admin_role).await? {
            self.users.create_role(&self.admin_role).await?;
            report.roles += 1;
        }

        for user_name in [DEMO_USER, ADMIN_USER] {
            if self.users.find_by_name(user_name).await?.is_none() {
                self.users.create_user(user_name, user_name, &self.password).await?;
                report.users += 1;
            }
        }

        self.users.add_to_role(ADMIN_USER, &self.admin_role).await?;

        metrics::record_seeded("roles", report.roles);
        metrics::record_seeded("users", report.users);
        Ok(report)
    }
}

/// Seed both contexts, catalog first.
pub async fn seed_all(catalog: &CatalogSeed, identity: &IdentitySeed) -> Result<SeedReport, StoreError> {
    let catalog_report = catalog.seed().await?;
    let identity_report = identity.seed().await?;
    Ok(catalog_report.merge(identity_report))
}
