//! Seed the database with staff accounts and catalog data.
//!
//! ```bash
//! # Owner + cashier and the demo catalog
//! jamur-pos seed demo
//!
//! # Categories and products from a YAML file
//! jamur-pos seed catalog seeds/demo_catalog.yaml
//! ```
//!
//! Seeding is idempotent: users are matched by email, categories and
//! products by name, and existing rows are left untouched.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use jamur_pos_core::{Email, UserRole};
use jamur_pos_server::db::{self, CategoryRepository, ProductInput, ProductRepository, UserRepository};
use jamur_pos_server::services::AuthService;

use super::{CommandError, database_url};

/// Catalog bundled with the CLI for `seed demo`.
const DEMO_CATALOG: &str = include_str!("../../seeds/demo_catalog.yaml");

/// Password given to the demo accounts.
const DEMO_PASSWORD: &str = "password";

/// Image path used when a product entry names none.
const DEFAULT_IMAGE: &str = "products/sample.jpg";

const DEMO_USERS: [(&str, &str, UserRole); 2] = [
    ("owner@jamur.com", "Owner Jamur", UserRole::Owner),
    ("kasir@jamur.com", "Kasir Jamur", UserRole::Cashier),
];

/// Root of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
}

/// A category and the products filed under it.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A product entry.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// What a seeding run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_created: usize,
    pub categories_created: usize,
    pub products_created: usize,
    pub skipped: usize,
}

impl CatalogSeed {
    /// Parse and sanity-check a catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Yaml` for malformed YAML and
    /// `CommandError::Invalid` for blank names or negative prices.
    pub fn parse(content: &str) -> Result<Self, CommandError> {
        let seed: Self = serde_yaml::from_str(content)?;

        for category in &seed.categories {
            if category.name.trim().is_empty() {
                return Err(CommandError::Invalid("Category name must not be empty".to_owned()));
            }
            for product in &category.products {
                if product.name.trim().is_empty() {
                    return Err(CommandError::Invalid(format!(
                        "Product in category '{}' has an empty name",
                        category.name
                    )));
                }
                if product.price < Decimal::ZERO {
                    return Err(CommandError::Invalid(format!(
                        "Product '{}' has a negative price",
                        product.name
                    )));
                }
            }
        }

        Ok(seed)
    }

    /// Number of product entries across all categories.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.categories.iter().map(|c| c.products.len()).sum()
    }
}

/// Seed the demo owner, cashier and catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn demo() -> Result<(), CommandError> {
    let pool = db::create_pool(&database_url()?).await?;
    let catalog = CatalogSeed::parse(DEMO_CATALOG)?;

    let mut summary = seed_demo_users(&pool).await?;
    let catalog_summary = seed_catalog(&pool, &catalog).await?;
    summary.categories_created = catalog_summary.categories_created;
    summary.products_created = catalog_summary.products_created;
    summary.skipped += catalog_summary.skipped;

    log_summary(&summary);
    info!("Demo accounts use the password '{DEMO_PASSWORD}'");
    Ok(())
}

/// Seed categories and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a write fails.
pub async fn catalog(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    // Validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let catalog = CatalogSeed::parse(&content)?;
    info!(
        categories = catalog.categories.len(),
        products = catalog.product_count(),
        "Parsed catalog"
    );

    let pool = db::create_pool(&database_url()?).await?;
    let summary = seed_catalog(&pool, &catalog).await?;

    log_summary(&summary);
    Ok(())
}

async fn seed_demo_users(pool: &PgPool) -> Result<SeedSummary, CommandError> {
    let users = UserRepository::new(pool);
    let auth = AuthService::new(pool);
    let mut summary = SeedSummary::default();

    for (email, name, role) in DEMO_USERS {
        let parsed = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
        if users.get_by_email(&parsed).await?.is_some() {
            info!("User {email} already exists, skipping");
            summary.skipped += 1;
            continue;
        }

        auth.register(email, name, role, DEMO_PASSWORD).await?;
        info!("Created {role} {email}");
        summary.users_created += 1;
    }

    Ok(summary)
}

/// Insert missing categories and products.
async fn seed_catalog(pool: &PgPool, catalog: &CatalogSeed) -> Result<SeedSummary, CommandError> {
    let categories = CategoryRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    for entry in &catalog.categories {
        let name = entry.name.trim();
        let category = if let Some(existing) = categories.get_by_name(name).await? {
            summary.skipped += 1;
            existing
        } else {
            summary.categories_created += 1;
            categories.create(name, entry.is_active).await?
        };

        for product in &entry.products {
            let product_name = product.name.trim();
            if products.get_by_name(product_name).await?.is_some() {
                summary.skipped += 1;
                continue;
            }

            let input = ProductInput {
                categories_id: category.id,
                name: product_name.to_owned(),
                description: product.description.trim().to_owned(),
                price: product.price,
                is_active: product.is_active,
            };
            let image_url = product.image_url.as_deref().unwrap_or(DEFAULT_IMAGE);

            products.create(&input, image_url).await?;
            summary.products_created += 1;
        }
    }

    Ok(summary)
}

fn log_summary(summary: &SeedSummary) {
    info!("Seeding complete!");
    info!("  Users created: {}", summary.users_created);
    info!("  Categories created: {}", summary.categories_created);
    info!("  Products created: {}", summary.products_created);
    info!("  Skipped (already exist): {}", summary.skipped);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_parses() {
        let catalog = CatalogSeed::parse(DEMO_CATALOG).unwrap();

        let names: Vec<_> = catalog.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Crispy", "Balado", "Keripik", "Sambal"]);
        assert_eq!(catalog.product_count(), 5);
        assert!(catalog.categories.iter().all(|c| c.is_active));

        let sambal = &catalog.categories[3].products[0];
        assert_eq!(sambal.name, "Sambal Jamur");
        assert_eq!(sambal.price, Decimal::from(35_000));
        assert!(sambal.image_url.is_none());
    }

    #[test]
    fn test_catalog_defaults_and_overrides() {
        let catalog = CatalogSeed::parse(
            r"
categories:
  - name: Musiman
    is_active: false
    products:
      - name: Jamur Tiram Segar
        description: Per 250 gram
        price: 12500.50
        image_url: products/tiram.webp
        is_active: false
  - name: Kosong
",
        )
        .unwrap();

        let musiman = &catalog.categories[0];
        assert!(!musiman.is_active);
        assert_eq!(musiman.products[0].price, Decimal::new(1_250_050, 2));
        assert_eq!(
            musiman.products[0].image_url.as_deref(),
            Some("products/tiram.webp")
        );
        assert!(catalog.categories[1].products.is_empty());
    }

    #[test]
    fn test_catalog_rejects_bad_entries() {
        assert!(matches!(
            CatalogSeed::parse("categories:\n  - name: '  '\n"),
            Err(CommandError::Invalid(_))
        ));
        assert!(matches!(
            CatalogSeed::parse(
                "categories:\n  - name: A\n    products:\n      - {name: B, description: C, price: -1}\n"
            ),
            Err(CommandError::Invalid(_))
        ));
        assert!(matches!(
            CatalogSeed::parse("categories: nope"),
            Err(CommandError::Yaml(_))
        ));
    }

    #[test]
    fn test_demo_password_meets_policy() {
        assert!(jamur_pos_server::services::auth::validate_password(DEMO_PASSWORD).is_ok());
    }
}
