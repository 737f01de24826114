//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use jamur_pos_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{CategoryRef, Product};

/// Columns selected for every product query; `p` is the product, `c` its category.
const PRODUCT_COLUMNS: &str = r"
    p.id, p.categories_id, p.name, p.description, p.price, p.image_url,
    p.is_active, p.created_at, p.updated_at, c.name AS category_name
";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    categories_id: i32,
    name: String,
    description: String,
    price: Decimal,
    image_url: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let categories_id = CategoryId::new(row.categories_id);
        Self {
            id: ProductId::new(row.id),
            categories_id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            category: CategoryRef {
                id: categories_id,
                name: row.category_name,
            },
        }
    }
}

/// Filters for the owner product list.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    /// `Some(true)` for active only, `Some(false)` for inactive only.
    pub is_active: Option<bool>,
}

/// Writable product fields.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub categories_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub is_active: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching `filter`, ordered by name, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        const WHERE: &str = r"
            ($1::text IS NULL OR p.name ILIKE $1)
            AND ($2::int IS NULL OR p.categories_id = $2)
            AND ($3::bool IS NULL OR p.is_active = $3)
        ";

        let search = filter.search.as_deref().map(super::like_pattern);
        let category = filter.category.map(|c| c.as_i32());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM pos.products p WHERE {WHERE}"
        ))
        .bind(search.as_deref())
        .bind(category)
        .bind(filter.is_active)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM pos.products p
            JOIN pos.categories c ON c.id = p.categories_id
            WHERE {WHERE}
            ORDER BY p.name, p.id
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(search.as_deref())
        .bind(category)
        .bind(filter.is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Active products ordered by name, for the register.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM pos.products p
            JOIN pos.categories c ON c.id = p.categories_id
            WHERE p.is_active
            ORDER BY p.name
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM pos.products p
            JOIN pos.categories c ON c.id = p.categories_id
            WHERE p.id = $1
            "
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product by exact name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM pos.products p
            JOIN pos.categories c ON c.id = p.categories_id
            WHERE p.name = $1
            ORDER BY p.created_at
            LIMIT 1
            "
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Which of `ids` exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();

        let found: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM pos.products WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_all(self.pool)
                .await?;

        Ok(found.into_iter().map(ProductId::new).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create(
        &self,
        input: &ProductInput,
        image_url: &str,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                INSERT INTO pos.products
                    (id, categories_id, name, description, price, image_url, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS}
            FROM p
            JOIN pos.categories c ON c.id = p.categories_id
            "
        ))
        .bind(ProductId::generate().as_uuid())
        .bind(input.categories_id.as_i32())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(image_url)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::map_constraint(e, "category does not exist"))?;

        Ok(row.into())
    }

    /// Update a product; `image_url = None` keeps the current image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                UPDATE pos.products
                SET categories_id = $2,
                    name = $3,
                    description = $4,
                    price = $5,
                    image_url = COALESCE($6, image_url),
                    is_active = $7,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS}
            FROM p
            JOIN pos.categories c ON c.id = p.categories_id
            "
        ))
        .bind(id.as_uuid())
        .bind(input.categories_id.as_i32())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(image_url)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| super::map_constraint(e, "category does not exist"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Flip the active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn toggle_status(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                UPDATE pos.products
                SET is_active = NOT is_active, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS}
            FROM p
            JOIN pos.categories c ON c.id = p.categories_id
            "
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product that was never sold and return its image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any order line references it.
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<String, RepositoryError> {
        let sold: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pos.order_items WHERE products_id = $1)",
        )
        .bind(id.as_uuid())
        .fetch_one(self.pool)
        .await?;

        if sold {
            return Err(RepositoryError::Conflict(
                "product is referenced by orders".to_owned(),
            ));
        }

        let image_url: Option<String> =
            sqlx::query_scalar("DELETE FROM pos.products WHERE id = $1 RETURNING image_url")
                .bind(id.as_uuid())
                .fetch_optional(self.pool)
                .await
                .map_err(|e| super::map_constraint(e, "product is referenced by orders"))?;

        image_url.ok_or(RepositoryError::NotFound)
    }
}
