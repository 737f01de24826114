//! Catalog models: categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jamur_pos_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub is_active: bool,
}

/// A category with the number of products filed under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub products_count: i64,
}

/// Category id and name embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// A sellable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub categories_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Path relative to the storage root, e.g. `products/<uuid>.jpg`.
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: CategoryRef,
}

impl Product {
    /// Public URL of the product image.
    #[must_use]
    pub fn image_src(&self) -> String {
        format!("/storage/{}", self.image_url)
    }
}

/// Product as exposed over JSON, with its public image URL.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub image_src: String,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let image_src = product.image_src();
        Self { product, image_src }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_view_exposes_image_src() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            categories_id: CategoryId::new(1),
            name: "Jamur Crispy Original".to_string(),
            description: "Renyah".to_string(),
            price: Decimal::from(25_000),
            image_url: "products/sample.jpg".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            category: CategoryRef {
                id: CategoryId::new(1),
                name: "Crispy".to_string(),
            },
        };

        let json = serde_json::to_value(ProductView::from(product)).unwrap();
        assert_eq!(json["image_src"], "/storage/products/sample.jpg");
        assert_eq!(json["image_url"], "products/sample.jpg");
        assert_eq!(json["category"]["name"], "Crispy");
        assert_eq!(json["price"], "25000");
    }
}
