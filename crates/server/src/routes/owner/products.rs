//! Product management. Create and update take `multipart/form-data` so an
//! image can travel with the fields.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use jamur_pos_core::{CategoryId, MAX_AMOUNT, ProductId};

use crate::db::{CategoryRepository, ProductFilter, ProductInput, ProductRepository, RepositoryError};
use crate::error::{AppError, ValidationErrors};
use crate::middleware::RequireOwner;
use crate::models::{Category, Page, PageRequest, ProductView};
use crate::services::ImageKind;
use crate::services::images::validate_upload;
use crate::state::AppState;

use super::{ActionResponse, ToggleResponse};

const PER_PAGE: i64 = 10;
const MAX_NAME_LENGTH: usize = 255;

/// Decimal places stored for `products.price`.
const MONEY_SCALE: u32 = 2;

// =============================================================================
// Query and form types
// =============================================================================

/// `GET /products` query string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    /// `active` or `inactive`.
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub page: Option<i64>,
}

impl ProductQuery {
    fn filter(&self) -> Result<ProductFilter, AppError> {
        let filled = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let category = filled(&self.category)
            .map(|c| {
                c.parse::<i32>()
                    .map(CategoryId::new)
                    .map_err(|_| AppError::BadRequest("invalid category filter".to_owned()))
            })
            .transpose()?;

        Ok(ProductFilter {
            search: filled(&self.search),
            category,
            is_active: filled(&self.status).map(|s| s == "active"),
        })
    }

    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1),
        }
    }
}

/// Raw multipart fields before validation.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub categories_id: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub is_active: Option<String>,
    pub image: Option<UploadedImage>,
}

/// An uploaded file.
#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl ProductForm {
    /// Collect the known fields; unknown fields are ignored.
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // An empty file input still sends a part
                if !bytes.is_empty() {
                    form.image = Some(UploadedImage { file_name, bytes });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            match name.as_str() {
                "name" => form.name = Some(text),
                "categories_id" => form.categories_id = Some(text),
                "description" => form.description = Some(text),
                "price" => form.price = Some(text),
                "is_active" => form.is_active = Some(text),
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Validated product form.
#[derive(Debug)]
struct ValidProduct {
    input: ProductInput,
    image: Option<(ImageKind, Bytes)>,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Check the fields. Category existence is checked against the database later.
fn validate_product(form: &ProductForm, image_required: bool) -> Result<ValidProduct, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let text = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_owned();

    let name = text(&form.name);
    if name.is_empty() {
        errors.add("name", "The name field is required.");
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("The name field must not be greater than {MAX_NAME_LENGTH} characters."),
        );
    }

    let raw_category = text(&form.categories_id);
    let categories_id = if raw_category.is_empty() {
        errors.add("categories_id", "The categories id field is required.");
        None
    } else if let Ok(id) = raw_category.parse::<i32>() {
        Some(CategoryId::new(id))
    } else {
        errors.add("categories_id", "The selected categories id is invalid.");
        None
    };

    let description = text(&form.description);
    if description.is_empty() {
        errors.add("description", "The description field is required.");
    }

    let raw_price = text(&form.price);
    let price = if raw_price.is_empty() {
        errors.add("price", "The price field is required.");
        None
    } else {
        match raw_price.parse::<Decimal>() {
            Ok(price) if price < Decimal::ZERO => {
                errors.add("price", "The price field must be at least 0.");
                None
            }
            Ok(price) if price.normalize().scale() > MONEY_SCALE => {
                errors.add("price", "The price field must have 0-2 decimal places.");
                None
            }
            Ok(price) if price > MAX_AMOUNT => {
                errors.add(
                    "price",
                    format!("The price field must not be greater than {MAX_AMOUNT}."),
                );
                None
            }
            Ok(price) => Some(price),
            Err(_) => {
                errors.add("price", "The price field must be a number.");
                None
            }
        }
    };

    let is_active = match form.is_active.as_deref() {
        None => true,
        Some(raw) => parse_bool(raw).unwrap_or_else(|| {
            errors.add("is_active", "The is active field must be true or false.");
            true
        }),
    };

    let image = match &form.image {
        None => {
            if image_required {
                errors.add("image", "The image field is required.");
            }
            None
        }
        Some(upload) => match validate_upload(upload.file_name.as_deref(), &upload.bytes) {
            Ok(kind) => Some((kind, upload.bytes.clone())),
            Err(e) => {
                errors.add("image", e.to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    match (categories_id, price) {
        (Some(categories_id), Some(price)) => Ok(ValidProduct {
            input: ProductInput {
                categories_id,
                name,
                description,
                price,
                is_active,
            },
            image,
        }),
        _ => Err(errors),
    }
}

async fn ensure_category_exists(state: &AppState, id: CategoryId) -> Result<(), AppError> {
    if CategoryRepository::new(state.pool()).get_by_id(id).await?.is_none() {
        return Err(AppError::field(
            "categories_id",
            "The selected categories id is invalid.",
        ));
    }
    Ok(())
}

// =============================================================================
// Responses
// =============================================================================

/// Product list page.
#[derive(Debug, Serialize)]
pub struct ProductIndex {
    pub products: Page<ProductView>,
    pub categories: Vec<Category>,
    pub filters: ProductQuery,
}

/// Data for the create form.
#[derive(Debug, Serialize)]
pub struct ProductCreateData {
    pub categories: Vec<Category>,
}

/// Data for the edit form.
#[derive(Debug, Serialize)]
pub struct ProductEditData {
    pub product: ProductView,
    pub categories: Vec<Category>,
}

/// Response carrying the saved product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: ProductView,
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Filtered, paginated product list with every category for the filter menu.
#[instrument(skip(_owner, state))]
pub async fn index(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductIndex>, AppError> {
    let filter = query.filter()?;
    let request = query.page_request();

    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, PER_PAGE, request.offset(PER_PAGE))
        .await?;
    let categories = CategoryRepository::new(state.pool()).list_all().await?;

    Ok(Json(ProductIndex {
        products: Page::new(products, request, PER_PAGE, total).map(ProductView::from),
        categories,
        filters: query,
    }))
}

/// Active categories for the create form.
pub async fn create(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<ProductCreateData>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list_active().await?;
    Ok(Json(ProductCreateData { categories }))
}

/// A product and the active categories for the edit form.
pub async fn edit(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductEditData>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Produk tidak ditemukan".to_owned()))?;
    let categories = CategoryRepository::new(state.pool()).list_active().await?;

    Ok(Json(ProductEditData {
        product: product.into(),
        categories,
    }))
}

/// Create a product with its image.
#[instrument(skip(_owner, state, multipart))]
pub async fn store(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let form = ProductForm::from_multipart(multipart).await?;
    let valid = validate_product(&form, true).map_err(AppError::Validation)?;
    ensure_category_exists(&state, valid.input.categories_id).await?;

    let Some((kind, bytes)) = valid.image else {
        return Err(AppError::field("image", "The image field is required."));
    };
    let image_url = state
        .images()
        .store_product_image(kind, &bytes)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let product = match ProductRepository::new(state.pool())
        .create(&valid.input, &image_url)
        .await
    {
        Ok(product) => product,
        Err(e) => {
            state.images().delete_quietly(&image_url).await;
            return Err(category_conflict(e));
        }
    };
    tracing::info!(product_id = %product.id, "Product created");

    Ok(Json(ProductResponse {
        success: true,
        product: product.into(),
        message: "Produk berhasil ditambahkan",
    }))
}

/// Update a product; a new image replaces and deletes the old file.
#[instrument(skip(_owner, state, multipart))]
pub async fn update(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Produk tidak ditemukan".to_owned()))?;

    let form = ProductForm::from_multipart(multipart).await?;
    let valid = validate_product(&form, false).map_err(AppError::Validation)?;
    ensure_category_exists(&state, valid.input.categories_id).await?;

    let new_image = match &valid.image {
        Some((kind, bytes)) => Some(
            state
                .images()
                .store_product_image(*kind, bytes)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?,
        ),
        None => None,
    };

    let product = match repo.update(id, &valid.input, new_image.as_deref()).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(path) = &new_image {
                state.images().delete_quietly(path).await;
            }
            return Err(category_conflict(e));
        }
    };

    if new_image.is_some() && existing.image_url != product.image_url {
        state.images().delete_quietly(&existing.image_url).await;
    }

    Ok(Json(ProductResponse {
        success: true,
        product: product.into(),
        message: "Produk berhasil diperbarui",
    }))
}

/// Delete a product that was never sold, along with its image.
#[instrument(skip(_owner, state))]
pub async fn destroy(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ActionResponse>, AppError> {
    match ProductRepository::new(state.pool()).delete(id).await {
        Ok(image_url) => {
            state.images().delete_quietly(&image_url).await;
            tracing::info!(product_id = %id, "Product deleted");
            Ok(Json(ActionResponse::ok("Produk berhasil dihapus")))
        }
        Err(RepositoryError::Conflict(_)) => Err(AppError::Conflict(
            "Produk tidak dapat dihapus karena sudah ada di pesanan. Nonaktifkan saja.".to_owned(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Flip the active flag.
#[instrument(skip(_owner, state))]
pub async fn toggle_status(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ToggleResponse>, AppError> {
    let product = ProductRepository::new(state.pool()).toggle_status(id).await?;

    Ok(Json(ToggleResponse {
        success: true,
        is_active: product.is_active,
        message: if product.is_active {
            "Produk diaktifkan"
        } else {
            "Produk dinonaktifkan"
        },
    }))
}

/// A category removed between the existence check and the write.
fn category_conflict(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::Conflict(_) => {
            AppError::field("categories_id", "The selected categories id is invalid.")
        }
        other => other.into(),
    }
}
