//! Category management.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use jamur_pos_core::CategoryId;

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, ValidationErrors};
use crate::middleware::{JsonBody, RequireOwner};
use crate::models::{Category, CategoryWithCount};
use crate::state::AppState;

use super::{ActionResponse, ToggleResponse};

const MAX_NAME_LENGTH: usize = 100;

/// Create/update payload.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Response carrying the saved category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub success: bool,
    pub category: Category,
    pub message: &'static str,
}

/// Trimmed, length-checked category name.
fn validate_name(form: &CategoryForm) -> Result<String, ValidationErrors> {
    let name = form.name.as_deref().map(str::trim).unwrap_or_default();

    if name.is_empty() {
        return Err(ValidationErrors::single(
            "name",
            "The name field is required.",
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationErrors::single(
            "name",
            format!("The name field must not be greater than {MAX_NAME_LENGTH} characters."),
        ));
    }
    Ok(name.to_owned())
}

/// All categories with their product counts.
#[instrument(skip(_owner, state))]
pub async fn index(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithCount>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list_with_counts().await?;
    Ok(Json(categories))
}

/// Create a category; active unless told otherwise.
#[instrument(skip(_owner, state, form))]
pub async fn store(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = validate_name(&form).map_err(AppError::Validation)?;

    let category = CategoryRepository::new(state.pool())
        .create(&name, form.is_active.unwrap_or(true))
        .await?;
    tracing::info!(category_id = %category.id, "Category created");

    Ok(Json(CategoryResponse {
        success: true,
        category,
        message: "Kategori berhasil ditambahkan",
    }))
}

/// Rename a category; `is_active` keeps its value when omitted.
#[instrument(skip(_owner, state, form))]
pub async fn update(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = validate_name(&form).map_err(AppError::Validation)?;

    let category = CategoryRepository::new(state.pool())
        .update(id, &name, form.is_active)
        .await?;

    Ok(Json(CategoryResponse {
        success: true,
        category,
        message: "Kategori berhasil diperbarui",
    }))
}

/// Delete a category that has no products.
#[instrument(skip(_owner, state))]
pub async fn destroy(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<ActionResponse>, AppError> {
    match CategoryRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            Ok(Json(ActionResponse::ok("Kategori berhasil dihapus")))
        }
        Err(RepositoryError::Conflict(_)) => Err(AppError::Conflict(
            "Kategori tidak dapat dihapus karena masih memiliki produk".to_owned(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Flip the active flag.
#[instrument(skip(_owner, state))]
pub async fn toggle_status(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<ToggleResponse>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .toggle_status(id)
        .await?;

    Ok(Json(ToggleResponse {
        success: true,
        is_active: category.is_active,
        message: if category.is_active {
            "Kategori diaktifkan"
        } else {
            "Kategori dinonaktifkan"
        },
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: Option<&str>) -> CategoryForm {
        CategoryForm {
            name: name.map(str::to_string),
            is_active: None,
        }
    }

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name(&form(Some("  Balado "))).unwrap(), "Balado");
    }

    #[test]
    fn test_validate_name_required() {
        let errors = validate_name(&form(None)).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), ["The name field is required."]);
        assert!(validate_name(&form(Some("   "))).is_err());
    }

    #[test]
    fn test_validate_name_max_length() {
        assert!(validate_name(&form(Some(&"a".repeat(100)))).is_ok());
        assert!(validate_name(&form(Some(&"a".repeat(101)))).is_err());
    }
}
