//! Register screen data and order intake.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::AppError;
use crate::middleware::{JsonBody, RequireStaff};
use crate::models::{Category, ProductView};
use crate::services::{CheckoutOutcome, CheckoutRequest, OrderIntakeService};
use crate::state::AppState;

/// Catalog shown on the register.
#[derive(Debug, Serialize)]
pub struct RegisterCatalog {
    pub categories: Vec<Category>,
    pub products: Vec<ProductView>,
}

/// Active categories and active products, ordered by name.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn index(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<RegisterCatalog>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list_active().await?;
    let products = ProductRepository::new(state.pool())
        .list_active()
        .await?
        .into_iter()
        .map(ProductView::from)
        .collect();

    Ok(Json(RegisterCatalog {
        categories,
        products,
    }))
}

/// Place an order from the register cart and notify the customer.
#[instrument(skip(user, state, request), fields(user_id = %user.id))]
pub async fn store_order(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<Json<CheckoutOutcome>, AppError> {
    let config = state.config();
    let outcome = OrderIntakeService::new(state.pool(), state.fonnte(), &config.store)
        .checkout(user.id, &request)
        .await?;

    Ok(Json(outcome))
}
