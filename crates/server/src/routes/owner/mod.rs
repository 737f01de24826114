//! Owner back office: dashboard, catalog and order management.
//!
//! Every handler requires the owner role through `RequireOwner`.

pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};
use serde::Serialize;

use crate::services::images::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Room for the form fields next to the largest accepted image.
const PRODUCT_FORM_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// `{success, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub(crate) fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// `{success, is_active, message}` after flipping an active flag.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub is_active: bool,
    pub message: &'static str,
}

/// Create the owner routes router, mounted at `/dashboard/owner`.
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        // Products
        .route(
            "/products",
            get(products::index)
                .post(products::store)
                .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT)),
        )
        .route("/products/create", get(products::create))
        .route(
            "/products/{id}",
            put(products::update)
                .post(products::update)
                .delete(products::destroy)
                .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT)),
        )
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/toggle-status", patch(products::toggle_status))
        // Categories
        .route(
            "/categories",
            get(categories::index).post(categories::store),
        )
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::destroy),
        )
        .route(
            "/categories/{id}/toggle-status",
            patch(categories::toggle_status),
        )
        // Orders
        .route("/orders", get(orders::index))
        .route("/orders/bulk-resend-wa", post(orders::bulk_resend_whatsapp))
        .route("/orders/{id}", get(orders::show))
        .route(
            "/orders/{id}/payment-status",
            patch(orders::update_payment_status),
        )
        .route("/orders/{id}/resend-wa", post(orders::resend_whatsapp))
}
