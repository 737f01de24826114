//! HTTP route handlers for the POS server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                             - Liveness
//! GET  /health/ready                       - Readiness (database)
//! GET  /storage/...                        - Uploaded images
//! GET  /                                   - Redirect to /login
//! GET  /login                              - Login page
//! POST /login                              - Login (form or JSON)
//! POST /logout                             - Logout
//!
//! # Register (cashier or owner)
//! GET  /dashboard/pos                      - Active catalog
//! POST /dashboard/pos/orders               - Place an order
//!
//! # Back office (owner)
//! GET  /dashboard/owner                    - Dashboard stats
//! GET  /dashboard/owner/products           - Product list
//! GET  /dashboard/owner/products/create    - Create form data
//! POST /dashboard/owner/products           - Create product (multipart)
//! GET  /dashboard/owner/products/{id}/edit - Edit form data
//! PUT  /dashboard/owner/products/{id}      - Update product (multipart, POST too)
//! DELETE /dashboard/owner/products/{id}    - Delete product
//! PATCH /dashboard/owner/products/{id}/toggle-status
//! GET  /dashboard/owner/categories         - Category list
//! POST /dashboard/owner/categories         - Create category
//! PUT  /dashboard/owner/categories/{id}    - Update category
//! DELETE /dashboard/owner/categories/{id}  - Delete category
//! PATCH /dashboard/owner/categories/{id}/toggle-status
//! GET  /dashboard/owner/orders             - Order list
//! GET  /dashboard/owner/orders/{id}        - Order detail
//! PATCH /dashboard/owner/orders/{id}/payment-status
//! POST /dashboard/owner/orders/{id}/resend-wa
//! POST /dashboard/owner/orders/bulk-resend-wa
//! ```

pub mod auth;
pub mod health;
pub mod owner;
pub mod pos;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::root))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the register routes router, mounted at `/dashboard/pos`.
pub fn pos_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pos::index))
        .route("/orders", post(pos::store_order))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .nest("/dashboard/pos", pos_routes())
        .nest("/dashboard/owner", owner::owner_routes())
}
