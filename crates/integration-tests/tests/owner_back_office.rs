//! Integration tests for the owner back office.
//!
//! These tests require a running server seeded with `jamur-pos seed demo`
//! and a writable `STORAGE_DIR`.
//!
//! Run with: cargo test -p jamur-pos-integration-tests -- --ignored

use jamur_pos_integration_tests::{OWNER_EMAIL, PNG_BYTES, json_body, login_as, unique_name, url};
use reqwest::{Client, StatusCode, multipart};
use serde_json::{Value, json};

async fn create_category(owner: &Client, name: &str) -> Value {
    let resp = owner
        .post(url("/dashboard/owner/categories"))
        .json(&json!({"name": name}))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["message"], "Kategori berhasil ditambahkan");
    body["category"].clone()
}

fn product_form(name: &str, category_id: &Value) -> multipart::Form {
    multipart::Form::new()
        .text("name", name.to_string())
        .text("categories_id", category_id.to_string())
        .text("description", "Jamur tiram goreng renyah")
        .text("price", "18000")
        .part(
            "image",
            multipart::Part::bytes(PNG_BYTES)
                .file_name("jamur.png")
                .mime_str("image/png")
                .expect("mime"),
        )
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_dashboard_stats_shape() {
    let owner = login_as(OWNER_EMAIL).await;
    let resp = owner.get(url("/dashboard/owner")).send().await.expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;

    assert!(body["todaySales"].is_string());
    assert!(body["todayOrders"].is_number());
    assert!(body["pendingPayments"].is_number());
    assert!(body["failedWa"].is_number());
    assert_eq!(body["revenueChart"].as_array().expect("chart").len(), 7);
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_category_lifecycle() {
    let owner = login_as(OWNER_EMAIL).await;
    let name = unique_name("Kategori");
    let category = create_category(&owner, &name).await;
    let id = &category["id"];
    assert_eq!(category["is_active"], true);

    // Blank names are rejected
    let resp = owner
        .post(url("/dashboard/owner/categories"))
        .json(&json!({"name": "   "}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = owner
        .patch(url(&format!("/dashboard/owner/categories/{id}/toggle-status")))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["is_active"], false);
    assert_eq!(body["message"], "Kategori dinonaktifkan");

    let renamed = unique_name("Kategori Baru");
    let resp = owner
        .put(url(&format!("/dashboard/owner/categories/{id}")))
        .json(&json!({"name": renamed, "is_active": true}))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["category"]["name"], renamed.as_str());

    let resp = owner
        .delete(url(&format!("/dashboard/owner/categories/{id}")))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["message"], "Kategori berhasil dihapus");
}

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_category_with_products_cannot_be_deleted() {
    let owner = login_as(OWNER_EMAIL).await;
    let category = create_category(&owner, &unique_name("Kategori")).await;
    let id = &category["id"];

    let resp = owner
        .post(url("/dashboard/owner/products"))
        .multipart(product_form(&unique_name("Jamur"), id))
        .send()
        .await
        .expect("request failed");
    let product = json_body(resp, StatusCode::OK).await;

    let resp = owner
        .delete(url(&format!("/dashboard/owner/categories/{id}")))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(
        body["message"],
        "Kategori tidak dapat dihapus karena masih memiliki produk"
    );

    // Clean up: the product was never ordered, so it can go
    let product_id = product["product"]["id"].as_str().expect("product id");
    let resp = owner
        .delete(url(&format!("/dashboard/owner/products/{product_id}")))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_product_lifecycle() {
    let owner = login_as(OWNER_EMAIL).await;
    let category = create_category(&owner, &unique_name("Kategori")).await;
    let name = unique_name("Jamur Crispy");

    let resp = owner
        .post(url("/dashboard/owner/products"))
        .multipart(product_form(&name, &category["id"]))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    let product = &body["product"];
    let id = product["id"].as_str().expect("product id").to_string();
    assert_eq!(product["is_active"], true);

    // The stored image is served back
    let image_src = product["image_src"].as_str().expect("image_src");
    let resp = owner.get(url(image_src)).send().await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // Search finds it
    let resp = owner
        .get(url("/dashboard/owner/products"))
        .query(&[("search", name.as_str())])
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["products"]["total"], 1);

    // Update without a new image keeps the old one
    let resp = owner
        .put(url(&format!("/dashboard/owner/products/{id}")))
        .multipart(
            multipart::Form::new()
                .text("name", name.clone())
                .text("categories_id", category["id"].to_string())
                .text("description", "Lebih pedas")
                .text("price", "19500")
                .text("is_active", "1"),
        )
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["product"]["image_src"], image_src);
    assert_eq!(body["product"]["description"], "Lebih pedas");

    let resp = owner
        .patch(url(&format!("/dashboard/owner/products/{id}/toggle-status")))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["is_active"], false);

    let resp = owner
        .delete(url(&format!("/dashboard/owner/products/{id}")))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["message"], "Produk berhasil dihapus");
}

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_product_requires_image_on_create() {
    let owner = login_as(OWNER_EMAIL).await;
    let category = create_category(&owner, &unique_name("Kategori")).await;

    let resp = owner
        .post(url("/dashboard/owner/products"))
        .multipart(
            multipart::Form::new()
                .text("name", unique_name("Jamur"))
                .text("categories_id", category["id"].to_string())
                .text("description", "Tanpa gambar")
                .text("price", "15000"),
        )
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(body["errors"]["image"][0], "The image field is required.");
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_order_filters_and_payment_status() {
    let owner = login_as(OWNER_EMAIL).await;

    let resp = owner
        .get(url("/dashboard/owner/orders"))
        .query(&[("payment_status", "UNPAID")])
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    let orders = body["orders"]["data"].as_array().expect("orders");
    assert!(orders.iter().all(|o| o["payment_status"] == "UNPAID"));
    assert_eq!(body["filters"]["payment_status"], "UNPAID");

    let Some(order) = orders.first() else {
        return;
    };
    let id = order["id"].as_str().expect("order id");

    let resp = owner
        .patch(url(&format!("/dashboard/owner/orders/{id}/payment-status")))
        .json(&json!({"payment_status": "PAID"}))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;
    assert_eq!(body["payment_status"], "PAID");
}

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_order_filter_rejects_bad_status() {
    let owner = login_as(OWNER_EMAIL).await;
    let resp = owner
        .get(url("/dashboard/owner/orders"))
        .query(&[("wa_status", "TERKIRIM")])
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert!(body["errors"]["wa_status"].is_array());
}

#[tokio::test]
#[ignore = "Requires running POS server and FONNTE_TOKEN unset"]
async fn test_bulk_resend_reports_counts() {
    let owner = login_as(OWNER_EMAIL).await;
    let resp = owner
        .post(url("/dashboard/owner/orders/bulk-resend-wa"))
        .send()
        .await
        .expect("request failed");
    let body = json_body(resp, StatusCode::OK).await;

    // Without a token nothing can be delivered
    assert_eq!(body["sent"], 0);
    assert!(body["message"].is_string());
}

#[tokio::test]
#[ignore = "Requires running POS server"]
async fn test_unknown_order_is_not_found() {
    let owner = login_as(OWNER_EMAIL).await;
    let resp = owner
        .get(url(&format!("/dashboard/owner/orders/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
