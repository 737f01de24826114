//! Order management and WhatsApp resends.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use jamur_pos_core::{NotificationStatus, OrderId, PaymentStatus};

use crate::db::{OrderFilter, OrderRepository};
use crate::error::{AppError, ValidationErrors};
use crate::middleware::{JsonBody, RequireOwner};
use crate::models::{OrderDetails, Page, PageRequest};
use crate::services::NotificationService;
use crate::services::reports::local_midnight;
use crate::state::AppState;

const PER_PAGE: i64 = 15;

/// `GET /orders` query string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderQuery {
    pub payment_status: Option<String>,
    pub wa_status: Option<String>,
    /// Local date, inclusive.
    pub date_from: Option<String>,
    /// Local date, inclusive.
    pub date_to: Option<String>,
    pub search: Option<String>,
    #[serde(default, skip_serializing)]
    pub page: Option<i64>,
}

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl OrderQuery {
    /// Turn the query into a repository filter; dates are local to `offset`.
    fn filter(&self, offset: FixedOffset) -> Result<OrderFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let payment_status = filled(self.payment_status.as_deref()).and_then(|raw| {
            raw.parse::<PaymentStatus>()
                .map_err(|_| errors.add("payment_status", "The selected payment status is invalid."))
                .ok()
        });
        let wa_status = filled(self.wa_status.as_deref()).and_then(|raw| {
            raw.parse::<NotificationStatus>()
                .map_err(|_| errors.add("wa_status", "The selected wa status is invalid."))
                .ok()
        });

        let mut date = |field: &str, raw: Option<&str>| {
            filled(raw).and_then(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| {
                        errors.add(field, format!("The {} field must be a valid date.", field.replace('_', " ")));
                    })
                    .ok()
            })
        };
        let date_from = date("date_from", self.date_from.as_deref());
        let date_to = date("date_to", self.date_to.as_deref());

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(OrderFilter {
            payment_status,
            wa_status,
            created_from: date_from.map(|d| local_midnight(d, offset)),
            created_before: date_to
                .and_then(|d| d.checked_add_days(Days::new(1)))
                .map(|d| local_midnight(d, offset)),
            search: filled(self.search.as_deref()).map(str::to_owned),
        })
    }

    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1),
        }
    }
}

/// Order list page.
#[derive(Debug, Serialize)]
pub struct OrderIndex {
    pub orders: Page<OrderDetails>,
    pub filters: OrderQuery,
}

/// `PATCH /orders/{id}/payment-status` body.
///
/// Kept as raw JSON so a non-string status is reported on the field.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentStatusForm {
    pub payment_status: Option<serde_json::Value>,
}

impl PaymentStatusForm {
    /// The requested status.
    fn status(&self) -> Result<PaymentStatus, AppError> {
        let raw = match &self.payment_status {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(raw)) => filled(Some(raw.as_str())),
            Some(_) => {
                return Err(AppError::field(
                    "payment_status",
                    "The selected payment status is invalid.",
                ));
            }
        };

        raw.ok_or_else(|| {
            AppError::field("payment_status", "The payment status field is required.")
        })?
        .parse::<PaymentStatus>()
        .map_err(|_| AppError::field("payment_status", "The selected payment status is invalid."))
    }
}

/// Response after a payment status change.
#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub message: &'static str,
    pub payment_status: PaymentStatus,
}

/// Response after a single resend.
#[derive(Debug, Serialize)]
pub struct ResendResponse {
    pub success: bool,
    pub message: String,
    pub wa_status: NotificationStatus,
}

/// Response after a bulk resend.
#[derive(Debug, Serialize)]
pub struct BulkResendResponse {
    pub success: bool,
    pub message: String,
    pub sent: usize,
    pub failed: usize,
}

/// Filtered orders, newest first, with customer, cashier and items.
#[instrument(skip(_owner, state))]
pub async fn index(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<OrderIndex>, AppError> {
    let filter = query
        .filter(state.config().store.utc_offset)
        .map_err(AppError::Validation)?;
    let request = query.page_request();

    let (orders, total) = OrderRepository::new(state.pool())
        .list(&filter, PER_PAGE, request.offset(PER_PAGE))
        .await?;

    Ok(Json(OrderIndex {
        orders: Page::new(orders, request, PER_PAGE, total),
        filters: query,
    }))
}

/// One order with customer, cashier and items.
#[instrument(skip(_owner, state))]
pub async fn show(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetails>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get_details(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pesanan tidak ditemukan".to_owned()))?;

    Ok(Json(order))
}

/// Change the payment status.
#[instrument(skip(_owner, state, form))]
pub async fn update_payment_status(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    JsonBody(form): JsonBody<PaymentStatusForm>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let status = form.status()?;

    let order = OrderRepository::new(state.pool())
        .update_payment_status(id, status)
        .await?;
    tracing::info!(order_id = %id, payment_status = %order.payment_status, "Payment status updated");

    Ok(Json(PaymentStatusResponse {
        success: true,
        message: "Status pembayaran berhasil diperbarui",
        payment_status: order.payment_status,
    }))
}

/// Re-render and resend one order's notification.
#[instrument(skip(_owner, state))]
pub async fn resend_whatsapp(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<ResendResponse>, AppError> {
    let config = state.config();
    let report = NotificationService::new(state.pool(), state.fonnte(), &config.store)
        .notify_order(id)
        .await?;

    Ok(Json(ResendResponse {
        success: report.status.is_sent(),
        message: report.message,
        wa_status: report.status,
    }))
}

/// Resend every failed notification, one at a time.
#[instrument(skip(_owner, state))]
pub async fn bulk_resend_whatsapp(
    RequireOwner(_owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<BulkResendResponse>, AppError> {
    let config = state.config();
    let summary = NotificationService::new(state.pool(), state.fonnte(), &config.store)
        .resend_failed()
        .await?;

    Ok(Json(BulkResendResponse {
        success: true,
        message: summary.message(),
        sent: summary.sent,
        failed: summary.failed,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn test_filter_dates_are_local_and_inclusive() {
        let query = OrderQuery {
            date_from: Some("2026-03-01".to_string()),
            date_to: Some("2026-03-05".to_string()),
            ..OrderQuery::default()
        };
        let filter = query.filter(wib()).unwrap();

        assert_eq!(
            filter.created_from,
            Some(Utc.with_ymd_and_hms(2026, 2, 28, 17, 0, 0).unwrap())
        );
        assert_eq!(
            filter.created_before,
            Some(Utc.with_ymd_and_hms(2026, 3, 5, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_filter_statuses() {
        let query = OrderQuery {
            payment_status: Some("UNPAID".to_string()),
            wa_status: Some("FAILED".to_string()),
            search: Some(" 0812 ".to_string()),
            ..OrderQuery::default()
        };
        let filter = query.filter(wib()).unwrap();

        assert_eq!(filter.payment_status, Some(PaymentStatus::Unpaid));
        assert_eq!(filter.wa_status, Some(NotificationStatus::Failed));
        assert_eq!(filter.search.as_deref(), Some("0812"));
    }

    #[test]
    fn test_filter_rejects_bad_values() {
        let query = OrderQuery {
            payment_status: Some("LUNAS".to_string()),
            date_to: Some("05/03/2026".to_string()),
            ..OrderQuery::default()
        };
        let errors = query.filter(wib()).unwrap_err();

        assert!(errors.get("payment_status").is_some());
        assert!(errors.get("date_to").is_some());
    }

    #[test]
    fn test_empty_filter() {
        let filter = OrderQuery::default().filter(wib()).unwrap();
        assert!(filter.payment_status.is_none());
        assert!(filter.created_from.is_none());
        assert!(filter.search.is_none());
    }

    fn status_of(body: serde_json::Value) -> Result<PaymentStatus, AppError> {
        serde_json::from_value::<PaymentStatusForm>(body).unwrap().status()
    }

    fn payment_error(result: Result<PaymentStatus, AppError>) -> String {
        match result {
            Err(AppError::Validation(errors)) => errors.get("payment_status").unwrap()[0].clone(),
            other => panic!("expected a payment_status error, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_status_form() {
        assert_eq!(
            status_of(serde_json::json!({"payment_status": " PAID "})).unwrap(),
            PaymentStatus::Paid
        );
        assert_eq!(
            payment_error(status_of(serde_json::json!({}))),
            "The payment status field is required."
        );
        assert_eq!(
            payment_error(status_of(serde_json::json!({"payment_status": "  "}))),
            "The payment status field is required."
        );
        for bad in [serde_json::json!("REFUNDED"), serde_json::json!(1), serde_json::json!(true)] {
            assert_eq!(
                payment_error(status_of(serde_json::json!({"payment_status": bad}))),
                "The selected payment status is invalid."
            );
        }
    }
}
