//! Order intake: turn a register cart into a persisted order and notify the customer.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use jamur_pos_core::{
    MAX_AMOUNT, MAX_SHIPPING, NotificationStatus, OrderId, OrderTotals, PaymentStatus, ProductId,
    UserId, line_subtotal,
};

use crate::config::StoreConfig;
use crate::db::{NewOrder, NewOrderLine, OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, ValidationErrors};
use crate::whatsapp::{DeliveryReport, FonnteClient};

use super::NotificationService;

const MAX_TEXT_LENGTH: usize = 255;

/// Decimal places stored for money columns.
const MONEY_SCALE: u32 = 2;

const TOTAL_TOO_LARGE: &str = "The order total is too large.";

/// Checkout payload posted by the register.
///
/// Fields are kept as raw JSON so that wrong types come back as field
/// errors from [`validate_checkout`] instead of a body rejection. Numbers
/// may be sent as numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: Option<Value>,
    pub customer_phone: Option<Value>,
    pub customer_address: Option<Value>,
    pub shiping_cost: Option<Value>,
    pub notes: Option<Value>,
    /// Array of `{product_id, price, quantity}` objects.
    pub cart_items: Option<Value>,
    pub is_direct_order: Option<Value>,
}

impl CheckoutRequest {
    /// Number of cart lines sent.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.cart_items
            .as_ref()
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub success: bool,
    pub message: String,
    pub order_id: OrderId,
    pub wa_status: NotificationStatus,
    pub wa_message: String,
}

impl CheckoutOutcome {
    fn new(order_id: OrderId, report: DeliveryReport) -> Self {
        Self {
            success: true,
            message: "Order berhasil dibuat".to_owned(),
            order_id,
            wa_status: report.status,
            wa_message: report.message,
        }
    }
}

/// Errors from order intake.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The payload failed validation; nothing was written.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The write failed and was rolled back.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<IntakeError> for AppError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::Validation(errors) => Self::Validation(errors),
            IntakeError::Repository(RepositoryError::Conflict(_)) => Self::field(
                "cart_items",
                "One of the selected products no longer exists.",
            ),
            IntakeError::Repository(other) => Self::Database(other),
        }
    }
}

/// Treat `null` and blank strings as absent, the way form input is read.
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

/// A JSON number or numeric string as a `Decimal`.
fn numeric(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    raw.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&raw).ok())
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&Value>,
) -> String {
    match present(value) {
        None => {
            errors.add(field, format!("The {label} field is required."));
            String::new()
        }
        Some(Value::String(raw)) => {
            let text = raw.trim();
            if text.chars().count() > MAX_TEXT_LENGTH {
                errors.add(
                    field,
                    format!("The {label} field must not be greater than {MAX_TEXT_LENGTH} characters."),
                );
            }
            text.to_owned()
        }
        Some(_) => {
            errors.add(field, format!("The {label} field must be a string."));
            String::new()
        }
    }
}

fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&Value>,
) -> Option<String> {
    match present(value) {
        None => None,
        Some(Value::String(raw)) => Some(raw.trim().to_owned()),
        Some(_) => {
            errors.add(field, format!("The {label} field must be a string."));
            None
        }
    }
}

/// Non-negative amount with at most two decimals, no larger than `max`.
fn money_field(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&Value>,
    max: Decimal,
) -> Option<Decimal> {
    let Some(value) = present(value) else {
        errors.add(field, format!("The {label} field is required."));
        return None;
    };

    let message = match numeric(value) {
        None => format!("The {label} field must be a number."),
        Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            format!("The {label} field must be at least 0.")
        }
        Some(amount) if amount.normalize().scale() > MONEY_SCALE => {
            format!("The {label} field must have 0-2 decimal places.")
        }
        Some(amount) if amount > max => {
            format!("The {label} field must not be greater than {max}.")
        }
        Some(amount) => return Some(amount),
    };
    errors.add(field, message);
    None
}

fn quantity_field(errors: &mut ValidationErrors, field: &str, value: Option<&Value>) -> Option<u32> {
    let Some(value) = present(value) else {
        errors.add(field, "The quantity field is required.");
        return None;
    };

    let message = match numeric(value) {
        Some(quantity) if quantity.fract().is_zero() => {
            if quantity < Decimal::ONE {
                "The quantity field must be at least 1."
            } else if let Some(quantity) = quantity.to_u32() {
                return Some(quantity);
            } else {
                "The quantity field is too large."
            }
        }
        _ => "The quantity field must be an integer.",
    };
    errors.add(field, message);
    None
}

/// Accepts `true`, `false`, `0`, `1`, `"0"` and `"1"`; absent means `false`.
fn flag(errors: &mut ValidationErrors, field: &str, label: &str, value: Option<&Value>) -> bool {
    let parsed = match present(value) {
        None => Some(false),
        Some(Value::Bool(value)) => Some(*value),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        Some(_) => None,
    };

    parsed.unwrap_or_else(|| {
        errors.add(field, format!("The {label} field must be true or false."));
        false
    })
}

/// Validate the payload shape and build the order to write.
///
/// Product existence is checked separately against the database.
///
/// # Errors
///
/// Returns every field error found, keyed like `cart_items.0.quantity`.
/// Amounts whose line or order total would not fit the money columns are
/// reported on `cart_items`.
pub fn validate_checkout(
    request: &CheckoutRequest,
    cashier: UserId,
) -> Result<NewOrder, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let customer_name = required_text(
        &mut errors,
        "customer_name",
        "customer name",
        request.customer_name.as_ref(),
    );
    let customer_phone = required_text(
        &mut errors,
        "customer_phone",
        "customer phone",
        request.customer_phone.as_ref(),
    );
    let customer_address = optional_text(
        &mut errors,
        "customer_address",
        "customer address",
        request.customer_address.as_ref(),
    );
    let notes = optional_text(&mut errors, "notes", "notes", request.notes.as_ref());
    let shiping_cost = money_field(
        &mut errors,
        "shiping_cost",
        "shiping cost",
        request.shiping_cost.as_ref(),
        MAX_SHIPPING,
    );
    let is_direct_order = flag(
        &mut errors,
        "is_direct_order",
        "is direct order",
        request.is_direct_order.as_ref(),
    );

    let items: &[Value] = match present(request.cart_items.as_ref()) {
        Some(Value::Array(items)) if !items.is_empty() => items.as_slice(),
        None | Some(Value::Array(_)) => {
            errors.add("cart_items", "The cart items field is required.");
            &[]
        }
        Some(_) => {
            errors.add("cart_items", "The cart items field must be an array.");
            &[]
        }
    };

    let mut lines = Vec::with_capacity(items.len());
    let mut too_large = false;
    for (index, item) in items.iter().enumerate() {
        let field = |name: &str| format!("cart_items.{index}.{name}");

        let product_id = match present(item.get("product_id")) {
            None => {
                errors.add(&field("product_id"), "The product field is required.");
                None
            }
            Some(raw) => match raw.as_str().map(|s| s.trim().parse::<ProductId>()) {
                Some(Ok(id)) => Some(id),
                _ => {
                    errors.add(&field("product_id"), "The product must be a valid UUID.");
                    None
                }
            },
        };
        let price = money_field(
            &mut errors,
            &field("price"),
            "price",
            item.get("price"),
            MAX_AMOUNT,
        );
        let quantity = quantity_field(&mut errors, &field("quantity"), item.get("quantity"));

        let (Some(price), Some(quantity)) = (price, quantity) else {
            continue;
        };
        let Some(subtotal) = line_subtotal(price, quantity).filter(|s| *s <= MAX_AMOUNT) else {
            too_large = true;
            continue;
        };
        if let Some(product_id) = product_id {
            lines.push(NewOrderLine {
                product_id,
                price,
                quantity,
                subtotal,
            });
        }
    }

    let totals = shiping_cost.and_then(|cost| {
        OrderTotals::compute(lines.iter().map(|line| line.subtotal), cost)
            .filter(OrderTotals::fits_columns)
    });
    if too_large || (shiping_cost.is_some() && totals.is_none()) {
        errors.add("cart_items", TOTAL_TOO_LARGE);
    }

    match totals {
        Some(totals) if errors.is_empty() => Ok(NewOrder {
            users_id: cashier,
            customer_name,
            customer_phone,
            customer_address,
            totals,
            notes,
            payment_status: PaymentStatus::for_checkout(is_direct_order),
            lines,
        }),
        _ => Err(errors),
    }
}

/// Order intake service.
pub struct OrderIntakeService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    notifications: NotificationService<'a>,
}

impl<'a> OrderIntakeService<'a> {
    /// Create a new intake service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, fonnte: &'a FonnteClient, store: &'a StoreConfig) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            notifications: NotificationService::new(pool, fonnte, store),
        }
    }

    /// Validate, persist and notify.
    ///
    /// The order and its lines are committed before the notification is
    /// attempted; a failed send only changes `wa_status` in the outcome.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Validation` for bad input or unknown products.
    /// Returns `IntakeError::Repository` if the write fails.
    #[instrument(skip(self, request), fields(cashier = %cashier, items = request.item_count()))]
    pub async fn checkout(
        &self,
        cashier: UserId,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, IntakeError> {
        let new_order = validate_checkout(request, cashier).map_err(IntakeError::Validation)?;
        self.ensure_products_exist(&new_order).await?;

        let order = self.orders.place(&new_order).await?;
        tracing::info!(
            order_id = %order.id,
            grand_total = %order.grand_total,
            payment_status = %order.payment_status,
            "Order created"
        );

        let report = match self.notifications.notify_order(order.id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Order notification bookkeeping failed");
                DeliveryReport {
                    status: NotificationStatus::Pending,
                    message: "Notification status could not be recorded".to_owned(),
                }
            }
        };

        Ok(CheckoutOutcome::new(order.id, report))
    }

    async fn ensure_products_exist(&self, new_order: &NewOrder) -> Result<(), IntakeError> {
        let ids: Vec<ProductId> = new_order.lines.iter().map(|l| l.product_id).collect();
        let existing = self.products.existing_ids(&ids).await?;

        let mut errors = ValidationErrors::new();
        for (index, id) in ids.iter().enumerate() {
            if !existing.contains(id) {
                errors.add(
                    &format!("cart_items.{index}.product_id"),
                    "The selected product is invalid.",
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IntakeError::Validation(errors))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    const PRODUCT_A: &str = "6f1b7c1e-2f4a-4c8e-9d5b-1a2b3c4d5e6f";
    const PRODUCT_B: &str = "7a2c8d2f-3a5b-4d9f-8e6c-2b3c4d5e6f70";

    fn request(body: Value) -> CheckoutRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid_body() -> Value {
        json!({
            "customer_name": "  Budi Santoso ",
            "customer_phone": "081234567890",
            "customer_address": "   ",
            "shiping_cost": 10000,
            "cart_items": [
                {"product_id": PRODUCT_A, "price": 25000, "quantity": 2},
                {"product_id": PRODUCT_B, "price": 35000, "quantity": 1}
            ]
        })
    }

    fn with(changes: Value) -> CheckoutRequest {
        let mut body = valid_body();
        for (key, value) in changes.as_object().unwrap() {
            body[key] = value.clone();
        }
        request(body)
    }

    fn check(changes: Value) -> Result<NewOrder, ValidationErrors> {
        validate_checkout(&with(changes), UserId::generate())
    }

    #[test]
    fn test_valid_checkout_builds_order() {
        let cashier = UserId::generate();
        let order = validate_checkout(&request(valid_body()), cashier).unwrap();

        assert_eq!(order.users_id, cashier);
        assert_eq!(order.customer_name, "Budi Santoso");
        assert_eq!(order.customer_address, None);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].subtotal, Decimal::from(50_000));

        assert_eq!(order.totals.total_amount, Decimal::from(85_000));
        assert_eq!(order.totals.shiping_cost, Decimal::from(10_000));
        assert_eq!(order.totals.grand_total, Decimal::from(95_000));
    }

    #[test]
    fn test_direct_order_is_paid() {
        for flag in [json!(true), json!(1), json!("1")] {
            let order = check(json!({"is_direct_order": flag})).unwrap();
            assert_eq!(order.payment_status, PaymentStatus::Paid, "{flag}");
        }
        let order = check(json!({"is_direct_order": "0"})).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);

        let errors = check(json!({"is_direct_order": "yes"})).unwrap_err();
        assert!(errors.get("is_direct_order").is_some());
    }

    #[test]
    fn test_empty_cart_rejected() {
        for cart in [json!([]), json!(null)] {
            let errors = check(json!({"cart_items": cart})).unwrap_err();
            assert_eq!(
                errors.get("cart_items").unwrap(),
                ["The cart items field is required."]
            );
        }
    }

    #[test]
    fn test_missing_customer_fields() {
        let errors = check(json!({
            "customer_name": "   ",
            "customer_phone": null,
            "shiping_cost": null
        }))
        .unwrap_err();

        assert!(errors.get("customer_name").is_some());
        assert!(errors.get("customer_phone").is_some());
        assert!(errors.get("shiping_cost").is_some());
    }

    #[test]
    fn test_long_name_rejected() {
        let errors = check(json!({"customer_name": "a".repeat(256)})).unwrap_err();
        assert_eq!(
            errors.get("customer_name").unwrap(),
            ["The customer name field must not be greater than 255 characters."]
        );
    }

    #[test]
    fn test_bad_lines_reported_by_index() {
        let errors = check(json!({
            "cart_items": [
                {"product_id": "not-a-uuid", "price": 25000, "quantity": 1},
                {"product_id": PRODUCT_A, "price": -1, "quantity": 0}
            ]
        }))
        .unwrap_err();

        assert!(errors.get("cart_items.0.product_id").is_some());
        assert!(errors.get("cart_items.1.price").is_some());
        assert!(errors.get("cart_items.1.quantity").is_some());
        assert!(errors.get("cart_items.0.quantity").is_none());
    }

    #[test]
    fn test_negative_shipping_rejected_zero_allowed() {
        assert!(check(json!({"shiping_cost": -500})).is_err());
        assert!(check(json!({"shiping_cost": 0})).is_ok());
    }

    #[test]
    fn test_money_limited_to_two_decimals() {
        let errors = check(json!({
            "shiping_cost": "10.005",
            "cart_items": [{"product_id": PRODUCT_A, "price": "2500.001", "quantity": 1}]
        }))
        .unwrap_err();
        assert!(errors.get("shiping_cost").is_some());
        assert!(errors.get("cart_items.0.price").is_some());

        // Trailing zeros do not count
        let order = check(json!({"shiping_cost": "10.000"})).unwrap();
        assert_eq!(order.totals.shiping_cost, Decimal::new(10_000, 3));
    }

    #[test]
    fn test_zero_price_line_allowed() {
        let order = check(json!({
            "cart_items": [{"product_id": PRODUCT_A, "price": 0, "quantity": 3}]
        }))
        .unwrap();
        assert_eq!(order.totals.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let order = check(json!({
            "shiping_cost": "5000",
            "cart_items": [{"product_id": PRODUCT_A, "price": "12500.50", "quantity": "2"}]
        }))
        .unwrap();

        assert_eq!(order.lines[0].quantity, 2);
        assert_eq!(order.totals.total_amount, Decimal::new(2_500_100, 2));
        assert_eq!(order.totals.grand_total, Decimal::new(3_000_100, 2));
    }

    #[test]
    fn test_wrong_types_become_field_errors() {
        let errors = check(json!({
            "customer_phone": 81_234_567_890_u64,
            "cart_items": [
                {"product_id": 7, "price": "abc", "quantity": 1.5},
                {"product_id": PRODUCT_B, "price": [1], "quantity": {"n": 1}}
            ]
        }))
        .unwrap_err();

        assert_eq!(
            errors.get("customer_phone").unwrap(),
            ["The customer phone field must be a string."]
        );
        assert!(errors.get("cart_items.0.product_id").is_some());
        assert_eq!(
            errors.get("cart_items.0.price").unwrap(),
            ["The price field must be a number."]
        );
        assert_eq!(
            errors.get("cart_items.0.quantity").unwrap(),
            ["The quantity field must be an integer."]
        );
        assert!(errors.get("cart_items.1.price").is_some());
        assert!(errors.get("cart_items.1.quantity").is_some());

        let errors = check(json!({"cart_items": {}})).unwrap_err();
        assert_eq!(
            errors.get("cart_items").unwrap(),
            ["The cart items field must be an array."]
        );
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let errors = check(json!({
            "cart_items": [{
                "product_id": PRODUCT_A,
                "price": "79228162514264337593543950335",
                "quantity": 2
            }]
        }))
        .unwrap_err();
        assert_eq!(
            errors.get("cart_items.0.price").unwrap(),
            ["The price field must not be greater than 9999999999.99."]
        );

        let errors = check(json!({"shiping_cost": "100000000"})).unwrap_err();
        assert_eq!(
            errors.get("shiping_cost").unwrap(),
            ["The shiping cost field must not be greater than 99999999.99."]
        );
    }

    #[test]
    fn test_totals_beyond_money_columns_rejected() {
        // Each price fits; the line subtotal does not
        let errors = check(json!({
            "cart_items": [{"product_id": PRODUCT_A, "price": "9999999999.99", "quantity": 2}]
        }))
        .unwrap_err();
        assert_eq!(errors.get("cart_items").unwrap(), [TOTAL_TOO_LARGE]);

        // Each line fits; the order total does not
        let errors = check(json!({
            "cart_items": [
                {"product_id": PRODUCT_A, "price": "6000000000", "quantity": 1},
                {"product_id": PRODUCT_B, "price": "6000000000", "quantity": 1}
            ]
        }))
        .unwrap_err();
        assert_eq!(errors.get("cart_items").unwrap(), [TOTAL_TOO_LARGE]);

        // Goods at the limit plus shipping overflow the grand total
        let errors = check(json!({
            "shiping_cost": 1,
            "cart_items": [{"product_id": PRODUCT_A, "price": "9999999999.99", "quantity": 1}]
        }))
        .unwrap_err();
        assert_eq!(errors.get("cart_items").unwrap(), [TOTAL_TOO_LARGE]);
    }

    #[test]
    fn test_item_count() {
        assert_eq!(request(valid_body()).item_count(), 2);
        assert_eq!(with(json!({"cart_items": {}})).item_count(), 0);
        assert_eq!(CheckoutRequest::default().item_count(), 0);
    }
}
