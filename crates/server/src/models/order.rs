//! Order, order line and customer models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jamur_pos_core::{
    CustomerId, NotificationStatus, OrderId, OrderItemId, PaymentStatus, ProductId, UserId,
    derive_quantity,
};

/// A customer, keyed by phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub users_id: UserId,
    pub customers_id: CustomerId,
    pub total_amount: Decimal,
    pub shiping_cost: Decimal,
    pub grand_total: Decimal,
    pub payment_status: PaymentStatus,
    pub wa_sent_status: NotificationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product id and name embedded in an order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
}

/// Staff id and name embedded in an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRef {
    pub id: UserId,
    pub name: String,
}

/// A persisted order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub orders_id: OrderId,
    pub products_id: ProductId,
    pub price_at_purchase: Decimal,
    pub subtotal: Decimal,
    pub product: ProductRef,
}

impl OrderItem {
    /// Quantity recovered from the stored price and subtotal.
    #[must_use]
    pub fn quantity(&self) -> i64 {
        derive_quantity(self.subtotal, self.price_at_purchase)
    }
}

/// An order with everything needed to display or notify about it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Customer,
    pub user: StaffRef,
    pub items: Vec<OrderItemView>,
}

/// Order line as exposed over JSON, with the derived quantity.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: OrderItem,
    pub quantity: i64,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        let quantity = item.quantity();
        Self { item, quantity }
    }
}

impl OrderDetails {
    /// Assemble the details from their parts.
    #[must_use]
    pub fn new(order: Order, customer: Customer, user: StaffRef, items: Vec<OrderItem>) -> Self {
        Self {
            order,
            customer,
            user,
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}
