//! Order repository: order intake writes, order lookups and status updates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use jamur_pos_core::{
    CustomerId, NotificationStatus, OrderId, OrderItemId, OrderTotals, PaymentStatus, ProductId,
    UserId,
};

use super::RepositoryError;
use crate::models::{Customer, Order, OrderDetails, OrderItem, ProductRef, StaffRef};

const ORDER_COLUMNS: &str = r"
    o.id, o.users_id, o.customers_id, o.total_amount, o.shiping_cost, o.grand_total,
    o.payment_status, o.wa_sent_status, o.notes, o.created_at, o.updated_at
";

const DETAIL_COLUMNS: &str = r"
    cu.name AS customer_name, cu.phone_number AS customer_phone,
    cu.address AS customer_address, cu.created_at AS customer_created_at,
    cu.updated_at AS customer_updated_at, u.name AS cashier_name
";

const DETAIL_JOINS: &str = r"
    JOIN pos.customers cu ON cu.id = o.customers_id
    JOIN pos.users u ON u.id = o.users_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    users_id: Uuid,
    customers_id: Uuid,
    total_amount: Decimal,
    shiping_cost: Decimal,
    grand_total: Decimal,
    payment_status: PaymentStatus,
    wa_sent_status: NotificationStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            users_id: UserId::new(row.users_id),
            customers_id: CustomerId::new(row.customers_id),
            total_amount: row.total_amount,
            shiping_cost: row.shiping_cost,
            grand_total: row.grand_total,
            payment_status: row.payment_status,
            wa_sent_status: row.wa_sent_status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderDetailsRow {
    #[sqlx(flatten)]
    order: OrderRow,
    customer_name: String,
    customer_phone: String,
    customer_address: Option<String>,
    customer_created_at: DateTime<Utc>,
    customer_updated_at: DateTime<Utc>,
    cashier_name: String,
}

impl OrderDetailsRow {
    fn into_details(self, items: Vec<OrderItem>) -> OrderDetails {
        let order = Order::from(self.order);
        let customer = Customer {
            id: order.customers_id,
            name: self.customer_name,
            phone_number: self.customer_phone,
            address: self.customer_address,
            created_at: self.customer_created_at,
            updated_at: self.customer_updated_at,
        };
        let user = StaffRef {
            id: order.users_id,
            name: self.cashier_name,
        };
        OrderDetails::new(order, customer, user, items)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    orders_id: Uuid,
    products_id: Uuid,
    price_at_purchase: Decimal,
    subtotal: Decimal,
    product_name: String,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        let products_id = ProductId::new(row.products_id);
        Self {
            id: OrderItemId::new(row.id),
            orders_id: OrderId::new(row.orders_id),
            products_id,
            price_at_purchase: row.price_at_purchase,
            subtotal: row.subtotal,
            product: ProductRef {
                id: products_id,
                name: row.product_name,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone_number: String,
    address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            name: row.name,
            phone_number: row.phone_number,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// One cart line to persist.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub price: Decimal,
    pub quantity: u32,
    /// `price * quantity`, checked against overflow during validation.
    pub subtotal: Decimal,
}

/// A validated checkout, ready to be written.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub users_id: UserId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub payment_status: PaymentStatus,
    pub lines: Vec<NewOrderLine>,
}

/// Filters for the owner order list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub payment_status: Option<PaymentStatus>,
    pub wa_status: Option<NotificationStatus>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the order id, customer name or phone.
    pub search: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write a checkout: upsert the customer, insert the header and every line.
    ///
    /// Everything happens in one transaction; on any error nothing is kept.
    /// The order starts with `wa_sent_status = PENDING`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a line references a missing product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn place(&self, new_order: &NewOrder) -> Result<Order, RepositoryError> {
        let totals = &new_order.totals;
        let mut tx = self.pool.begin().await?;

        let customer = upsert_customer(
            &mut tx,
            &new_order.customer_name,
            &new_order.customer_phone,
            new_order.customer_address.as_deref(),
        )
        .await?;

        let order_row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO pos.orders
                (id, users_id, customers_id, total_amount, shiping_cost, grand_total,
                 payment_status, wa_sent_status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING', $8)
            RETURNING id, users_id, customers_id, total_amount, shiping_cost, grand_total,
                      payment_status, wa_sent_status, notes, created_at, updated_at
            ",
        )
        .bind(OrderId::generate().as_uuid())
        .bind(new_order.users_id.as_uuid())
        .bind(customer.id.as_uuid())
        .bind(totals.total_amount)
        .bind(totals.shiping_cost)
        .bind(totals.grand_total)
        .bind(new_order.payment_status)
        .bind(new_order.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for line in &new_order.lines {
            sqlx::query(
                r"
                INSERT INTO pos.order_items
                    (id, orders_id, products_id, price_at_purchase, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(OrderItemId::generate().as_uuid())
            .bind(order_row.id)
            .bind(line.product_id.as_uuid())
            .bind(line.price)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await
            .map_err(|e| super::map_constraint(e, "product does not exist"))?;
        }

        tx.commit().await?;

        Ok(order_row.into())
    }

    /// Get an order with its customer, cashier and lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderDetailsRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, {DETAIL_COLUMNS}
            FROM pos.orders o
            {DETAIL_JOINS}
            WHERE o.id = $1
            "
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self
            .items_for(&[row.order.id])
            .await?
            .remove(&row.order.id)
            .unwrap_or_default();

        Ok(Some(row.into_details(items)))
    }

    /// One page of orders matching `filter`, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderDetails>, i64), RepositoryError> {
        const WHERE: &str = r"
            ($1::pos.payment_status IS NULL OR o.payment_status = $1)
            AND ($2::pos.wa_sent_status IS NULL OR o.wa_sent_status = $2)
            AND ($3::timestamptz IS NULL OR o.created_at >= $3)
            AND ($4::timestamptz IS NULL OR o.created_at < $4)
            AND ($5::text IS NULL
                 OR o.id::text ILIKE $5
                 OR cu.name ILIKE $5
                 OR cu.phone_number ILIKE $5)
        ";

        let search = filter.search.as_deref().map(super::like_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            r"
            SELECT COUNT(*)
            FROM pos.orders o
            JOIN pos.customers cu ON cu.id = o.customers_id
            WHERE {WHERE}
            "
        ))
        .bind(filter.payment_status)
        .bind(filter.wa_status)
        .bind(filter.created_from)
        .bind(filter.created_before)
        .bind(search.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OrderDetailsRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, {DETAIL_COLUMNS}
            FROM pos.orders o
            {DETAIL_JOINS}
            WHERE {WHERE}
            ORDER BY o.created_at DESC, o.id
            LIMIT $6 OFFSET $7
            "
        ))
        .bind(filter.payment_status)
        .bind(filter.wa_status)
        .bind(filter.created_from)
        .bind(filter.created_before)
        .bind(search.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.order.id).collect();
        let mut items = self.items_for(&ids).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.order.id).unwrap_or_default();
                row.into_details(lines)
            })
            .collect();

        Ok((orders, total))
    }

    /// Lines of the given orders, grouped by order id.
    async fn items_for(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.orders_id, oi.products_id, oi.price_at_purchase, oi.subtotal,
                   p.name AS product_name
            FROM pos.order_items oi
            JOIN pos.products p ON p.id = oi.products_id
            WHERE oi.orders_id = ANY($1)
            ORDER BY oi.created_at, oi.id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.orders_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Set the payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE pos.orders o
            SET payment_status = $2, updated_at = NOW()
            WHERE o.id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Record the outcome of a notification attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_wa_status(
        &self,
        id: OrderId,
        status: NotificationStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE pos.orders SET wa_sent_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Ids of every order whose notification failed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn failed_notification_ids(&self) -> Result<Vec<OrderId>, RepositoryError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM pos.orders WHERE wa_sent_status = 'FAILED' ORDER BY created_at",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(OrderId::new).collect())
    }
}

/// Insert a customer or refresh an existing one with the same phone number.
///
/// The name is always replaced; the address only when a new one is given.
async fn upsert_customer(
    conn: &mut PgConnection,
    name: &str,
    phone_number: &str,
    address: Option<&str>,
) -> Result<Customer, RepositoryError> {
    let row = sqlx::query_as::<_, CustomerRow>(
        r"
        INSERT INTO pos.customers (id, name, phone_number, address)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (phone_number) DO UPDATE
        SET name = EXCLUDED.name,
            address = COALESCE(EXCLUDED.address, pos.customers.address),
            updated_at = NOW()
        RETURNING id, name, phone_number, address, created_at, updated_at
        ",
    )
    .bind(CustomerId::generate().as_uuid())
    .bind(name)
    .bind(phone_number)
    .bind(address)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}
