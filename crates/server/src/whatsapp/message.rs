//! Customer-facing order summary.

use askama::Template;
use chrono::FixedOffset;

use jamur_pos_core::{PaymentStatus, group_thousands};

use crate::models::OrderDetails;

/// One product line of the summary.
#[derive(Debug, Clone)]
pub struct MessageLine {
    pub product_name: String,
    pub quantity: i64,
    /// Already grouped, e.g. `50.000`.
    pub subtotal: String,
}

/// WhatsApp order notification, rendered from `whatsapp/order_notification.txt`.
///
/// Amounts and the timestamp are preformatted so the template stays free of
/// logic beyond the address and payment branches.
#[derive(Debug, Clone, Template)]
#[template(path = "whatsapp/order_notification.txt")]
pub struct OrderMessage {
    pub customer_name: String,
    pub store_name: String,
    pub order_id: String,
    /// `dd Mon YYYY HH:MM` in store local time.
    pub ordered_at: String,
    pub lines: Vec<MessageLine>,
    pub subtotal: String,
    pub shipping: String,
    pub grand_total: String,
    pub address: Option<String>,
    pub is_paid: bool,
}

impl OrderMessage {
    /// Build the message for an order.
    #[must_use]
    pub fn new(details: &OrderDetails, store_name: &str, utc_offset: FixedOffset) -> Self {
        let order = &details.order;

        Self {
            customer_name: details.customer.name.clone(),
            store_name: store_name.to_owned(),
            order_id: order.id.to_string(),
            ordered_at: order
                .created_at
                .with_timezone(&utc_offset)
                .format("%d %b %Y %H:%M")
                .to_string(),
            lines: details
                .items
                .iter()
                .map(|view| MessageLine {
                    product_name: view.item.product.name.clone(),
                    quantity: view.quantity,
                    subtotal: group_thousands(view.item.subtotal),
                })
                .collect(),
            subtotal: group_thousands(order.total_amount),
            shipping: group_thousands(order.shiping_cost),
            grand_total: group_thousands(order.grand_total),
            address: details
                .customer
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_owned),
            is_paid: order.payment_status == PaymentStatus::Paid,
        }
    }

    /// Render the message text.
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if the template fails to render.
    pub fn to_text(&self) -> Result<String, askama::Error> {
        Ok(self.render()?.trim_end().to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use jamur_pos_core::{
        CustomerId, NotificationStatus, OrderId, OrderItemId, ProductId, UserId,
    };

    use super::*;
    use crate::models::{Customer, Order, OrderItem, ProductRef, StaffRef};

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn details(address: Option<&str>, payment_status: PaymentStatus) -> OrderDetails {
        let order_id = OrderId::new(uuid::Uuid::nil());
        let created_at = Utc.with_ymd_and_hms(2026, 1, 23, 3, 5, 0).unwrap();
        let line = |name: &str, price: i64, qty: i64| OrderItem {
            id: OrderItemId::generate(),
            orders_id: order_id,
            products_id: ProductId::generate(),
            price_at_purchase: Decimal::from(price),
            subtotal: Decimal::from(price * qty),
            product: ProductRef {
                id: ProductId::generate(),
                name: name.to_string(),
            },
        };

        OrderDetails::new(
            Order {
                id: order_id,
                users_id: UserId::generate(),
                customers_id: CustomerId::generate(),
                total_amount: Decimal::from(85_000),
                shiping_cost: Decimal::from(10_000),
                grand_total: Decimal::from(95_000),
                payment_status,
                wa_sent_status: NotificationStatus::Pending,
                notes: None,
                created_at,
                updated_at: created_at,
            },
            Customer {
                id: CustomerId::generate(),
                name: "Siti".to_string(),
                phone_number: "081234567890".to_string(),
                address: address.map(str::to_string),
                created_at,
                updated_at: created_at,
            },
            StaffRef {
                id: UserId::generate(),
                name: "Kasir".to_string(),
            },
            vec![
                line("Jamur Crispy Original", 25_000, 2),
                line("Sambal Jamur", 35_000, 1),
            ],
        )
    }

    #[test]
    fn test_unpaid_message_without_address() {
        let text = OrderMessage::new(
            &details(None, PaymentStatus::Unpaid),
            "Jamur Cikuda Nusantara",
            wib(),
        )
        .to_text()
        .unwrap();

        let expected = "Halo *Siti*! 👋\n\n\
            Terima kasih sudah order di *Jamur Cikuda Nusantara*\n\n\
            📋 *Detail Pesanan*\n\
            Order ID: 00000000-0000-0000-0000-000000000000\n\
            Tanggal: 23 Jan 2026 10:05\n\n\
            🛒 *Produk yang dipesan:*\n\
            - Jamur Crispy Original x2 = Rp 50.000\n\
            - Sambal Jamur x1 = Rp 35.000\n\n\
            💰 *Total Pembayaran*\n\
            Subtotal: Rp 85.000\n\
            Ongkir: Rp 10.000\n\
            *TOTAL: Rp 95.000*\n\n\
            Mohon segera lakukan pembayaran ya! 🙏";

        assert_eq!(text, expected);
    }

    #[test]
    fn test_paid_message_with_address() {
        let text = OrderMessage::new(
            &details(Some("Jl. Cikuda No. 1, Jatinangor"), PaymentStatus::Paid),
            "Jamur Cikuda Nusantara",
            wib(),
        )
        .to_text()
        .unwrap();

        assert!(text.ends_with(
            "*TOTAL: Rp 95.000*\n\n\
             📍 Alamat Pengiriman:\nJl. Cikuda No. 1, Jatinangor\n\n\
             ✅ *LUNAS* - Terima kasih sudah berbelanja! 🙏"
        ));
    }

    #[test]
    fn test_blank_address_is_omitted() {
        let message = OrderMessage::new(&details(Some("  "), PaymentStatus::Unpaid), "Toko", wib());
        assert!(message.address.is_none());
        assert!(!message.to_text().unwrap().contains("Alamat"));
    }

    #[test]
    fn test_cancelled_order_asks_for_payment() {
        let text = OrderMessage::new(&details(None, PaymentStatus::Cancelled), "Toko", wib())
            .to_text()
            .unwrap();
        assert!(text.ends_with("Mohon segera lakukan pembayaran ya! 🙏"));
    }
}
