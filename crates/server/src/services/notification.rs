//! Order notification dispatch.

use sqlx::PgPool;
use tracing::instrument;

use jamur_pos_core::OrderId;

use crate::config::StoreConfig;
use crate::db::{OrderRepository, RepositoryError};
use crate::whatsapp::{DeliveryReport, FonnteClient, OrderMessage};

/// Tally of a bulk resend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResendSummary {
    pub sent: usize,
    pub failed: usize,
}

impl ResendSummary {
    fn record(&mut self, report: &DeliveryReport) {
        if report.status.is_sent() {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Staff-facing summary line.
    #[must_use]
    pub fn message(&self) -> String {
        format!("{} berhasil, {} gagal", self.sent, self.failed)
    }
}

/// Renders order summaries, sends them, and records the outcome on the order.
pub struct NotificationService<'a> {
    orders: OrderRepository<'a>,
    fonnte: &'a FonnteClient,
    store: &'a StoreConfig,
}

impl<'a> NotificationService<'a> {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, fonnte: &'a FonnteClient, store: &'a StoreConfig) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            fonnte,
            store,
        }
    }

    /// Send the order summary to the order's customer and store the result.
    ///
    /// Delivery problems come back as a `FAILED` report, not as an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if loading or updating fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn notify_order(&self, order_id: OrderId) -> Result<DeliveryReport, RepositoryError> {
        let details = self
            .orders
            .get_details(order_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let message = OrderMessage::new(&details, &self.store.name, self.store.utc_offset);
        let report = match message.to_text() {
            Ok(text) => {
                self.fonnte
                    .send_message(&details.customer.phone_number, &text)
                    .await
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to render order message");
                DeliveryReport::failed(e.to_string())
            }
        };

        self.orders.update_wa_status(order_id, report.status).await?;

        Ok(report)
    }

    /// Resend every order whose last notification failed, one after another.
    ///
    /// An order that cannot be loaded or updated counts as failed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the failed orders cannot be listed.
    #[instrument(skip(self))]
    pub async fn resend_failed(&self) -> Result<ResendSummary, RepositoryError> {
        let mut summary = ResendSummary::default();

        for order_id in self.orders.failed_notification_ids().await? {
            match self.notify_order(order_id).await {
                Ok(report) => summary.record(&report),
                Err(e) => {
                    tracing::error!(order_id = %order_id, error = %e, "Resend failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(sent = summary.sent, failed = summary.failed, "Bulk resend finished");
        Ok(summary)
    }
}
