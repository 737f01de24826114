//! Aggregate queries behind the owner dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;

/// Counters shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct DashboardCounters {
    pub today_sales: Decimal,
    pub today_orders: i64,
    pub pending_payments: i64,
    pub failed_wa: i64,
}

/// A non-cancelled order reduced to what the revenue chart needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SaleRecord {
    pub created_at: DateTime<Utc>,
    pub grand_total: Decimal,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Counters for the local day `[day_start, day_end)`.
    ///
    /// Cancelled orders are excluded from today's sales and order count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counters(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<DashboardCounters, RepositoryError> {
        let counters = sqlx::query_as::<_, DashboardCounters>(
            r"
            SELECT
                COALESCE(SUM(grand_total) FILTER (
                    WHERE created_at >= $1 AND created_at < $2
                      AND payment_status <> 'CANCELLED'
                ), 0) AS today_sales,
                COUNT(*) FILTER (
                    WHERE created_at >= $1 AND created_at < $2
                      AND payment_status <> 'CANCELLED'
                ) AS today_orders,
                COUNT(*) FILTER (WHERE payment_status = 'UNPAID') AS pending_payments,
                COUNT(*) FILTER (WHERE wa_sent_status = 'FAILED') AS failed_wa
            FROM pos.orders
            ",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(self.pool)
        .await?;

        Ok(counters)
    }

    /// Non-cancelled orders created at or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SaleRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, SaleRecord>(
            r"
            SELECT created_at, grand_total
            FROM pos.orders
            WHERE created_at >= $1 AND payment_status <> 'CANCELLED'
            ORDER BY created_at
            ",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
