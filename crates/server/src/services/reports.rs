//! Owner dashboard statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::db::{DashboardRepository, RepositoryError, SaleRecord};

/// Days covered by the revenue chart, not counting today.
pub const CHART_DAYS: u64 = 7;

/// One point of the revenue chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenuePoint {
    /// Local date, `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: i64,
}

/// Everything the owner dashboard shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_sales: Decimal,
    pub today_orders: i64,
    pub pending_payments: i64,
    pub failed_wa: i64,
    pub revenue_chart: Vec<RevenuePoint>,
}

/// UTC instant at which local midnight of `date` falls.
#[must_use]
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&naive)
        .single()
        .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Local calendar date of `at`.
#[must_use]
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// `[start, end)` of the local day containing `now`.
#[must_use]
pub fn day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = local_date(now, offset);
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (local_midnight(today, offset), local_midnight(tomorrow, offset))
}

/// Start of the chart window: local midnight `CHART_DAYS` days before today.
#[must_use]
pub fn chart_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let today = local_date(now, offset);
    let first = today
        .checked_sub_days(Days::new(CHART_DAYS))
        .unwrap_or(today);
    local_midnight(first, offset)
}

/// Group sales by local date, ascending. Days without sales are omitted.
#[must_use]
pub fn revenue_by_day(sales: &[SaleRecord], offset: FixedOffset) -> Vec<RevenuePoint> {
    let mut days: BTreeMap<NaiveDate, (Decimal, i64)> = BTreeMap::new();

    for sale in sales {
        let entry = days
            .entry(local_date(sale.created_at, offset))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += sale.grand_total;
        entry.1 += 1;
    }

    days.into_iter()
        .map(|(date, (revenue, orders))| RevenuePoint {
            date,
            revenue,
            orders,
        })
        .collect()
}

/// Load the dashboard for the local day containing `now`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
#[tracing::instrument(skip(pool))]
pub async fn dashboard_stats(
    pool: &PgPool,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<DashboardStats, RepositoryError> {
    let repo = DashboardRepository::new(pool);

    let (day_start, day_end) = day_bounds(now, offset);
    let counters = repo.counters(day_start, day_end).await?;
    let sales = repo.sales_since(chart_start(now, offset)).await?;

    Ok(DashboardStats {
        today_sales: counters.today_sales,
        today_orders: counters.today_orders,
        pending_payments: counters.pending_payments,
        failed_wa: counters.failed_wa,
        revenue_chart: revenue_by_day(&sales, offset),
    })
}
