//! Owner dashboard.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::services::{DashboardStats, dashboard_stats};
use crate::state::AppState;

/// Today's counters and the seven-day revenue chart.
#[instrument(skip(owner, state), fields(user_id = %owner.id))]
pub async fn index(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = dashboard_stats(state.pool(), Utc::now(), state.config().store.utc_offset).await?;
    Ok(Json(stats))
}
