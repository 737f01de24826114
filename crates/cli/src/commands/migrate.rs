//! Database migration command.
//!
//! ```bash
//! jamur-pos migrate
//! ```
//!
//! Migrations are embedded from `crates/server/migrations/` at compile time.

use jamur_pos_server::db;

use super::{CommandError, database_url};

/// Run the POS database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to POS database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running POS migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("POS migrations complete!");
    Ok(())
}
