//! Staff account management.
//!
//! ```bash
//! JAMUR_POS_PASSWORD=... jamur-pos user create -e kasir2@jamur.com -n "Kasir Dua" -r cashier
//! ```

use jamur_pos_core::UserRole;
use jamur_pos_server::db;
use jamur_pos_server::services::AuthService;

use super::{CommandError, database_url};

/// Create a staff account.
///
/// # Errors
///
/// Returns an error if the role is unknown, the email is invalid or taken,
/// the password is too short, or the database fails.
pub async fn create(email: &str, name: &str, role: &str, password: &str) -> Result<(), CommandError> {
    let role: UserRole = role.parse().map_err(|_| {
        CommandError::Invalid(format!("Invalid role: {role}. Valid roles: owner, cashier"))
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::Invalid("Name must not be empty".to_owned()));
    }

    let pool = db::create_pool(&database_url()?).await?;

    tracing::info!("Creating {} account: {}", role, email);
    let user = AuthService::new(&pool)
        .register(email, name, role, password)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
