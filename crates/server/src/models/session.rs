//! Session-stored staff identity.

use serde::{Deserialize, Serialize};

use jamur_pos_core::{Email, UserId, UserRole};

use super::User;

/// Minimal data stored in the session to identify the logged-in staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Whether this user may use the owner back office.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role == UserRole::Owner
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in staff member.
    pub const CURRENT_USER: &str = "current_user";
}
