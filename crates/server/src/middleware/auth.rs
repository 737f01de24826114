//! Authentication extractors for POS and owner routes.

use axum::{
    extract::FromRequestParts,
    http::{header::ACCEPT, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Any logged-in staff member (cashier or owner).
///
/// ```rust,ignore
/// async fn register(RequireStaff(user): RequireStaff) -> impl IntoResponse {
///     format!("Kasir: {}", user.name)
/// }
/// ```
pub struct RequireStaff(pub CurrentUser);

/// A logged-in owner. Cashiers get 403.
pub struct RequireOwner(pub CurrentUser);

/// The current user if one is logged in.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Why an authenticated extractor refused the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Browser navigation without a session.
    RedirectToLogin,
    /// JSON client without a session.
    Unauthorized,
    /// Logged in, but not allowed here.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => {
                AppError::Unauthorized("Unauthenticated.".to_owned()).into_response()
            }
            Self::Forbidden => {
                AppError::Forbidden("Only the owner can access this page.".to_owned())
                    .into_response()
            }
        }
    }
}

fn wants_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn require_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    session_user(parts).await.ok_or_else(|| {
        if wants_json(parts) {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    })
}

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireOwner
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = require_user(parts).await?;
        if !user.is_owner() {
            tracing::warn!(user_id = %user.id, "Cashier attempted owner route");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove all session data (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
