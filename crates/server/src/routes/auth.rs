//! Staff login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "These credentials do not match our records.";

/// Login credentials, posted as a form or as JSON.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// JSON login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub redirect: &'static str,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub store_name: String,
    pub email: String,
    pub error: Option<String>,
}

/// `GET /` sends everyone to the login page.
pub async fn root() -> Redirect {
    Redirect::to("/login")
}

/// Display the login page, or skip it when already logged in.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.role.home_path()).into_response();
    }

    LoginTemplate {
        store_name: state.config().store.name.clone(),
        email: String::new(),
        error: None,
    }
    .into_response()
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Handle a login attempt.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    request: Request,
) -> Result<Response, AppError> {
    let wants_json = is_json(&request);
    let form = if wants_json {
        let Json(form) = Json::<LoginForm>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        form
    } else {
        let Form(form) = Form::<LoginForm>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        form
    };

    let auth = AuthService::new(state.pool());
    let user = match auth.login_with_password(form.email.trim(), &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Rejected login attempt");
            if wants_json {
                return Err(AppError::field("email", BAD_CREDENTIALS));
            }
            let page = LoginTemplate {
                store_name: state.config().store.name.clone(),
                email: form.email,
                error: Some(BAD_CREDENTIALS.to_owned()),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&current.id.to_string(), Some(current.email.as_str()));
    tracing::info!(user_id = %current.id, role = %current.role, "Staff logged in");

    let redirect = current.role.home_path();
    if wants_json {
        Ok(Json(LoginResponse { redirect }).into_response())
    } else {
        Ok(Redirect::to(redirect).into_response())
    }
}

/// Log out and return to the login page.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    Redirect::to("/login")
}
