//! HTTP middleware for the POS server.
//!
//! Layer order, outermost first: Sentry, `TraceLayer`, sessions. Access
//! control is done per handler through the extractors in [`auth`].

pub mod auth;
pub mod json;
pub mod session;

pub use auth::{
    AuthRejection, OptionalUser, RequireOwner, RequireStaff, clear_current_user, set_current_user,
};
pub use json::JsonBody;
pub use session::create_session_layer;
