//! Business logic sitting between the route handlers and the repositories.

pub mod auth;
pub mod images;
pub mod intake;
pub mod notification;
pub mod reports;

pub use auth::{AuthError, AuthService};
pub use images::{ImageError, ImageKind, ImageStore};
pub use intake::{CheckoutOutcome, CheckoutRequest, IntakeError, OrderIntakeService};
pub use notification::{NotificationService, ResendSummary};
pub use reports::{DashboardStats, dashboard_stats};
