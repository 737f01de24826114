//! Domain models for the POS server.

pub mod catalog;
pub mod order;
pub mod pagination;
pub mod session;
pub mod user;

pub use catalog::{Category, CategoryRef, CategoryWithCount, Product, ProductView};
pub use order::{Customer, Order, OrderDetails, OrderItem, OrderItemView, ProductRef, StaffRef};
pub use pagination::{Page, PageRequest};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
