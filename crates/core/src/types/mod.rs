//! Core types for Jamur POS.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{
    MAX_AMOUNT, MAX_SHIPPING, OrderTotals, derive_quantity, format_rupiah, group_thousands,
    line_subtotal,
};
pub use phone::{DEFAULT_COUNTRY_CODE, whatsapp_target};
pub use status::*;
