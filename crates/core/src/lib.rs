//! Jamur POS Core - Shared types library.
//!
//! This crate provides common types used across all Jamur POS components:
//! - `server` - POS register and owner back office (HTTP)
//! - `cli` - Command-line tools for migrations, staff users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, order statuses, staff roles, emails, Rupiah
//!   formatting, order totals and WhatsApp phone normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
