//! WhatsApp order notifications through the Fonnte gateway.
//!
//! [`FonnteClient`] posts a text message and reduces the gateway's answer to
//! a [`DeliveryReport`]; [`OrderMessage`] renders the order summary sent to
//! customers.

mod client;
mod error;
mod message;
mod types;

pub use client::FonnteClient;
pub use error::FonnteError;
pub use message::OrderMessage;
pub use types::{DeliveryReport, SendRequest};
