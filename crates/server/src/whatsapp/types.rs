//! Wire types for the Fonnte send endpoint.

use serde::{Deserialize, Serialize};

use jamur_pos_core::NotificationStatus;

/// Fallback text when the gateway refuses without a reason.
pub(super) const DEFAULT_FAILURE: &str = "Failed to send message";

/// JSON body of `POST /send`.
#[derive(Debug, Clone, Serialize)]
pub struct SendRequest<'a> {
    pub target: &'a str,
    pub message: &'a str,
    #[serde(rename = "countryCode")]
    pub country_code: &'a str,
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub status: NotificationStatus,
    pub message: String,
}

impl DeliveryReport {
    /// A delivered message.
    #[must_use]
    pub fn sent() -> Self {
        Self {
            status: NotificationStatus::Sent,
            message: "Message sent successfully".to_owned(),
        }
    }

    /// A failed attempt with the reason shown to staff.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Failed,
            message: message.into(),
        }
    }
}

/// Interpret a Fonnte response body.
///
/// Success needs `"status": true` (a JSON boolean). Otherwise the gateway's
/// `reason` is returned as the error text.
pub(super) fn interpret_body(body: &serde_json::Value) -> Result<(), String> {
    if body.get("status") == Some(&serde_json::Value::Bool(true)) {
        return Ok(());
    }
    Err(failure_reason(body))
}

/// The gateway's `reason`, or [`DEFAULT_FAILURE`] when it gave none.
pub(super) fn failure_reason(body: &serde_json::Value) -> String {
    match body.get("reason") {
        Some(serde_json::Value::String(reason)) if !reason.is_empty() => reason.clone(),
        Some(serde_json::Value::String(_) | serde_json::Value::Null) | None => {
            DEFAULT_FAILURE.to_owned()
        }
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_send_request_field_names() {
        let body = serde_json::to_value(SendRequest {
            target: "6281234567890",
            message: "Halo",
            country_code: "62",
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"target": "6281234567890", "message": "Halo", "countryCode": "62"})
        );
    }

    #[test]
    fn test_interpret_body_success() {
        assert!(interpret_body(&json!({"status": true, "detail": "success! message in queue"})).is_ok());
    }

    #[test]
    fn test_interpret_body_requires_boolean_true() {
        assert_eq!(
            interpret_body(&json!({"status": "true"})).unwrap_err(),
            DEFAULT_FAILURE
        );
        assert_eq!(
            interpret_body(&json!({"status": false, "reason": "invalid token"})).unwrap_err(),
            "invalid token"
        );
        assert_eq!(interpret_body(&json!(null)).unwrap_err(), DEFAULT_FAILURE);
        assert_eq!(
            interpret_body(&json!({"status": false, "reason": ""})).unwrap_err(),
            DEFAULT_FAILURE
        );
    }

    #[test]
    fn test_delivery_report_constructors() {
        assert_eq!(DeliveryReport::sent().status, NotificationStatus::Sent);
        let failed = DeliveryReport::failed("timeout");
        assert_eq!(failed.status, NotificationStatus::Failed);
        assert_eq!(failed.message, "timeout");
    }
}
