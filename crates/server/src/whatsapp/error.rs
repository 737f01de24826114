//! Error types for the Fonnte client.

use thiserror::Error;

/// Errors that can occur while talking to the Fonnte API.
///
/// These never reach HTTP clients; [`super::FonnteClient::send_message`]
/// folds them into a `FAILED` delivery report.
#[derive(Debug, Error)]
pub enum FonnteError {
    /// No device token configured.
    #[error("Fonnte token not configured")]
    MissingToken,

    /// HTTP request failed (connect, timeout, body).
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered but refused the message.
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fonnte_error_display() {
        assert_eq!(
            FonnteError::MissingToken.to_string(),
            "Fonnte token not configured"
        );
        assert_eq!(
            FonnteError::Rejected("invalid token".to_string()).to_string(),
            "invalid token"
        );
    }
}
