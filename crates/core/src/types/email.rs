//! Staff login email.
//!
//! Staff sign in with the address they were registered with, typed however
//! the keyboard likes. Parsing trims and lowercases so `Kasir@Jamur.com ` and
//! `kasir@jamur.com` name the same account.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a login email was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {} characters", Email::MAX_LENGTH)]
    TooLong,
    #[error("email must look like name@domain")]
    Malformed,
}

/// A normalized staff email address.
///
/// ```
/// use jamur_pos_core::Email;
///
/// let email = Email::parse(" Owner@Jamur.COM ").unwrap();
/// assert_eq!(email.as_str(), "owner@jamur.com");
/// assert!(Email::parse("owner").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
pub struct Email(String);

impl Email {
    /// Column width of `pos.users.email`.
    pub const MAX_LENGTH: usize = 254;

    /// Trim, lowercase and check the `name@domain` shape.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Empty` for blank input, `EmailError::TooLong`
    /// past [`Self::MAX_LENGTH`], and `EmailError::Malformed` unless there is
    /// exactly one `@` with text on both sides and no inner whitespace.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        match trimmed.split_once('@') {
            Some((name, domain))
                if !name.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !trimmed.chars().any(char::is_whitespace) =>
            {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_input_is_normalized() {
        for raw in ["kasir@jamur.com", "Kasir@Jamur.com", "  KASIR@JAMUR.COM\t", "kasir@jamur.com\n"] {
            assert_eq!(Email::parse(raw).unwrap().as_str(), "kasir@jamur.com", "{raw:?}");
        }
    }

    #[test]
    fn test_normalized_emails_compare_equal() {
        assert_eq!(
            Email::parse("Owner@Jamur.com").unwrap(),
            Email::parse("owner@jamur.com ").unwrap()
        );
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_malformed_input() {
        for raw in ["owner", "@jamur.com", "owner@", "owner@@jamur.com", "ow ner@jamur.com", "a@b@c"] {
            assert_eq!(Email::parse(raw), Err(EmailError::Malformed), "{raw:?}");
        }
    }

    #[test]
    fn test_length_limit_counts_after_trim() {
        let at_limit = format!("{}@jamur.id", "a".repeat(Email::MAX_LENGTH - 9));
        assert!(Email::parse(&format!("  {at_limit}  ")).is_ok());

        let over = format!("a{at_limit}");
        assert_eq!(Email::parse(&over), Err(EmailError::TooLong));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("Owner@Jamur.com").unwrap();
        assert_eq!(serde_json::to_value(&email).unwrap(), "owner@jamur.com");
        assert_eq!(email.to_string(), "owner@jamur.com");
    }
}
