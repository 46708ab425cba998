//! Account email addresses.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email must contain exactly one @ symbol")]
    MultipleAtSymbols,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// A normalized email address: trimmed, lower-cased, one `@` between a
/// non-empty local part and a non-empty domain.
///
/// Normalization makes the address usable as a lookup key, so
/// `Seller@Motors.ae` and `seller@motors.ae` name the same account.
/// Deserialization goes through [`Email::parse`] as well.
///
/// ```
/// use autosouq_core::Email;
///
/// let email = Email::parse(" Sales@DubaiLuxury.ae ").unwrap();
/// assert_eq!(email.as_str(), "sales@dubailuxury.ae");
/// assert_eq!(email.local_part(), "sales");
/// assert!(Email::parse("sales.dubailuxury.ae").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Longest accepted address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalize `input`.
    ///
    /// # Errors
    ///
    /// Returns the [`EmailError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = trimmed
            .split_once('@')
            .ok_or(EmailError::MissingAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::MultipleAtSymbols);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or("", |(local, _)| local)
    }

    /// The part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for input in [
            "sales@dubailuxury.ae",
            "first.last+cars@mail.example.co.uk",
            "a@b.c",
        ] {
            assert!(Email::parse(input).is_ok(), "{input}");
        }
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-symbol"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("a@b@c.ae"), Err(EmailError::MultipleAtSymbols));
        assert_eq!(Email::parse("@motors.ae"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("sales@"), Err(EmailError::EmptyDomain));

        let long = format!("{}@motors.ae", "x".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        );
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let email = Email::parse("  Seller@Dubai-Motors.AE ").unwrap();
        assert_eq!(email.as_str(), "seller@dubai-motors.ae");
        assert_eq!(email, "seller@dubai-motors.ae".parse().unwrap());
        assert_eq!(email.local_part(), "seller");
        assert_eq!(email.domain(), "dubai-motors.ae");
        assert_eq!(email.to_string(), "seller@dubai-motors.ae");
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str("\"Amal@Example.ae\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"amal@example.ae\"");
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
