//! Account email.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::EMAIL_RE;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must look like name@domain.tld")]
    Malformed,
}

/// The email an account signs in with.
///
/// Parsing trims and lowercases, so `" Asha@Example.com"` at registration
/// and `"asha@example.com"` at login name the same account, and entries of
/// `NEVYRA_ADMIN_EMAILS` compare equal to the stored address. The accepted
/// shape is the one the shipping address form checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// # Errors
    ///
    /// Returns an [`EmailError`] for blank, oversized or malformed input.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !EMAIL_RE.is_match(trimmed) {
            return Err(EmailError::Malformed);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::address::AddressInput;

    #[test]
    fn test_sign_in_spellings_name_one_account() {
        let registered = Email::parse("  Asha@Example.COM ").unwrap();
        let login: Email = "asha@example.com".parse().unwrap();
        assert_eq!(registered, login);
        assert_eq!(registered.to_string(), "asha@example.com");
    }

    #[test]
    fn test_admin_list_lookup() {
        let admins: BTreeSet<Email> = "ops@nevyra.in, Admin@Nevyra.in"
            .split(',')
            .map(|e| Email::parse(e).unwrap())
            .collect();
        assert!(admins.contains(&Email::parse("ADMIN@nevyra.in").unwrap()));
        assert!(!admins.contains(&Email::parse("asha@example.com").unwrap()));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("not-an-email"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("asha@localhost"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("as ha@example.com"), Err(EmailError::Malformed));
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_accepts_what_the_address_form_accepts() {
        for candidate in ["a@b.co", "asha@example.com", "x@y.z", "no-at.example.com"] {
            let form = AddressInput {
                email: candidate.to_string(),
                ..AddressInput::default()
            };
            let form_ok = form
                .validate()
                .err()
                .is_none_or(|errors| errors.get(crate::Field::Email).is_none());
            assert_eq!(Email::parse(candidate).is_ok(), form_ok, "{candidate}");
        }
    }
}
