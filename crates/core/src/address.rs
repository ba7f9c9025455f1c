//! Shipping addresses and their validation rules.
//!
//! Both the client (before any request is sent) and the backend (before
//! anything is stored) run [`AddressInput::validate`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::AddressId;
use crate::validation::{Field, FieldErrors};

/// Shape every email in the app must have: shipping contacts and accounts.
pub(crate) static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("Invalid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,15}$").expect("Invalid regex"));
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,10}$").expect("Invalid regex"));

/// Address form contents, as typed by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Street address.
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl AddressInput {
    /// Check every field, returning the trimmed input or all field errors.
    ///
    /// # Errors
    ///
    /// Returns [`FieldErrors`] with one message per failing field.
    pub fn validate(&self) -> Result<Self, FieldErrors> {
        let trimmed = self.trimmed();
        let mut errors = FieldErrors::new();

        for (field, value) in [
            (Field::FirstName, &trimmed.first_name),
            (Field::LastName, &trimmed.last_name),
        ] {
            if value.is_empty() {
                errors.insert(field, format!("{} is required", field.label()));
            }
        }

        check_pattern(
            &mut errors,
            Field::Email,
            &trimmed.email,
            &EMAIL_RE,
            "Invalid email address",
        );
        check_pattern(
            &mut errors,
            Field::Phone,
            &trimmed.phone,
            &PHONE_RE,
            "Invalid phone number",
        );

        for (field, value) in [(Field::Address, &trimmed.address), (Field::City, &trimmed.city)] {
            if value.is_empty() {
                errors.insert(field, format!("{} is required", field.label()));
            }
        }

        check_pattern(
            &mut errors,
            Field::ZipCode,
            &trimmed.zip_code,
            &ZIP_RE,
            "Invalid ZIP code",
        );

        errors.into_result(trimmed)
    }

    fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
        }
    }

    /// "First Last" for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn check_pattern(
    errors: &mut FieldErrors,
    field: Field,
    value: &str,
    pattern: &Regex,
    invalid: &str,
) {
    if value.is_empty() {
        errors.insert(field, format!("{} is required", field.label()));
    } else if !pattern.is_match(value) {
        errors.insert(field, invalid);
    }
}

/// A saved address, identified by a stable server-generated id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(flatten)]
    pub details: AddressInput,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    #[must_use]
    pub fn new(details: AddressInput) -> Self {
        Self {
            id: AddressId::generate(),
            details,
            is_default: false,
        }
    }

    /// One-line summary for lists.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.details.full_name(),
            self.details.address,
            self.details.city,
            self.details.zip_code
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> AddressInput {
        AddressInput {
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            zip_code: "411001".to_string(),
        }
    }

    #[test]
    fn test_valid_address_passes_and_is_trimmed() {
        let mut input = valid();
        input.city = "  Pune ".to_string();
        let checked = input.validate().unwrap();
        assert_eq!(checked.city, "Pune");
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = AddressInput::default().validate().unwrap_err();
        assert_eq!(errors.len(), 7);
        assert_eq!(errors.get(Field::FirstName), Some("First name is required"));
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::Phone), Some("Phone number is required"));
        assert_eq!(errors.get(Field::ZipCode), Some("ZIP code is required"));
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let mut input = valid();
        input.last_name = "   ".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get(Field::LastName), Some("Last name is required"));
    }

    #[test]
    fn test_email_format() {
        let mut input = valid();
        input.email = "asha@example".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Invalid email address"));
    }

    #[test]
    fn test_phone_length_bounds() {
        let mut input = valid();
        input.phone = "123456789".to_string();
        assert!(input.validate().is_err());

        input.phone = "1".repeat(10);
        assert!(input.validate().is_ok());

        input.phone = "1".repeat(15);
        assert!(input.validate().is_ok());

        input.phone = "1".repeat(16);
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get(Field::Phone), Some("Invalid phone number"));
    }

    #[test]
    fn test_phone_rejects_formatting_characters() {
        let mut input = valid();
        input.phone = "+91 98765 43210".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_zip_bounds() {
        let mut input = valid();
        input.zip_code = "123".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get(Field::ZipCode), Some("Invalid ZIP code"));

        input.zip_code = "1234".to_string();
        assert!(input.validate().is_ok());

        input.zip_code = "12345678901".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_address_wire_format_is_flat() {
        let address = Address::new(valid());
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["firstName"], "Asha");
        assert_eq!(json["zipCode"], "411001");
        assert_eq!(json["isDefault"], false);
        assert!(json["id"].is_string());
    }
}
