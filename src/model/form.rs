//! Form model for formsync.
//!
//! A form is one contact/lead submission. Identity and timestamps belong to
//! the store; everything else is client supplied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::validate::{is_valid_email, is_valid_phone_number};

/// A stored form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Store-assigned identifier, immutable after creation
    pub id: i64,

    pub name: String,
    pub email: String,
    pub phone_number: String,

    /// Free-text message, the only optional client field
    pub message: Option<String>,

    pub company: String,
    pub service: String,

    /// Set once by the store at creation
    pub created_at: DateTime<Utc>,

    /// Set by the store on every update; absent until the first one
    pub updated_at: Option<DateTime<Utc>>,
}

/// A submission before it has been stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewForm {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default)]
    pub message: Option<String>,
    pub company: String,
    pub service: String,
}

impl NewForm {
    /// Check required fields and the email / phone formats.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone_number", &self.phone_number),
            ("company", &self.company),
            ("service", &self.service),
        ] {
            if value.trim().is_empty() {
                return Err(Error::RequiredField(field));
            }
        }

        if !is_valid_email(&self.email) {
            return Err(Error::InvalidEmail);
        }
        if !is_valid_phone_number(&self.phone_number) {
            return Err(Error::InvalidPhoneNumber);
        }

        Ok(())
    }
}

/// A partial update. `None` means "leave unchanged".
///
/// `message` is doubly optional so an explicit JSON `null` clears it while an
/// omitted key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl FormUpdate {
    /// True when no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.message.is_none()
            && self.company.is_none()
            && self.service.is_none()
    }

    /// Validate only the fields being changed.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("company", &self.company),
            ("service", &self.service),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(Error::RequiredField(field));
            }
        }

        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(Error::InvalidEmail);
            }
        }
        if let Some(phone) = &self.phone_number {
            if !is_valid_phone_number(phone) {
                return Err(Error::InvalidPhoneNumber);
            }
        }

        Ok(())
    }

    /// Apply the supplied fields to a form in place.
    pub fn apply_to(&self, form: &mut Form) {
        if let Some(name) = &self.name {
            form.name.clone_from(name);
        }
        if let Some(email) = &self.email {
            form.email.clone_from(email);
        }
        if let Some(phone) = &self.phone_number {
            form.phone_number.clone_from(phone);
        }
        if let Some(message) = &self.message {
            form.message.clone_from(message);
        }
        if let Some(company) = &self.company {
            form.company.clone_from(company);
        }
        if let Some(service) = &self.service {
            form.service.clone_from(service);
        }
    }
}

/// Distinguish a present `null` from an absent key.
fn deserialize_present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
