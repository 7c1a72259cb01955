//! Uniform field access over the two shapes a form can arrive in.
//!
//! Stored records are typed [`Form`] values; payloads read back from files or
//! other services are loose JSON objects. Both render to the same cell text.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::model::Form;

/// Cell format for timestamps: 24-hour, no zone suffix, no fractional seconds.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logical form fields that can be read from any [`FormSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Id,
    Name,
    Email,
    PhoneNumber,
    Message,
    Company,
    Service,
    CreatedAt,
    UpdatedAt,
}

impl FormField {
    /// Fields mirrored to the sheet, in column order.
    pub const EXPORTED: [Self; 8] = [
        Self::Id,
        Self::Name,
        Self::Email,
        Self::PhoneNumber,
        Self::Message,
        Self::Company,
        Self::Service,
        Self::CreatedAt,
    ];

    /// Key used in the JSON representation.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Message => "message",
            Self::Company => "company",
            Self::Service => "service",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Column title in the sheet.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::Email => "Email",
            Self::PhoneNumber => "Phone",
            Self::Message => "Message",
            Self::Company => "Company",
            Self::Service => "Service",
            Self::CreatedAt => "Created At",
            Self::UpdatedAt => "Updated At",
        }
    }

    #[must_use]
    pub const fn is_timestamp(self) -> bool {
        matches!(self, Self::CreatedAt | Self::UpdatedAt)
    }
}

/// A form in one of its two supported shapes.
#[derive(Debug, Clone, Copy)]
pub enum FormSource<'a> {
    /// A typed record from the store.
    Record(&'a Form),
    /// A loose key/value object.
    Map(&'a Map<String, Value>),
}

impl<'a> From<&'a Form> for FormSource<'a> {
    fn from(form: &'a Form) -> Self {
        Self::Record(form)
    }
}

impl<'a> From<&'a Map<String, Value>> for FormSource<'a> {
    fn from(map: &'a Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

/// Read one field as cell text.
///
/// Never fails: an absent key, a null, or a value of an unsupported type
/// renders as the empty string.
#[must_use]
pub fn field_value(source: FormSource<'_>, field: FormField) -> String {
    match source {
        FormSource::Record(form) => record_value(form, field),
        FormSource::Map(map) => map_value(map, field),
    }
}

/// Render a timestamp for a cell. `None` renders as the empty string.
#[must_use]
pub fn format_datetime(value: Option<NaiveDateTime>) -> String {
    value.map_or_else(String::new, |dt| dt.format(DATETIME_FORMAT).to_string())
}

fn record_value(form: &Form, field: FormField) -> String {
    match field {
        FormField::Id => form.id.to_string(),
        FormField::Name => form.name.clone(),
        FormField::Email => form.email.clone(),
        FormField::PhoneNumber => form.phone_number.clone(),
        FormField::Message => form.message.clone().unwrap_or_default(),
        FormField::Company => form.company.clone(),
        FormField::Service => form.service.clone(),
        FormField::CreatedAt => format_datetime(Some(form.created_at.naive_utc())),
        FormField::UpdatedAt => format_datetime(form.updated_at.map(|dt| dt.naive_utc())),
    }
}

fn map_value(map: &Map<String, Value>, field: FormField) -> String {
    let Some(value) = map.get(field.key()) else {
        return String::new();
    };

    if field.is_timestamp() {
        return format_datetime(parse_timestamp(value));
    }

    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Accepts RFC 3339, naive ISO (`T` or space separated, optional fraction),
/// or integer Unix milliseconds.
fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}
