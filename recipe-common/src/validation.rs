//! Field-level validation for request payloads
//!
//! Errors are collected per field so a single response can report every
//! problem with a payload, keyed by field name:
//!
//! ```json
//! {"email": ["Enter a valid email address."], "password": ["This field is required."]}
//! ```

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Message for a missing required field
pub const REQUIRED: &str = "This field is required.";

/// Message for an empty (or whitespace-only) text field that disallows blanks
pub const BLANK: &str = "This field may not be blank.";

/// Message for an explicit `null`
pub const NULL: &str = "This field may not be null.";

/// Message for a value that can't be read as text
pub const INVALID_STRING: &str = "Not a valid string.";

/// Message for a value that isn't an integer
pub const INVALID_INTEGER: &str = "A valid integer is required.";

/// Message for an unparseable email address
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Key used for errors that are not tied to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Maximum length of short text columns (names, titles, links, emails)
pub const MAX_NAME_LENGTH: usize = 255;

/// Validation errors keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Error not attributable to a specific field
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::single(NON_FIELD_ERRORS, message)
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when no errors were collected
    pub fn into_result(self) -> crate::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Rules for a text field
///
/// Values are trimmed before validation unless `keep_whitespace` is set;
/// the cleaned (trimmed) value is what gets stored.
#[derive(Debug, Clone, Copy)]
pub struct CharField {
    max_length: Option<usize>,
    min_length: Option<usize>,
    allow_blank: bool,
    trim: bool,
}

impl CharField {
    pub const fn new() -> Self {
        Self {
            max_length: None,
            min_length: None,
            allow_blank: false,
            trim: true,
        }
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub const fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    pub const fn keep_whitespace(mut self) -> Self {
        self.trim = false;
        self
    }

    /// Validate `value`, recording failures under `field`
    ///
    /// Returns the cleaned value when valid.
    pub fn clean(&self, errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
        let value = if self.trim { value.trim() } else { value };

        if value.is_empty() {
            if self.allow_blank {
                return Some(String::new());
            }
            errors.add(field, BLANK);
            return None;
        }

        let length = value.chars().count();
        let mut valid = true;

        if let Some(max) = self.max_length {
            if length > max {
                errors.add(
                    field,
                    format!("Ensure this field has no more than {} characters.", max),
                );
                valid = false;
            }
        }

        if let Some(min) = self.min_length {
            if length < min {
                errors.add(
                    field,
                    format!("Ensure this field has at least {} characters.", min),
                );
                valid = false;
            }
        }

        valid.then(|| value.to_string())
    }

    /// Like [`CharField::clean`] but records [`REQUIRED`] when the value is absent
    pub fn clean_required(
        &self,
        errors: &mut FieldErrors,
        field: &str,
        value: Option<&str>,
    ) -> Option<String> {
        match value {
            Some(value) => self.clean(errors, field, value),
            None => {
                errors.add(field, REQUIRED);
                None
            }
        }
    }
}

impl Default for CharField {
    fn default() -> Self {
        Self::new()
    }
}

/// Record [`REQUIRED`] for an absent field unless the write is partial
pub fn report_missing(errors: &mut FieldErrors, field: &str, partial: bool) {
    if !partial {
        errors.add(field, REQUIRED);
    }
}

/// `value` unless it is `null`, which is recorded as [`NULL`]
pub fn non_null<'a>(errors: &mut FieldErrors, field: &str, value: &'a Value) -> Option<&'a Value> {
    if value.is_null() {
        errors.add(field, NULL);
        None
    } else {
        Some(value)
    }
}

/// Text of a JSON string or number
///
/// Numbers are accepted and converted; other types are [`INVALID_STRING`].
pub fn clean_text(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<String> {
    match non_null(errors, field, value)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => {
            errors.add(field, INVALID_STRING);
            None
        }
    }
}

/// Accept a JSON integer, an integral float or a numeric string
pub fn clean_integer(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<i64> {
    let parsed = match non_null(errors, field, value)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    if parsed.is_none() {
        errors.add(field, INVALID_INTEGER);
    }
    parsed
}

/// Validate an email address and return it trimmed
///
/// Accepts `local@domain` where both parts are non-empty, contain no
/// whitespace, and the domain contains no further `@`.
pub fn clean_email(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    let value = CharField::new()
        .max_length(MAX_NAME_LENGTH)
        .clean(errors, field, value)?;

    let well_formed = match value.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if well_formed {
        Some(value)
    } else {
        errors.add(field, INVALID_EMAIL);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rejected_unless_allowed() {
        let mut errors = FieldErrors::new();
        assert_eq!(CharField::new().clean(&mut errors, "title", "   "), None);
        assert_eq!(errors.get("title"), Some(&[BLANK.to_string()][..]));

        let mut errors = FieldErrors::new();
        let cleaned = CharField::new().allow_blank().clean(&mut errors, "link", "");
        assert_eq!(cleaned.as_deref(), Some(""));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_value_is_trimmed() {
        let mut errors = FieldErrors::new();
        let cleaned = CharField::new().clean(&mut errors, "name", "  Thai  ");
        assert_eq!(cleaned.as_deref(), Some("Thai"));
    }

    #[test]
    fn test_keep_whitespace_preserves_value() {
        let mut errors = FieldErrors::new();
        let cleaned = CharField::new()
            .keep_whitespace()
            .clean(&mut errors, "password", " pass word ");
        assert_eq!(cleaned.as_deref(), Some(" pass word "));
    }

    #[test]
    fn test_length_limits() {
        let field = CharField::new().min_length(5).max_length(8);

        let mut errors = FieldErrors::new();
        assert!(field.clean(&mut errors, "password", "pw").is_none());
        assert!(errors.get("password").unwrap()[0].contains("at least 5"));

        let mut errors = FieldErrors::new();
        assert!(field.clean(&mut errors, "password", "much-too-long").is_none());
        assert!(errors.get("password").unwrap()[0].contains("no more than 8"));

        let mut errors = FieldErrors::new();
        assert!(field.clean(&mut errors, "password", "secret").is_some());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        let cleaned = CharField::new().max_length(4).clean(&mut errors, "name", "crème");
        assert!(cleaned.is_none());

        let mut errors = FieldErrors::new();
        let cleaned = CharField::new().max_length(5).clean(&mut errors, "name", "crème");
        assert_eq!(cleaned.as_deref(), Some("crème"));
    }

    #[test]
    fn test_clean_required_missing() {
        let mut errors = FieldErrors::new();
        assert!(CharField::new().clean_required(&mut errors, "name", None).is_none());
        assert_eq!(errors.get("name"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn test_report_missing_only_for_full_writes() {
        let mut errors = FieldErrors::new();
        report_missing(&mut errors, "title", true);
        assert!(errors.is_empty());

        report_missing(&mut errors, "title", false);
        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn test_clean_integer() {
        let mut errors = FieldErrors::new();
        assert_eq!(clean_integer(&mut errors, "time_minutes", &serde_json::json!(10)), Some(10));
        assert_eq!(clean_integer(&mut errors, "time_minutes", &serde_json::json!("25")), Some(25));
        assert_eq!(clean_integer(&mut errors, "time_minutes", &serde_json::json!(5.0)), Some(5));
        assert!(errors.is_empty());

        assert_eq!(clean_integer(&mut errors, "time_minutes", &serde_json::json!(5.5)), None);
        assert_eq!(clean_integer(&mut errors, "time_minutes", &serde_json::json!("ten")), None);
        assert_eq!(errors.get("time_minutes").map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_null_values_rejected() {
        let mut errors = FieldErrors::new();
        assert_eq!(clean_integer(&mut errors, "time_minutes", &Value::Null), None);
        assert_eq!(clean_text(&mut errors, "title", &Value::Null), None);
        assert_eq!(errors.get("time_minutes"), Some(&[NULL.to_string()][..]));
        assert_eq!(errors.get("title"), Some(&[NULL.to_string()][..]));
    }

    #[test]
    fn test_clean_text() {
        let mut errors = FieldErrors::new();
        assert_eq!(clean_text(&mut errors, "title", &serde_json::json!("Soup")).as_deref(), Some("Soup"));
        assert_eq!(clean_text(&mut errors, "title", &serde_json::json!(5)).as_deref(), Some("5"));
        assert!(errors.is_empty());

        assert_eq!(clean_text(&mut errors, "title", &serde_json::json!(["a"])), None);
        assert_eq!(clean_text(&mut errors, "title", &serde_json::json!(true)), None);
        assert_eq!(
            errors.get("title"),
            Some(&[INVALID_STRING.to_string(), INVALID_STRING.to_string()][..])
        );
    }

    #[test]
    fn test_email_validation() {
        for valid in ["test@example.com", "a.b+c@sub.example.org", "user@localhost"] {
            let mut errors = FieldErrors::new();
            assert!(clean_email(&mut errors, "email", valid).is_some(), "{}", valid);
        }

        for invalid in ["plainaddress", "@example.com", "user@", "user@.com", "us er@example.com"] {
            let mut errors = FieldErrors::new();
            assert!(clean_email(&mut errors, "email", invalid).is_none(), "{}", invalid);
            assert_eq!(errors.get("email"), Some(&[INVALID_EMAIL.to_string()][..]));
        }
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("title", REQUIRED);
        errors.add("price", "A valid number is required.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"][0], REQUIRED);
        assert_eq!(json["price"][0], "A valid number is required.");
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let err = FieldErrors::single("name", BLANK).into_result().unwrap_err();
        assert!(matches!(err, crate::Error::Validation(ref e) if e.contains("name")));
    }
}
