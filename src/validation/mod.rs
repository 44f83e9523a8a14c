//! Input validation for registration, login and member profile payloads.
//!
//! Validators are pure: they take the decoded-but-untyped JSON object from the
//! request and the current date, and return either a typed record or a
//! `ValidationErrors` map of field name to messages. Every failing field is
//! reported, not just the first one.

pub mod auth;
pub mod member;
pub mod rules;

pub use auth::{validate_login, validate_registration, Credentials, Registration};
pub use member::{
    check_profile_rules, validate_member_create, validate_member_update, MemberChanges,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw request payload, already JSON-decoded
pub type Input = serde_json::Map<String, Value>;

/// Field-level validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the error of a rule result, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }

    /// Return Ok(()) if no errors were collected
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A field read from the raw payload
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// Key not present
    Absent,
    /// Present as `null` or an empty string
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Human label for messages: `first_name` -> `first name`
pub(crate) fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Read a string field, trimming it and treating "" as null.
/// Non-string values are reported and read as absent.
pub(crate) fn read_string(input: &Input, field: &str, errors: &mut ValidationErrors) -> Field<String> {
    match input.get(field) {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Field::Null
            } else {
                Field::Value(trimmed.to_string())
            }
        }
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", label(field)));
            Field::Absent
        }
    }
}

/// Read a string field and parse it with `parse`, reporting its error
pub(crate) fn read_with<T>(
    input: &Input,
    field: &str,
    errors: &mut ValidationErrors,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Field<T> {
    match read_string(input, field, errors) {
        Field::Absent => Field::Absent,
        Field::Null => Field::Null,
        Field::Value(raw) => match parse(&raw) {
            Ok(value) => Field::Value(value),
            Err(message) => {
                errors.add(field, message);
                Field::Absent
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> Input {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Name is required");
        errors.add("email", "Invalid email format");
        errors.add("name", "Name is too short");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert!(errors.finish().is_err());
        assert!(ValidationErrors::new().finish().is_ok());
    }

    #[test]
    fn test_errors_serialize_as_map() {
        let mut errors = ValidationErrors::new();
        errors.add("phone", "bad");
        assert_eq!(serde_json::to_value(&errors).unwrap(), json!({"phone": ["bad"]}));
    }

    #[test]
    fn test_read_string_normalizes() {
        let raw = input(json!({"a": "  x  ", "b": "   ", "c": null, "d": 5}));
        let mut errors = ValidationErrors::new();

        assert_eq!(read_string(&raw, "a", &mut errors), Field::Value("x".to_string()));
        assert_eq!(read_string(&raw, "b", &mut errors), Field::Null);
        assert_eq!(read_string(&raw, "c", &mut errors), Field::Null);
        assert_eq!(read_string(&raw, "missing", &mut errors), Field::Absent);
        assert!(errors.is_empty());

        assert_eq!(read_string(&raw, "d", &mut errors), Field::Absent);
        assert_eq!(
            errors.get("d").unwrap(),
            &["The d field must be a string.".to_string()]
        );
    }
}
