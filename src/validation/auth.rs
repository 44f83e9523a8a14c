//! Login and registration payloads.

use super::rules::{max_length, validate_email};
use super::{label, read_string, Field, Input, ValidationErrors};
use crate::config::PasswordPolicy;

/// Validated login payload
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Validated registration payload
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

fn required(field: &str, value: Field<String>, errors: &mut ValidationErrors) -> Option<String> {
    match value {
        Field::Value(v) => Some(v),
        Field::Absent | Field::Null => {
            // a type error may already be recorded for this field
            if !errors.has(field) {
                errors.add(field, format!("The {} field is required.", label(field)));
            }
            None
        }
    }
}

/// Password read without trimming: whitespace is significant
fn read_password(input: &Input, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match input.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {
            errors.add(field, format!("The {} field is required.", label(field)));
            None
        }
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", label(field)));
            None
        }
    }
}

fn read_email(input: &Input, errors: &mut ValidationErrors) -> Option<String> {
    let email = required("email", read_string(input, "email", errors), errors)?;
    match validate_email("email", &email) {
        Ok(()) => Some(email.to_lowercase()),
        Err(e) => {
            errors.add("email", e);
            None
        }
    }
}

pub fn validate_login(input: &Input) -> Result<Credentials, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = read_email(input, &mut errors);
    let password = read_password(input, "password", &mut errors);

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(Credentials { email, password }),
        _ => Err(errors),
    }
}

/// Check a password against the configured policy, returning every unmet requirement
pub fn password_violations(password: &str, policy: &PasswordPolicy) -> Vec<String> {
    let mut violations = Vec::new();

    if password.chars().count() < policy.min_length {
        violations.push(format!(
            "The password field must be at least {} characters.",
            policy.min_length
        ));
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if policy.require_mixed_case && !(has_uppercase && has_lowercase) {
        violations.push(
            "The password field must contain at least one uppercase and one lowercase letter."
                .to_string(),
        );
    }
    if policy.require_digit && !has_digit {
        violations.push("The password field must contain at least one number.".to_string());
    }
    if policy.require_symbol && !has_symbol {
        violations.push("The password field must contain at least one symbol.".to_string());
    }

    // Check for common weak passwords
    let common_passwords = [
        "password", "12345678", "qwerty123", "letmein1", "welcome1", "iloveyou", "changeme",
    ];
    let lower = password.to_lowercase();
    if common_passwords.iter().any(|common| lower.starts_with(common)) {
        violations.push("The password is too common. Please choose a stronger password.".to_string());
    }

    violations
}

pub fn validate_registration(
    input: &Input,
    policy: &PasswordPolicy,
) -> Result<Registration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = required("name", read_string(input, "name", &mut errors), &mut errors);
    if let Some(name) = &name {
        errors.check("name", max_length("name", name, 255));
    }

    let email = read_email(input, &mut errors);
    let password = read_password(input, "password", &mut errors);

    if let Some(password) = &password {
        for violation in password_violations(password, policy) {
            errors.add("password", violation);
        }

        let confirmation = input
            .get("password_confirmation")
            .and_then(|v| v.as_str());
        if confirmation != Some(password.as_str()) {
            errors.add("password", "The password field confirmation does not match.");
        }
    }

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(Registration {
            name,
            email,
            password,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn input(value: Value) -> Input {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_login_requires_fields() {
        let errors = validate_login(&input(json!({}))).unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("password"));
    }

    #[test]
    fn test_login_rejects_bad_email_only() {
        let errors =
            validate_login(&input(json!({"email": "nope", "password": "x"}))).unwrap_err();
        assert!(errors.has("email"));
        assert!(!errors.has("password"));
    }

    #[test]
    fn test_login_does_not_check_strength() {
        let creds =
            validate_login(&input(json!({"email": " Me@Example.COM ", "password": "a"}))).unwrap();
        assert_eq!(creds.email, "me@example.com");
        assert_eq!(creds.password, "a");
    }

    #[test]
    fn test_registration_valid() {
        let reg = validate_registration(
            &input(json!({
                "name": "Nur Aina",
                "email": "aina@example.com",
                "password": "Str0ngPass",
                "password_confirmation": "Str0ngPass"
            })),
            &PasswordPolicy::default(),
        )
        .unwrap();
        assert_eq!(reg.name, "Nur Aina");
        assert_eq!(reg.email, "aina@example.com");
    }

    #[test]
    fn test_registration_confirmation_mismatch() {
        let errors = validate_registration(
            &input(json!({
                "name": "Nur Aina",
                "email": "aina@example.com",
                "password": "Str0ngPass",
                "password_confirmation": "Str0ngPas"
            })),
            &PasswordPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            &["The password field confirmation does not match.".to_string()]
        );
    }

    #[test]
    fn test_registration_collects_all_fields() {
        let errors = validate_registration(
            &input(json!({"email": "bad", "password": "short"})),
            &PasswordPolicy::default(),
        )
        .unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        // too short, no uppercase, no digit, no confirmation
        assert_eq!(errors.get("password").unwrap().len(), 4);
    }

    #[test]
    fn test_password_policy_is_configurable() {
        let strict = PasswordPolicy {
            min_length: 12,
            require_mixed_case: true,
            require_digit: true,
            require_symbol: true,
        };
        assert_eq!(password_violations("Abcdefgh1234", &strict).len(), 1);
        assert!(password_violations("Abcdefgh123!", &strict).is_empty());

        let lax = PasswordPolicy {
            min_length: 4,
            require_mixed_case: false,
            require_digit: false,
            require_symbol: false,
        };
        assert!(password_violations("abcd", &lax).is_empty());
    }

    #[test]
    fn test_common_password_rejected() {
        let violations = password_violations("Password123", &PasswordPolicy::default());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("too common"));
    }
}
