//! Field rules and the cross-field rule pipeline for member profiles.

use chrono::{DateTime, Months, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

use super::label;
use crate::db::{MemberFields, MembershipStatus};

lazy_static! {
    /// Local phone numbers: a leading 0 followed by 9 or 10 digits
    static ref PHONE_REGEX: Regex = Regex::new(r"^0\d{9,10}$").unwrap();

    /// Pragmatic email shape check: local@domain.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    ).unwrap();
}

/// Minimum age of a member, in years
pub const MINIMUM_AGE_YEARS: u32 = 18;

pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!(
            "The {} field must not be greater than {} characters.",
            label(field),
            max
        ));
    }
    Ok(())
}

pub fn validate_email(field: &str, value: &str) -> Result<(), String> {
    if !EMAIL_REGEX.is_match(value) {
        return Err(format!(
            "The {} field must be a valid email address.",
            label(field)
        ));
    }
    max_length(field, value, 255)
}

pub fn validate_phone(field: &str, value: &str) -> Result<(), String> {
    if !PHONE_REGEX.is_match(value) {
        return Err(format!(
            "The {} must be 10-11 digits starting with 0 (e.g. 0123456789).",
            label(field)
        ));
    }
    Ok(())
}

/// Parse `YYYY-MM-DD`, or take the date part of an RFC 3339 timestamp
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| format!("The {} field must be a valid date.", label(field)))
}

/// Parse one of a fixed set of lowercase values
pub fn one_of<T: FromStr>(field: &str, value: &str, allowed: &[&str]) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("The selected {} is invalid. Allowed: {}.", label(field), allowed.join(", ")))
}

/// Latest birth date that is at least `MINIMUM_AGE_YEARS` old on `today`
pub fn adult_cutoff(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(MINIMUM_AGE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN)
}

/// Birth date must be in the past and at least `MINIMUM_AGE_YEARS` ago
pub fn validate_birth_date(date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if date >= today {
        return Err("Date of birth must be in the past.".to_string());
    }
    if date > adult_cutoff(today) {
        return Err(format!(
            "Member must be at least {} years old.",
            MINIMUM_AGE_YEARS
        ));
    }
    Ok(())
}

/// A rule over the whole profile record; `None` means it passes
pub type Rule = Box<dyn Fn(&MemberFields) -> Option<String> + Send + Sync>;

/// End date, when present, must come strictly after the start date
pub fn end_date_after_start() -> Rule {
    Box::new(|fields: &MemberFields| match fields.membership_end_date {
        Some(end) if end <= fields.membership_start_date => {
            Some("Membership end date must be after start date.".to_string())
        }
        _ => None,
    })
}

/// An active membership cannot carry an end date before `today`
pub fn active_requires_current_end_date(today: NaiveDate) -> Rule {
    Box::new(move |fields: &MemberFields| {
        if fields.membership_status != MembershipStatus::Active {
            return None;
        }
        match fields.membership_end_date {
            Some(end) if end < today => Some(
                "Cannot set status as \"active\" when membership end date is in the past."
                    .to_string(),
            ),
            _ => None,
        }
    })
}

/// The cross-field pipeline, tagged with the field each failure is reported on
pub fn profile_rules(today: NaiveDate) -> Vec<(&'static str, Rule)> {
    vec![
        ("membership_end_date", end_date_after_start()),
        ("membership_status", active_requires_current_end_date(today)),
    ]
}
