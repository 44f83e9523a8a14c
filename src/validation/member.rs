//! Member profile payloads: field rules, defaults and merge semantics.

use chrono::NaiveDate;

use super::rules::{
    max_length, one_of, parse_date, profile_rules, validate_birth_date, validate_phone,
};
use super::{label, read_string, read_with, Field, Input, ValidationErrors};
use crate::db::{Gender, MemberFields, MembershipStatus, MembershipType};

const NAME_MAX: usize = 100;
const ADDRESS_MAX: usize = 500;
const PLACE_MAX: usize = 100;
const POSTAL_CODE_MAX: usize = 20;

/// A validated partial update. Outer `None` means "not supplied";
/// `Some(None)` clears an optional column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub gender: Option<Option<Gender>>,
    pub address: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub postal_code: Option<Option<String>>,
    pub membership_start_date: Option<NaiveDate>,
    pub membership_end_date: Option<Option<NaiveDate>>,
    pub membership_status: Option<MembershipStatus>,
    pub membership_type: Option<MembershipType>,
    pub emergency_contact_name: Option<Option<String>>,
    pub emergency_contact_phone: Option<Option<String>>,
}

impl MemberChanges {
    /// True when the payload carried no recognised field
    pub fn is_empty(&self) -> bool {
        *self == MemberChanges::default()
    }

    /// Merge the supplied fields over a stored record
    pub fn apply(&self, base: &MemberFields) -> MemberFields {
        fn pick<T: Clone>(change: &Option<T>, current: &T) -> T {
            change.clone().unwrap_or_else(|| current.clone())
        }

        MemberFields {
            first_name: pick(&self.first_name, &base.first_name),
            last_name: pick(&self.last_name, &base.last_name),
            phone: pick(&self.phone, &base.phone),
            date_of_birth: pick(&self.date_of_birth, &base.date_of_birth),
            gender: pick(&self.gender, &base.gender),
            address: pick(&self.address, &base.address),
            city: pick(&self.city, &base.city),
            state: pick(&self.state, &base.state),
            postal_code: pick(&self.postal_code, &base.postal_code),
            membership_start_date: pick(&self.membership_start_date, &base.membership_start_date),
            membership_end_date: pick(&self.membership_end_date, &base.membership_end_date),
            membership_status: pick(&self.membership_status, &base.membership_status),
            membership_type: pick(&self.membership_type, &base.membership_type),
            emergency_contact_name: pick(&self.emergency_contact_name, &base.emergency_contact_name),
            emergency_contact_phone: pick(
                &self.emergency_contact_phone,
                &base.emergency_contact_phone,
            ),
        }
    }
}

/// Run the cross-field pipeline over an effective (defaulted or merged) record
pub fn check_profile_rules(fields: &MemberFields, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for (field, rule) in profile_rules(today) {
        if let Some(message) = rule(fields) {
            errors.add(field, message);
        }
    }
    errors.finish()
}

fn name(input: &Input, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match read_string(input, field, errors) {
        Field::Absent => None,
        Field::Null => {
            errors.add(field, format!("The {} field is required.", label(field)));
            None
        }
        Field::Value(value) => match max_length(field, &value, NAME_MAX) {
            Ok(()) => Some(value),
            Err(e) => {
                errors.add(field, e);
                None
            }
        },
    }
}

/// Optional text column with a length limit and an extra rule
fn text(
    input: &Input,
    field: &str,
    max: usize,
    rule: fn(&str, &str) -> Result<(), String>,
    errors: &mut ValidationErrors,
) -> Option<Option<String>> {
    match read_string(input, field, errors) {
        Field::Absent => None,
        Field::Null => Some(None),
        Field::Value(value) => {
            let checked = max_length(field, &value, max).and_then(|_| rule(field, &value));
            match checked {
                Ok(()) => Some(Some(value)),
                Err(e) => {
                    errors.add(field, e);
                    None
                }
            }
        }
    }
}

fn no_rule(_: &str, _: &str) -> Result<(), String> {
    Ok(())
}

/// Nullable column: absent keeps, null clears
fn nullable<T>(field: Field<T>) -> Option<Option<T>> {
    match field {
        Field::Absent => None,
        Field::Null => Some(None),
        Field::Value(v) => Some(Some(v)),
    }
}

/// Read every recognised field, collecting field-level errors
fn read_changes(input: &Input, today: NaiveDate, errors: &mut ValidationErrors) -> MemberChanges {
    let date_of_birth = read_with(input, "date_of_birth", errors, |raw| {
        let date = parse_date("date_of_birth", raw)?;
        validate_birth_date(date, today)?;
        Ok(date)
    });

    let gender = read_with(input, "gender", errors, |raw| {
        one_of::<Gender>("gender", raw, &Gender::ALL.map(|g| g.as_str()))
    });

    let membership_status = read_with(input, "membership_status", errors, |raw| {
        one_of::<MembershipStatus>(
            "membership_status",
            raw,
            &MembershipStatus::ALL.map(|s| s.as_str()),
        )
    });

    let membership_type = read_with(input, "membership_type", errors, |raw| {
        one_of::<MembershipType>(
            "membership_type",
            raw,
            &MembershipType::ALL.map(|t| t.as_str()),
        )
    });

    let membership_start_date = read_with(input, "membership_start_date", errors, |raw| {
        parse_date("membership_start_date", raw)
    });
    let membership_end_date = read_with(input, "membership_end_date", errors, |raw| {
        parse_date("membership_end_date", raw)
    });

    MemberChanges {
        first_name: name(input, "first_name", errors),
        last_name: name(input, "last_name", errors),
        phone: text(input, "phone", POSTAL_CODE_MAX, validate_phone, errors),
        date_of_birth: nullable(date_of_birth),
        gender: nullable(gender),
        address: text(input, "address", ADDRESS_MAX, no_rule, errors),
        city: text(input, "city", PLACE_MAX, no_rule, errors),
        state: text(input, "state", PLACE_MAX, no_rule, errors),
        postal_code: text(input, "postal_code", POSTAL_CODE_MAX, no_rule, errors),
        // status, type and start date are not nullable: null keeps the current value
        membership_start_date: membership_start_date.value(),
        membership_end_date: nullable(membership_end_date),
        membership_status: membership_status.value(),
        membership_type: membership_type.value(),
        emergency_contact_name: text(input, "emergency_contact_name", NAME_MAX, no_rule, errors),
        emergency_contact_phone: text(
            input,
            "emergency_contact_phone",
            POSTAL_CODE_MAX,
            validate_phone,
            errors,
        ),
    }
}

/// Validate a new profile and fill in defaults: start date today,
/// status active, type basic.
pub fn validate_member_create(input: &Input, today: NaiveDate) -> Result<MemberFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let changes = read_changes(input, today, &mut errors);

    for field in ["first_name", "last_name"] {
        if !input.contains_key(field) && !errors.has(field) {
            errors.add(field, format!("The {} field is required.", label(field)));
        }
    }

    let (Some(first_name), Some(last_name)) = (changes.first_name.clone(), changes.last_name.clone())
    else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let fields = MemberFields {
        first_name,
        last_name,
        phone: changes.phone.flatten(),
        date_of_birth: changes.date_of_birth.flatten(),
        gender: changes.gender.flatten(),
        address: changes.address.flatten(),
        city: changes.city.flatten(),
        state: changes.state.flatten(),
        postal_code: changes.postal_code.flatten(),
        membership_start_date: changes.membership_start_date.unwrap_or(today),
        membership_end_date: changes.membership_end_date.flatten(),
        membership_status: changes.membership_status.unwrap_or_default(),
        membership_type: changes.membership_type.unwrap_or_default(),
        emergency_contact_name: changes.emergency_contact_name.flatten(),
        emergency_contact_phone: changes.emergency_contact_phone.flatten(),
    };

    check_profile_rules(&fields, today)?;
    Ok(fields)
}

/// Validate the supplied fields of an update. Cross-field rules are checked
/// separately, on the merged record (see `check_profile_rules`).
pub fn validate_member_update(input: &Input, today: NaiveDate) -> Result<MemberChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let changes = read_changes(input, today, &mut errors);
    errors.finish()?;
    Ok(changes)
}
