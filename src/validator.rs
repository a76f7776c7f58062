// src/validator.rs - Contact field validation shared by labs and staff accounts
use std::collections::HashMap;
use serde::Serialize;
use regex::Regex;
use lazy_static::lazy_static;
use crate::error::ApiError;
use crate::models::StaffAssignmentInput;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ()-]{5,17}[0-9]$").unwrap();
}

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn to_api_error(&self) -> ApiError {
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let message = fields
            .into_iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        ApiError::ValidationError(message)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.to_api_error())
        }
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{} cannot be empty", field))
        } else {
            Ok(())
        }
    }

    pub fn email(value: &str) -> Result<(), String> {
        if EMAIL_REGEX.is_match(value.trim()) {
            Ok(())
        } else {
            Err("Invalid email format".to_string())
        }
    }

    pub fn phone(value: &str) -> Result<(), String> {
        if PHONE_REGEX.is_match(value.trim()) {
            Ok(())
        } else {
            Err("Invalid phone number".to_string())
        }
    }
}

/// Present text fields must keep at least one character after trimming,
/// since the trimmed value is what gets stored.
pub fn reject_blank_fields(fields: &[(&str, Option<&str>)]) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (field, value) in fields {
        if let Some(value) = value {
            if let Err(e) = FieldValidator::not_empty(value, field) {
                result.add_error(*field, e);
            }
        }
    }
    result
}

// ==================== STAFF ASSIGNMENT ====================

/// Checks each contact triple of a lab staff assignment. Blank values are
/// treated as absent; a name without any way to reach the person is refused.
pub fn validate_staff_assignment(staff: &StaffAssignmentInput) -> ValidationResult {
    let mut result = ValidationResult::new();

    let contacts = [
        ("incharge", &staff.incharge_name, &staff.incharge_email, &staff.incharge_phone),
        ("assistant", &staff.assistant_name, &staff.assistant_email, &staff.assistant_phone),
    ];

    for (prefix, name, email, phone) in contacts {
        let email = email.as_deref().filter(|v| !v.trim().is_empty());
        let phone = phone.as_deref().filter(|v| !v.trim().is_empty());

        if let Some(email) = email {
            if let Err(e) = FieldValidator::email(email) {
                result.add_error(format!("{}_email", prefix), e);
            }
        }
        if let Some(phone) = phone {
            if let Err(e) = FieldValidator::phone(phone) {
                result.add_error(format!("{}_phone", prefix), e);
            }
        }
        if let Some(name) = name.as_deref() {
            if FieldValidator::not_empty(name, "name").is_ok() && email.is_none() && phone.is_none() {
                result.add_error(
                    format!("{}_name", prefix),
                    format!("{} needs an email or phone number", prefix),
                );
            }
        }
    }

    result
}
