//! Submission validator.
//!
//! [`validate`] turns a raw [`ContactCandidate`] into a [`NormalizedContact`]
//! or the full, ordered list of [`FieldError`]s. Every field is checked on
//! every call; errors accumulate rather than short-circuit.

use serde::Serialize;
use validator::ValidateLength;

use crate::schemas::contact::ContactCandidate;

pub const NAME_MIN: u64 = 2;
pub const NAME_MAX: u64 = 100;
pub const MESSAGE_MIN: u64 = 10;
pub const MESSAGE_MAX: u64 = 1000;

/// The rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Required,
    Length,
    Format,
}

/// A single failed rule, as reported in the `details` of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: Rule,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, rule: Rule, message: impl Into<String>) -> Self {
        Self { field, rule, message: message.into() }
    }
}

/// A submission that passed validation, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Validate and normalize a candidate submission.
pub fn validate(candidate: &ContactCandidate) -> Result<NormalizedContact, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = candidate.name.as_deref().unwrap_or_default().trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", Rule::Required, "Name is required"));
    } else if !name.validate_length(Some(NAME_MIN), Some(NAME_MAX), None) {
        errors.push(FieldError::new(
            "name",
            Rule::Length,
            format!("Name must be between {NAME_MIN} and {NAME_MAX} characters"),
        ));
    }

    let email = candidate.email.as_deref().unwrap_or_default().trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", Rule::Required, "Email is required"));
    } else if !is_plausible_email(email) {
        errors.push(FieldError::new(
            "email",
            Rule::Format,
            "Please provide a valid email address",
        ));
    }

    let message = candidate.message.as_deref().unwrap_or_default().trim();
    if message.is_empty() {
        errors.push(FieldError::new("message", Rule::Required, "Message is required"));
    } else if !message.validate_length(Some(MESSAGE_MIN), Some(MESSAGE_MAX), None) {
        errors.push(FieldError::new(
            "message",
            Rule::Length,
            format!("Message must be between {MESSAGE_MIN} and {MESSAGE_MAX} characters"),
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NormalizedContact {
        name: name.to_owned(),
        email: email.to_lowercase(),
        message: message.to_owned(),
    })
}

/// `local@domain.tld`: no whitespace, exactly one `@`, a non-empty local
/// part, and a `.` inside the domain with at least one character on each
/// side of it.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
