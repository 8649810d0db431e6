//! Input validation for request bodies and path parameters.
//!
//! Every failure is an `Error::Validation` naming the offending field, so the
//! client receives `{"type": "request_validation", "errors": [{"path", ...}]}`.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::{Error, Result},
    models::{
        is_object_id,
        shifts::{NewShift, ShiftSummaryRequest, UpdateShift},
        users::{Address, CreateUser, UpdateUser},
    },
};

pub const OBJECT_ID_PATTERN: &str = "^[a-f0-9]{24}$";
pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@<>()\[\],;:]+@[^\s@<>()\[\],;:]+\.[^\s@<>()\[\],;:]+$")
        .expect("email pattern is a valid regex")
});

/// Validates email format
///
/// # Arguments
/// * `email` - The email address to validate, surrounding whitespace ignored
///
/// # Returns
/// * `Ok(())` if the email is valid
/// * `Err(Error::Validation)` on the `email` field otherwise
///
/// # Examples
/// ```
/// use shiftdesk::validation::validate_email;
///
/// validate_email("user@example.com").unwrap();
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.len() > 254 || email.contains("..") || !EMAIL_RE.is_match(email) {
        return Err(Error::validation("email", "must match format \"email\""));
    }

    Ok(())
}

/// Validates password length and whitespace
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(
            "password",
            format!("must NOT have fewer than {} characters", MIN_PASSWORD_LENGTH),
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(Error::validation(
            "password",
            format!("must NOT have more than {} characters", MAX_PASSWORD_LENGTH),
        ));
    }

    if password.chars().any(char::is_whitespace) {
        return Err(Error::validation("password", "must not contain whitespace"));
    }

    Ok(())
}

/// Validates a 24-character hex object id held in `field`
pub fn validate_object_id(field: &str, value: &str) -> Result<()> {
    if !is_object_id(value) || value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::validation(
            field,
            format!("must match pattern \"{}\"", OBJECT_ID_PATTERN),
        ));
    }

    Ok(())
}

/// Rejects empty or whitespace-only strings
pub fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must NOT be empty"));
    }

    Ok(())
}

pub fn validate_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(field, "must be >= 0"));
    }

    Ok(())
}

fn validate_address(field: &str, address: &Address) -> Result<()> {
    validate_required(&format!("{field}/street"), &address.street)?;
    validate_required(&format!("{field}/city"), &address.city)?;
    validate_required(&format!("{field}/postcode"), &address.postcode)
}

pub fn validate_create_user(body: &CreateUser) -> Result<()> {
    validate_email(&body.email)?;
    validate_password(&body.password)?;
    validate_required("name", &body.name)?;
    if let Some(address) = &body.address {
        validate_address("address", address)?;
    }
    if let Some(deposit) = body.deposit {
        validate_non_negative("deposit", deposit)?;
    }
    Ok(())
}

pub fn validate_update_user(body: &UpdateUser) -> Result<()> {
    if let Some(email) = &body.email {
        validate_email(email)?;
    }
    if let Some(password) = &body.password {
        validate_password(password)?;
    }
    if let Some(name) = &body.name {
        validate_required("name", name)?;
    }
    if let Some(address) = &body.address {
        validate_address("address", address)?;
    }
    if let Some(deposit) = body.deposit {
        validate_non_negative("deposit", deposit)?;
    }
    Ok(())
}

pub fn validate_new_shift(body: &NewShift) -> Result<()> {
    validate_object_id("client/id", &body.client.id)?;
    validate_required("client/name", &body.client.name)?;
    validate_email(&body.client.email)
        .map_err(|_| Error::validation("client/email", "must match format \"email\""))?;
    validate_address("client/address", &body.client.address)?;
    validate_object_id("cleaner/id", &body.cleaner.id)?;
    validate_required("cleaner/name", &body.cleaner.name)?;
    validate_non_negative("hours", body.hours)?;
    validate_non_negative("amount", body.amount)?;
    if let Some(commission) = body.commission {
        validate_non_negative("commission", commission)?;
    }
    Ok(())
}

pub fn validate_update_shift(body: &UpdateShift) -> Result<()> {
    if let Some(hours) = body.hours {
        validate_non_negative("hours", hours)?;
    }
    if let Some(amount) = body.amount {
        validate_non_negative("amount", amount)?;
    }
    if let Some(commission) = body.commission {
        validate_non_negative("commission", commission)?;
    }
    Ok(())
}

pub fn validate_summary_request(body: &ShiftSummaryRequest) -> Result<()> {
    if let Some(client) = &body.client {
        validate_object_id("client", client)?;
    }
    if let Some(cleaner) = &body.cleaner {
        validate_object_id("cleaner", cleaner)?;
    }
    if let (Some(from), Some(to)) = (body.from, body.to) {
        if from > to {
            return Err(Error::validation("from", "must not be after \"to\""));
        }
    }
    Ok(())
}
