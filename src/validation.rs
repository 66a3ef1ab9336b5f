//! Input rules for account and delivery forms.
//!
//! Every validator is a pure function of its inputs and returns the list of
//! human-readable problems it found. An empty list means the input is valid.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::DeliveryStatus;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_TRACKING_NUMBER_LEN: usize = 64;
pub const MAX_ADDRESS_LEN: usize = 512;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

/// Trims and lowercases an email the way it is stored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_registration(
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Vec<String> {
    let mut errors = Vec::new();
    if email.is_empty() {
        errors.push("Email is required.".to_string());
    } else if !is_valid_email(email) {
        errors.push("Please enter a valid email address.".to_string());
    }
    errors.extend(validate_new_password(password, confirm_password));
    if full_name.chars().count() > MAX_NAME_LEN {
        errors.push("Name is too long.".to_string());
    }
    errors
}

/// Password rules shared by registration, reset and change-password.
pub fn validate_new_password(password: &str, confirm_password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.is_empty() {
        errors.push("Password is required.".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("Password must be at least 8 characters long.".to_string());
    }
    if confirm_password != password {
        errors.push("Passwords do not match.".to_string());
    }
    errors
}

/// Parses an amount in minor currency units. Whole, non-negative numbers only.
pub fn parse_amount(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Amount is required.".to_string());
    }
    match raw.parse::<i64>() {
        Ok(amount) if amount < 0 => Err("Amount cannot be negative.".to_string()),
        Ok(amount) => Ok(amount),
        Err(_) => Err("Amount must be a whole number.".to_string()),
    }
}

pub fn parse_status(raw: &str) -> Result<DeliveryStatus, String> {
    raw.trim()
        .parse::<DeliveryStatus>()
        .map_err(|_| "Invalid status.".to_string())
}

pub fn validate_delivery(
    tracking_number: &str,
    address: Option<&str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Vec<String> {
    let mut errors = Vec::new();
    if tracking_number.is_empty() {
        errors.push("Tracking number is required.".to_string());
    } else if tracking_number.chars().count() > MAX_TRACKING_NUMBER_LEN {
        errors.push("Tracking number is too long.".to_string());
    }
    if address.is_some_and(|a| a.chars().count() > MAX_ADDRESS_LEN) {
        errors.push("Address is too long.".to_string());
    }
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                errors.push("Latitude must be between -90 and 90.".to_string());
            }
            if !(-180.0..=180.0).contains(&lng) {
                errors.push("Longitude must be between -180 and 180.".to_string());
            }
        }
        (None, None) => {}
        _ => errors.push("Latitude and longitude must be provided together.".to_string()),
    }
    errors
}
