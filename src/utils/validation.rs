//! Validation utilities for registration input

use std::collections::HashMap;
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{AppError, Result};

const MIN_PASSWORD_LEN: usize = 8;
const MIN_LOGIN_LEN: usize = 3;

fn login_charset() -> &'static Regex {
    static LOGIN_RE: OnceLock<Regex> = OnceLock::new();
    LOGIN_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("static regex"))
}

/// Check password strength
///
/// # Returns
/// Every rule the password breaks, empty when it is acceptable
pub fn password_problems(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!("Must be at least {} characters long", MIN_PASSWORD_LEN));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push("Must contain a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push("Must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Must contain a digit".to_string());
    }

    errors
}

/// Check login format
///
/// # Returns
/// Every rule the login breaks, empty when it is acceptable
pub fn login_problems(login: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if login.chars().count() < MIN_LOGIN_LEN {
        errors.push(format!("Login must be at least {} characters long", MIN_LOGIN_LEN));
    }
    if !login_charset().is_match(login) {
        errors.push("Login may only contain letters, digits, dots, hyphens and underscores".to_string());
    }

    errors
}

/// Validate registration credentials, collecting problems per field
pub fn validate_registration(login: &str, password: &str) -> Result<()> {
    let mut errors = HashMap::new();

    let login_errors = login_problems(login);
    if !login_errors.is_empty() {
        errors.insert("login".to_string(), login_errors);
    }
    let password_errors = password_problems(password);
    if !password_errors.is_empty() {
        errors.insert("senha".to_string(), password_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation {
            message: "Invalid registration data".to_string(),
            errors,
        })
    }
}
