//! Validation Utilities
//!
//! Input validation functions for user data and API requests.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > 255 {
        return false;
    }

    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z\s\-']+$").expect("Failed to compile name regex"));

    regex.is_match(trimmed)
}

/// Validates a phone number: optional leading +, 8 to 15 digits
pub fn validate_phone(phone: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("Failed to compile phone regex"));

    regex.is_match(phone.trim())
}

/// Validates a username: lowercase alphanumeric, dots, underscores, 3-64 chars
pub fn validate_username(username: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9._]{3,64}$").expect("Failed to compile username regex")
    });

    regex.is_match(username)
}

/// Derive a username from the local part of an email address
pub fn username_from_email(email: &str) -> String {
    normalize_email(email)
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '_'))
        .collect()
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_name"))
    }
}

/// Custom validator for phone fields using the validator crate
pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Custom validator for username fields using the validator crate
pub fn username_validator(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@domain.co.uk"));
        assert!(!validate_email("invalid.email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("John Doe"));
        assert!(validate_name("Mary-Jane O'Connor"));
        assert!(!validate_name(""));
        assert!(!validate_name("John123"));
        assert!(!validate_name(&"a".repeat(256))); // Too long
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("081234567890"));
        assert!(validate_phone("+6281234567890"));
        assert!(!validate_phone("1234"));
        assert!(!validate_phone("phone-number"));
        assert!(!validate_phone(""));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("john.doe"));
        assert!(validate_username("user_01"));
        assert!(!validate_username("ab"));
        assert!(!validate_username("John"));
        assert!(!validate_username("user name"));
    }

    #[test]
    fn test_username_from_email() {
        assert_eq!(username_from_email("John.Doe@example.com"), "john.doe");
        assert_eq!(username_from_email("user+tag@example.com"), "usertag");
    }
}
