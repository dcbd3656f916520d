use validator::ValidateEmail;

use crate::{alias::slugify, error::AppError};

/// Maximum length for Git name
const MAX_NAME_LENGTH: usize = 60;
/// Maximum length for Git email address
const MAX_EMAIL_LENGTH: usize = 100;
/// Maximum length for a host name
const MAX_HOST_LENGTH: usize = 253;
/// Maximum length for user alias
const MAX_ALIAS_LENGTH: usize = 30;

// Validate input helper functions

/// Validates name input
pub fn validate_input_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        Err(AppError::Validation("Name cannot be empty".to_string()))
    } else if name.len() > MAX_NAME_LENGTH {
        Err(AppError::Validation(format!("Name too long (max {MAX_NAME_LENGTH} characters)")))
    } else {
        Ok(())
    }
}

/// Validates email input
pub fn validate_input_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        Err(AppError::Validation("Email cannot be empty".to_string()))
    } else if email.len() > MAX_EMAIL_LENGTH {
        Err(AppError::Validation(format!("Email too long (max {MAX_EMAIL_LENGTH} characters)")))
    } else if !email.validate_email() {
        Err(AppError::Validation("Invalid email format".to_string()))
    } else {
        Ok(())
    }
}

/// Validates host input; blank means the default host
pub fn validate_input_host(host: &str) -> Result<(), AppError> {
    let host = host.trim();
    if host.len() > MAX_HOST_LENGTH {
        Err(AppError::Validation(format!("Host too long (max {MAX_HOST_LENGTH} characters)")))
    } else if host.contains(char::is_whitespace) {
        Err(AppError::Validation("Host cannot contain whitespace".to_string()))
    } else {
        Ok(())
    }
}

/// Validates an alias input; blank means derive from the name
pub fn validate_input_alias(alias: &str) -> Result<(), AppError> {
    let alias = alias.trim();
    if alias.is_empty() {
        Ok(())
    } else if alias.len() > MAX_ALIAS_LENGTH {
        Err(AppError::Validation(format!("Alias too long (max {MAX_ALIAS_LENGTH} characters)")))
    } else if slugify(alias).is_empty() {
        Err(AppError::Validation("Alias needs at least one letter or digit".to_string()))
    } else {
        Ok(())
    }
}
