//! Input validation shared by the auth and user routes

use ident_db::utils::normalize_cpf;

use crate::error::ApiError;

/// Maximum allowed name length
const MAX_NAME_LENGTH: usize = 100;
/// Maximum allowed password length (prevent DoS with very large passwords)
pub const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum password length for new passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate and normalize a CPF to its 11 digits
pub fn validate_cpf(cpf: &str) -> Result<String, ApiError> {
    if cpf.trim().is_empty() {
        return Err(ApiError::BadRequest("cpf is required".to_string()));
    }
    normalize_cpf(cpf).ok_or_else(|| ApiError::BadRequest("cpf must have 11 digits".to_string()))
}

/// Validate a required name field
pub fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Validate a password presented for authentication
pub fn validate_presented_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("password is required".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Validate a password about to be stored
pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    validate_presented_password(password)
}
