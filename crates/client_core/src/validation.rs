//! Client-side input checks run before any request is issued.

use shared::domain::OperationType;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter a valid number")]
    InvalidNumber,
    #[error("Division by zero is not allowed")]
    DivisionByZero,
    #[error("Please enter a username")]
    MissingUsername,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("A request is already in progress")]
    Busy,
}

/// Parses a user-entered number. Surrounding whitespace is ignored; the
/// result must be finite.
pub fn parse_number(raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::InvalidNumber);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::InvalidNumber),
    }
}

pub fn validate_operand(operation: OperationType, raw: &str) -> Result<f64, InputError> {
    let operand = parse_number(raw)?;
    if operation == OperationType::Divide && operand == 0.0 {
        return Err(InputError::DivisionByZero);
    }
    Ok(operand)
}

pub fn validate_credentials(username: &str, password: &str) -> Result<(), InputError> {
    if username.trim().is_empty() {
        return Err(InputError::MissingUsername);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(InputError::PasswordTooShort);
    }
    Ok(())
}
