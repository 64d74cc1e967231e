//! Field-level input validation, checked before any store mutation.

use rapida_domain::seats::is_valid_seat;
use rapida_domain::Passenger;

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;
pub const DOCUMENT_LEN: usize = 8;

/// A failed check, naming the offending field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_not_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

/// Person names: bounded length, letters and spaces only
pub fn validate_name(value: &str, field: &'static str) -> Result<(), ValidationError> {
    validate_not_blank(value, field)?;
    let len = value.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ValidationError::new(
            field,
            format!("must have at least {} characters", MIN_NAME_LEN),
        ));
    }
    if len > MAX_NAME_LEN {
        return Err(ValidationError::new(
            field,
            format!("must not exceed {} characters", MAX_NAME_LEN),
        ));
    }
    if !value.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err(ValidationError::new(field, "must contain only letters"));
    }
    Ok(())
}

/// National document numbers are exactly eight digits
pub fn validate_document_id(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value, "document_id")?;
    if value.len() != DOCUMENT_LEN || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "document_id",
            format!("must be exactly {} digits", DOCUMENT_LEN),
        ));
    }
    Ok(())
}

pub fn validate_seat(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value, "seat")?;
    if !is_valid_seat(value) {
        return Err(ValidationError::new(
            "seat",
            format!("'{}' is not a seat on this coach", value),
        ));
    }
    Ok(())
}

/// All four passenger fields, first failure wins
pub fn validate_passenger(passenger: &Passenger) -> Result<(), ValidationError> {
    validate_name(&passenger.first_name, "first_name")?;
    validate_name(&passenger.last_name, "last_name")?;
    validate_document_id(&passenger.document_id)?;
    validate_seat(&passenger.seat)?;
    Ok(())
}
