//! Shared validation utilities
//!
//! Lengths are counted in characters, not bytes.

use thiserror::Error;

/// Maximum length of a Todo title
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum length of a Todo description
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TitleValidationError {
    #[error("Title is required and cannot be empty")]
    Required,

    #[error("Title must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptionValidationError {
    #[error("Description must be at most {max_length} characters")]
    TooLong { max_length: usize },
}

/// Validate a title
///
/// # Rules
/// - Must not be empty or whitespace-only
/// - Must not exceed `max_length` characters once trimmed
pub fn validate_title(title: &str, max_length: usize) -> Result<(), TitleValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TitleValidationError::Required);
    }

    if trimmed.chars().count() > max_length {
        return Err(TitleValidationError::TooLong { max_length });
    }

    Ok(())
}

/// Validate a free-text description. Empty is allowed.
pub fn validate_description(
    description: &str,
    max_length: usize,
) -> Result<(), DescriptionValidationError> {
    if description.chars().count() > max_length {
        return Err(DescriptionValidationError::TooLong { max_length });
    }
    Ok(())
}
