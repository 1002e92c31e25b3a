//! Shared utilities for feature modules

pub mod validation;

pub use validation::{
    validate_description, validate_title, DescriptionValidationError, TitleValidationError,
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
