//! Client-side validation of user input.
//!
//! Every check here runs before a request is issued; a failing check means
//! the operation is never attempted.

use thiserror::Error;

use crate::schema::PropertyKind;

/// Maximum number of characters in an attribute name.
pub const MAX_ATTRIBUTE_NAME_LEN: usize = 50;

/// Input rejected before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("attribute name must not be empty")]
    EmptyAttributeName,

    #[error("attribute name must be at most {max} characters, got {len}")]
    AttributeNameTooLong { len: usize, max: usize },

    #[error("attribute name `{0}` may only contain letters, digits and underscores")]
    InvalidAttributeName(String),

    #[error("class name must not be empty")]
    EmptyClassName,

    #[error("property value must not be empty")]
    EmptyPropertyValue,

    #[error("`{kind}` expects a non-negative whole number, got `{value}`")]
    InvalidLength { kind: PropertyKind, value: String },

    #[error("attribute update must change the name or the data type")]
    EmptyAttributeUpdate,

    #[error("unknown data type `{0}`")]
    UnknownDataType(String),

    #[error("unknown property kind `{0}`")]
    UnknownPropertyKind(String),

    #[error("unknown relationship type `{0}` (expected 1-1, 1-N or N-N)")]
    UnknownRelationKind(String),
}

/// Validates an attribute name.
///
/// Accepts exactly the strings of 1 to [`MAX_ATTRIBUTE_NAME_LEN`] characters
/// drawn from `[A-Za-z0-9_]`.
///
/// # Examples
///
/// ```
/// use kinro_core::validation::validate_attribute_name;
///
/// assert!(validate_attribute_name("birth_date").is_ok());
/// assert!(validate_attribute_name("birth date").is_err());
/// assert!(validate_attribute_name("").is_err());
/// ```
pub fn validate_attribute_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyAttributeName);
    }

    let len = name.chars().count();
    if len > MAX_ATTRIBUTE_NAME_LEN {
        return Err(ValidationError::AttributeNameTooLong {
            len,
            max: MAX_ATTRIBUTE_NAME_LEN,
        });
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidAttributeName(name.to_string()));
    }

    Ok(())
}

/// Validates a class name: anything that is not blank.
pub fn validate_class_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyClassName);
    }
    Ok(())
}

/// Validates a property value against its kind.
///
/// Length kinds take a non-negative whole number; other kinds take any
/// non-blank value.
pub fn validate_property_value(kind: PropertyKind, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyPropertyValue);
    }

    if kind.takes_length() && value.parse::<u32>().is_err() {
        return Err(ValidationError::InvalidLength {
            kind,
            value: value.to_string(),
        });
    }

    Ok(())
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn accepts_valid_names(name in "[a-zA-Z0-9_]{1,50}") {
            prop_assert!(validate_attribute_name(&name).is_ok());
        }

        #[test]
        fn rejects_overlong_names(name in "[a-zA-Z0-9_]{51,80}") {
            let is_too_long = matches!(
                validate_attribute_name(&name),
                Err(ValidationError::AttributeNameTooLong { .. })
            );
            prop_assert!(is_too_long);
        }

        #[test]
        fn rejects_any_foreign_character(
            prefix in "[a-zA-Z0-9_]{0,20}",
            bad in "[^a-zA-Z0-9_]",
            suffix in "[a-zA-Z0-9_]{0,20}",
        ) {
            let name = format!("{prefix}{bad}{suffix}");
            prop_assert!(validate_attribute_name(&name).is_err());
        }
    }
}
