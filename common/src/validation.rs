// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

use crate::DurationType;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_TAG_NAME_LEN: usize = 50;
pub const MAX_TASK_NAME_LEN: usize = 100;

/// Rejections raised before anything is written to the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty.")]
    Empty { field: &'static str },

    #[error("{field} cannot be longer than {max} characters.")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid {field}: {reason}")]
    Schedule { field: &'static str, reason: String },

    #[error("total_hours is required for a finite task.")]
    MissingTotalHours,

    #[error("total_hours must be a positive number of hours, got {0}.")]
    NonPositiveTotalHours(i64),
}

/// Checks a name and returns it without surrounding whitespace, which is
/// the form that gets stored and compared for uniqueness.
fn validate_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    validate_text("Username", username, MAX_USERNAME_LEN)
}

pub fn validate_tag_name(name: &str) -> Result<String, ValidationError> {
    validate_text("Tag name", name, MAX_TAG_NAME_LEN)
}

pub fn validate_task_name(name: &str) -> Result<String, ValidationError> {
    validate_text("Task name", name, MAX_TASK_NAME_LEN)
}

/// Returns the `total_hours` value to store for the given duration mode.
///
/// Finite tasks must carry a positive number of hours. Infinite tasks never
/// store one, whatever the caller sent.
pub fn resolve_total_hours(
    duration_type: DurationType,
    total_hours: Option<i64>,
) -> Result<Option<i64>, ValidationError> {
    if let Some(hours) = total_hours {
        if hours <= 0 {
            return Err(ValidationError::NonPositiveTotalHours(hours));
        }
    }
    match duration_type {
        DurationType::Finite => total_hours
            .map(Some)
            .ok_or(ValidationError::MissingTotalHours),
        DurationType::Infinite => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_must_be_non_blank_and_bounded() {
        assert_eq!(
            validate_tag_name("   "),
            Err(ValidationError::Empty { field: "Tag name" })
        );
        assert!(validate_tag_name(&"x".repeat(MAX_TAG_NAME_LEN)).is_ok());
        assert_eq!(
            validate_tag_name(&"x".repeat(MAX_TAG_NAME_LEN + 1)),
            Err(ValidationError::TooLong {
                field: "Tag name",
                max: MAX_TAG_NAME_LEN
            })
        );
        assert!(validate_task_name(&"x".repeat(MAX_TASK_NAME_LEN)).is_ok());
        assert!(validate_task_name(&"x".repeat(MAX_TASK_NAME_LEN + 1)).is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_names_are_trimmed() {
        assert_eq!(validate_tag_name("  Work\t"), Ok("Work".to_string()));
        assert_eq!(validate_username(" alice "), Ok("alice".to_string()));
        // The limit applies to the trimmed name.
        let padded = format!("  {}  ", "x".repeat(MAX_TASK_NAME_LEN));
        assert_eq!(validate_task_name(&padded), Ok("x".repeat(MAX_TASK_NAME_LEN)));
    }

    #[test]
    fn test_resolve_total_hours() {
        assert_eq!(resolve_total_hours(DurationType::Finite, Some(10)), Ok(Some(10)));
        assert_eq!(
            resolve_total_hours(DurationType::Finite, None),
            Err(ValidationError::MissingTotalHours)
        );
        assert_eq!(
            resolve_total_hours(DurationType::Finite, Some(0)),
            Err(ValidationError::NonPositiveTotalHours(0))
        );
        assert_eq!(resolve_total_hours(DurationType::Infinite, None), Ok(None));
        // Ignored, but still has to be a sensible number.
        assert_eq!(resolve_total_hours(DurationType::Infinite, Some(5)), Ok(None));
        assert!(resolve_total_hours(DurationType::Infinite, Some(-3)).is_err());
    }
}
