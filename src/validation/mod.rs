/// User input validation module
///
/// Checks upsert payloads before they reach the record store
use crate::{error::DirectoryError, user_store::UserInput};

/// Maximum name length in characters
pub const MAX_NAME_CHARS: usize = 200;

/// Maximum email length in characters
pub const MAX_EMAIL_CHARS: usize = 320;

/// Maximum avatar reference length in characters
pub const MAX_AVATAR_CHARS: usize = 2048;

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

/// Validation result with detailed errors
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an upsert payload
pub fn validate_user_input(input: &UserInput) -> ValidationResult {
    let mut errors = Vec::new();

    // Required: name
    if input.name.trim().is_empty() {
        errors.push(ValidationError {
            path: "$.name".to_string(),
            message: "Required field 'name' is empty".to_string(),
        });
    } else if input.name.chars().count() > MAX_NAME_CHARS {
        errors.push(ValidationError {
            path: "$.name".to_string(),
            message: format!(
                "Name exceeds maximum length of {} characters",
                MAX_NAME_CHARS
            ),
        });
    }

    // Optional: email
    if let Some(email) = input.email.as_deref() {
        if email.chars().count() > MAX_EMAIL_CHARS {
            errors.push(ValidationError {
                path: "$.email".to_string(),
                message: format!(
                    "Email exceeds maximum length of {} characters",
                    MAX_EMAIL_CHARS
                ),
            });
        } else if !email.is_empty() && !email.contains('@') {
            errors.push(ValidationError {
                path: "$.email".to_string(),
                message: "Email must contain '@'".to_string(),
            });
        }
    }

    // Optional: avatar (a URL whose last segment names the stored file)
    if let Some(avatar) = input.avatar_ref() {
        if avatar.chars().count() > MAX_AVATAR_CHARS {
            errors.push(ValidationError {
                path: "$.avatar".to_string(),
                message: format!(
                    "Avatar exceeds maximum length of {} characters",
                    MAX_AVATAR_CHARS
                ),
            });
        } else if matches!(avatar.rsplit('/').next(), Some("" | "." | "..")) {
            errors.push(ValidationError {
                path: "$.avatar".to_string(),
                message: "Avatar must reference a file".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert validation errors to DirectoryError
pub fn validation_errors_to_directory_error(errors: Vec<ValidationError>) -> DirectoryError {
    let messages: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.path, e.message))
        .collect();
    DirectoryError::Validation(format!("User validation failed:\n  - {}", messages.join("\n  - ")))
}
