// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Validation functions for resource names, images and paths.
//!
//! Prevents path traversal, shell metacharacters reaching kubectl, and names
//! the API server would reject half-way through an apply.

use std::path::Path;

use thiserror::Error;

/// Maximum allowed length for string fields.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length of an RFC 1123 label.
pub const MAX_NAME_LENGTH: usize = 63;

/// Maximum allowed length for path fields.
const MAX_PATH_LENGTH: usize = 1024;

/// Characters a shell would interpret.
const SHELL_METACHARACTERS: [char; 15] = [
    ';', '&', '|', '`', '$', '(', ')', '{', '}', '<', '>', '\n', '\r', '\0', ' ',
];

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Path contains traversal sequences.
    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
    /// Path is malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// Image reference is invalid.
    #[error("Invalid image reference: {0}")]
    InvalidImage(String),
    /// Executable reference is unsafe to hand to a shell.
    #[error("Invalid executable for {field}: {reason}")]
    InvalidExecutable { field: String, reason: String },
    /// Resource name is not an RFC 1123 label.
    #[error("Invalid resource name for {field}: {reason}")]
    InvalidName { field: String, reason: String },
    /// Field exceeds maximum length.
    #[error("Field '{field}' exceeds maximum length of {max}")]
    MaxLengthExceeded { field: String, max: usize },
    /// Field is empty but required.
    #[error("Field '{0}' cannot be empty")]
    EmptyField(String),
}

/// Validate a path for security issues.
///
/// Checks for path traversal, null bytes, and length limits.
pub fn validate_path(path: &str, field_name: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyField(field_name.to_string()));
    }

    if path.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::MaxLengthExceeded {
            field: field_name.to_string(),
            max: MAX_PATH_LENGTH,
        });
    }

    if path.contains('\0') {
        return Err(ValidationError::InvalidPath(format!(
            "{}: contains null byte",
            field_name
        )));
    }

    let path_obj = Path::new(path);
    for component in path_obj.components() {
        if let std::path::Component::ParentDir = component {
            return Err(ValidationError::PathTraversal(format!(
                "{}: contains '..' sequence",
                field_name
            )));
        }
    }

    Ok(())
}

/// Validate a container image reference.
///
/// Rejects shell metacharacters and invalid name formats.
pub fn validate_image(image: &str) -> Result<(), ValidationError> {
    if image.is_empty() {
        return Err(ValidationError::EmptyField("image".to_string()));
    }

    if image.len() > MAX_FIELD_LENGTH {
        return Err(ValidationError::MaxLengthExceeded {
            field: "image".to_string(),
            max: MAX_FIELD_LENGTH,
        });
    }

    for ch in SHELL_METACHARACTERS {
        if image.contains(ch) {
            return Err(ValidationError::InvalidImage(format!(
                "contains forbidden character: {:?}",
                ch
            )));
        }
    }

    let name_part = image.rsplit_once(':').map(|(name, _)| name).unwrap_or(image);

    if name_part.starts_with('-') || name_part.starts_with('.') {
        return Err(ValidationError::InvalidImage(
            "name cannot start with dash or dot".to_string(),
        ));
    }

    Ok(())
}

/// Validate a program name or path such as the kubectl binary.
///
/// Path rules apply, plus shell metacharacters and a leading dash are rejected.
pub fn validate_executable(program: &str, field_name: &str) -> Result<(), ValidationError> {
    validate_path(program, field_name)?;

    let invalid = |reason: String| ValidationError::InvalidExecutable {
        field: field_name.to_string(),
        reason,
    };
    if let Some(ch) = SHELL_METACHARACTERS.iter().find(|c| program.contains(**c)) {
        return Err(invalid(format!("contains forbidden character: {:?}", ch)));
    }
    if program.starts_with('-') {
        return Err(invalid("cannot start with a dash".to_string()));
    }

    Ok(())
}

/// Validate a Kubernetes object name as an RFC 1123 label.
///
/// Lowercase alphanumerics and dashes, starting and ending alphanumeric.
pub fn validate_resource_name(name: &str, field_name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyField(field_name.to_string()));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::MaxLengthExceeded {
            field: field_name.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidName {
        field: field_name.to_string(),
        reason: format!("'{}' {}", name, reason),
    };

    let valid_chars = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
    if !name.chars().all(valid_chars) {
        return Err(invalid(
            "must contain only lowercase alphanumeric characters and dashes",
        ));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with an alphanumeric character"));
    }

    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
