//! Core types for schema validation results.

use serde::Serialize;
use std::fmt;

/// A single low-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaViolation {
    /// JSON pointer to the offending value (e.g. "/variants/0/type").
    pub instance_path: String,
    /// Schema keyword that failed (e.g. "enum", "required").
    pub keyword: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl SchemaViolation {
    pub fn new(
        instance_path: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            instance_path: instance_path.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Structured validation failure for one definition.
///
/// `message` is a single-line summary meant for alerts and logs; `errors`
/// keeps every violation for programmatic use.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub message: String,
    pub errors: Vec<SchemaViolation>,
}

impl ValidationError {
    /// Build an error whose message is `prefix` followed by every violation.
    pub fn new(prefix: impl AsRef<str>, errors: Vec<SchemaViolation>) -> Self {
        let details = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(". ");
        let prefix = prefix.as_ref();
        let message = match (prefix.is_empty(), details.is_empty()) {
            (true, _) => details,
            (false, true) => prefix.to_string(),
            (false, false) => format!("{prefix}: {details}"),
        };
        Self { message, errors }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while compiling a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema at '{0}' must be an object or a boolean")]
    NotASchema(String),

    #[error("unknown type '{name}' at '{path}'")]
    UnknownType { name: String, path: String },

    #[error("unknown instanceof kind '{name}' at '{path}', expected Function or RegExp")]
    UnknownInstance { name: String, path: String },

    #[error("invalid '{keyword}' at '{path}': {reason}")]
    InvalidKeyword {
        keyword: String,
        path: String,
        reason: String,
    },
}
