//! Error handling module

use std::path::PathBuf;
use thiserror::Error;

use crate::aws::AwsError;

/// Result type alias for operations that can fail with `ValidatorError`
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Error type for IAM rule validation.
///
/// Coverage misses are not errors: they are reported as failures on the
/// [`crate::ValidationResult`]. These variants cover everything that stops a
/// rule from being evaluated normally.
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// An IAM facade call failed
    #[error("IAM request {operation} failed: {source}")]
    Transport {
        /// The facade operation that failed (e.g. "GetPolicy")
        operation: String,
        /// The underlying AWS error
        #[source]
        source: AwsError,
    },

    /// The principal has no attached managed policies
    #[error("no policies found for IAM {principal_kind} {principal}")]
    NoPoliciesAttached {
        /// "group", "role", "user" or "policy"
        principal_kind: String,
        /// Name or ARN of the principal
        principal: String,
    },

    /// A granted policy document could not be decoded
    #[error("malformed policy document {policy}: {message}")]
    MalformedPolicy {
        /// ARN or name of the document
        policy: String,
        /// Detailed decode error
        message: String,
    },

    /// A rule violates the required-policy invariants
    #[error("invalid rule {rule}: {message}")]
    InvalidRule {
        /// Rule identifier, e.g. "validation-myRole"
        rule: String,
        /// What is wrong with it
        message: String,
    },

    /// File system operation errors with detailed context
    #[error("File system error during {operation} on path '{path}': {source}")]
    FileSystem {
        /// The operation that failed (e.g., "read")
        operation: String,
        /// The file path involved in the operation
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing and serialization errors with context
    #[error("JSON parsing error in {context}: {source}")]
    JsonParsing {
        /// Context where the JSON error occurred (e.g., "rules file")
        context: String,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl ValidatorError {
    /// Create a transport error for a failed facade operation
    pub(crate) fn transport(operation: impl Into<String>, source: AwsError) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn no_policies_attached(
        principal_kind: impl Into<String>,
        principal: impl Into<String>,
    ) -> Self {
        Self::NoPoliciesAttached {
            principal_kind: principal_kind.into(),
            principal: principal.into(),
        }
    }

    /// Create a malformed policy error
    pub(crate) fn malformed_policy(policy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPolicy {
            policy: policy.into(),
            message: message.into(),
        }
    }

    /// Create an invalid rule error
    pub(crate) fn invalid_rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with operation context
    pub(crate) fn file_system(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parsing error with context
    pub(crate) fn json_parsing(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParsing {
            context: context.into(),
            source,
        }
    }
}

/// Convert common standard library errors to `ValidatorError`
impl From<std::io::Error> for ValidatorError {
    fn from(error: std::io::Error) -> Self {
        Self::FileSystem {
            operation: "unknown operation".to_string(),
            path: PathBuf::from("unknown path"),
            source: error,
        }
    }
}

impl From<serde_json::Error> for ValidatorError {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonParsing {
            context: "unknown context".to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_system_error_creation() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error = ValidatorError::file_system("read", "/path/to/rules.json", io_error);

        assert!(matches!(error, ValidatorError::FileSystem { .. }));
        assert!(error.to_string().contains("read"));
        assert!(error.to_string().contains("/path/to/rules.json"));
    }

    #[test]
    fn test_no_policies_attached_message() {
        let error = ValidatorError::no_policies_attached("role", "iamRoleZanzibar");
        assert_eq!(
            error.to_string(),
            "no policies found for IAM role iamRoleZanzibar"
        );
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let error = ValidatorError::transport(
            "GetPolicy",
            AwsError::IamError("throttled".to_string()),
        );
        assert!(error.to_string().contains("GetPolicy"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
