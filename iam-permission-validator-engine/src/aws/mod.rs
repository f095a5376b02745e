//! AWS SDK integration: IAM client wrapper and the SDK-facing error type.

/// IAM client implementing the facade
pub mod iam_client;

use thiserror::Error;

#[derive(Error, Debug)]
/// AWS Errors from AWS SDK calls
pub enum AwsError {
    #[error("AWS configuration error: {0}")]
    /// config error
    ConfigError(String),
    #[error("IAM client error: {0}")]
    /// errors from calls to AWS IAM
    IamError(String),
    #[error("AWS SDK error: {0}")]
    /// errors from SDK output
    SdkError(String),
}

/// Type of AWS Result extending Result
pub type AwsResult<T> = Result<T, AwsError>;
