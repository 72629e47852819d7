//! AWS client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("{operation} failed: {message}")]
    Sdk {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} returned no {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Stack not found: {0}")]
    StackNotFound(String),
}

impl AwsError {
    /// Wrap an SDK error, keeping its full source chain in the message
    pub fn sdk<E: std::error::Error>(operation: &'static str, err: E) -> Self {
        AwsError::Sdk {
            operation,
            message: aws_sdk_cloudformation::error::DisplayErrorContext(&err).to_string(),
        }
    }
}

impl From<AwsError> for deployflow_cloud::CloudError {
    fn from(err: AwsError) -> Self {
        deployflow_cloud::CloudError::RemoteCall(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
