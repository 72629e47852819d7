//! Error types shared by the watcher, selector and tasks

use thiserror::Error;

/// Errors raised by DeployFlow tasks
///
/// Terminal watcher states (`Failed`, `TimedOut`, ...) are not errors; a task
/// turns them into [`CloudError::TaskFailed`] once it has decided the run is
/// over.
#[derive(Error, Debug)]
pub enum CloudError {
    /// One or more required parameters were missing or malformed.
    /// Raised before any remote call is made.
    #[error("{}", .0.join("\n"))]
    Configuration(Vec<String>),

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("{subject}: {reason}")]
    TaskFailed { subject: String, reason: String },
}

impl CloudError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CloudError::Configuration(vec![message.into()])
    }

    pub fn remote(message: impl std::fmt::Display) -> Self {
        CloudError::RemoteCall(message.to_string())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CloudError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Collects missing-parameter messages so a task can report all of them at once
#[derive(Debug, Default)]
pub struct ParamCheck {
    errors: Vec<String>,
}

impl ParamCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as missing when `value` is `None`
    pub fn require<T>(&mut self, name: &str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.missing(name);
        }
        self
    }

    pub fn missing(&mut self, name: &str) -> &mut Self {
        self.errors
            .push(format!("Missing parameter: {} is required", name));
        self
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CloudError::Configuration(std::mem::take(&mut self.errors)))
        }
    }
}
