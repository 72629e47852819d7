//! Remote orchestration client abstraction

use crate::error::Result;
use crate::selector::Resource;
use crate::watcher::StatusFetcher;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote orchestration API used by the tasks
///
/// Implementations own transport and credentials; the tasks only see
/// "call with parameters, get an identifier or status back, or fail".
/// Calls may be issued concurrently from several tasks.
#[async_trait]
pub trait OrchestrationClient: Send + Sync {
    /// Returns the client name (e.g., "aws")
    fn name(&self) -> &str;

    /// Current status of a stack (e.g. `CREATE_IN_PROGRESS`)
    async fn stack_status(&self, stack_name: &str) -> Result<String>;

    /// Current status of a deployment (e.g. `InProgress`)
    async fn deployment_status(&self, deployment_id: &str) -> Result<String>;

    /// All scaling groups with their tags, in API order
    async fn list_scaling_groups(&self) -> Result<Vec<Resource>>;

    /// Create an application, returning its id
    async fn create_application(&self, application_name: &str) -> Result<String>;

    /// Create a deployment group, returning its id
    async fn create_deployment_group(&self, request: &DeploymentGroupRequest) -> Result<String>;

    /// Start a deployment, returning its id
    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<String>;
}

/// Where the deployed bundle lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Revision {
    S3 {
        bucket: String,
        key: String,
        bundle_type: Option<String>,
        version: Option<String>,
        etag: Option<String>,
    },
    #[serde(rename = "github")]
    GitHub {
        repository: String,
        commit_id: String,
    },
}

impl Revision {
    pub fn s3(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Revision::S3 {
            bucket: bucket.into(),
            key: key.into(),
            bundle_type: None,
            version: None,
            etag: None,
        }
    }

    pub fn github(repository: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Revision::GitHub {
            repository: repository.into(),
            commit_id: commit_id.into(),
        }
    }
}

/// Parameters of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub application_name: String,
    pub deployment_group_name: String,
    pub deployment_config_name: String,
    pub description: Option<String>,
    pub ignore_application_stop_failures: Option<bool>,
    pub revision: Revision,
}

/// EC2 instance tag filter attached to a deployment group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ec2TagFilter {
    pub key: Option<String>,
    pub value: Option<String>,

    /// `KEY_ONLY`, `VALUE_ONLY` or `KEY_AND_VALUE`
    #[serde(default = "default_filter_type")]
    pub filter_type: String,
}

fn default_filter_type() -> String {
    "KEY_AND_VALUE".to_string()
}

impl Ec2TagFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            filter_type: default_filter_type(),
        }
    }
}

/// Parameters of a deployment group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentGroupRequest {
    pub application_name: String,
    pub deployment_group_name: String,
    pub deployment_config_name: String,
    pub service_role_arn: String,
    #[serde(default)]
    pub ec2_tag_filters: Vec<Ec2TagFilter>,
    #[serde(default)]
    pub auto_scaling_groups: Vec<String>,
}

/// Stack status as seen through an [`OrchestrationClient`]
pub struct StackStatus<'a>(pub &'a dyn OrchestrationClient);

#[async_trait]
impl<'a> StatusFetcher for StackStatus<'a> {
    async fn fetch_status(&self, subject_id: &str) -> Result<String> {
        self.0.stack_status(subject_id).await
    }
}

/// Deployment status as seen through an [`OrchestrationClient`]
pub struct DeploymentStatus<'a>(pub &'a dyn OrchestrationClient);

#[async_trait]
impl<'a> StatusFetcher for DeploymentStatus<'a> {
    async fn fetch_status(&self, subject_id: &str) -> Result<String> {
        self.0.deployment_status(subject_id).await
    }
}
