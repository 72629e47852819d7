//! AWS client for DeployFlow
//!
//! Implements the `OrchestrationClient` trait on top of the AWS SDK:
//!
//! - CloudFormation: stack status
//! - CodeDeploy: applications, deployment groups, deployments
//! - Auto Scaling: scaling group listing with tags
//!
//! Credentials and region come from the SDK's default provider chain.
//!
//! # Example
//!
//! ```ignore
//! use deployflow_cloud::{PollingWatcher, WaitForStackTask};
//! use deployflow_cloud_aws::AwsClient;
//!
//! let client = AwsClient::from_env(Some("eu-west-1".to_string())).await;
//! let task = WaitForStackTask::new("my-stack", "CREATE_COMPLETE");
//! let outcome = task.execute(&client, &PollingWatcher::new()).await?;
//! ```

pub mod client;
pub mod error;

pub use client::AwsClient;
pub use error::{AwsError, Result};
