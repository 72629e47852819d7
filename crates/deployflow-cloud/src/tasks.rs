//! Build-pipeline tasks
//!
//! Each task validates its parameters, reporting every missing one at once,
//! before it touches the remote API. Tasks that produce a value return a
//! [`TaskOutput`]; where that value is stored is up to the caller.

use crate::condition::NamedCondition;
use crate::error::{CloudError, ParamCheck, Result};
use crate::list::{self, DEFAULT_DELIMITER};
use crate::provider::{
    DeploymentGroupRequest, DeploymentRequest, DeploymentStatus, Ec2TagFilter,
    OrchestrationClient, Revision, StackStatus,
};
use crate::selector::ResourceSelector;
use crate::watcher::{
    FailureMatch, PollConfig, PollTarget, PollingWatcher, StatusFetcher, WaitOutcome,
};
use serde::{Deserialize, Serialize};

/// Property receiving the matched scaling group names
pub const AUTO_SCALING_GROUP_IDS_PROPERTY: &str = "autoScalingGroupIds";
pub const APPLICATION_ID_PROPERTY: &str = "applicationId";
pub const DEPLOYMENT_GROUP_ID_PROPERTY: &str = "deploymentGroupId";
pub const DEPLOYMENT_ID_PROPERTY: &str = "deploymentId";

/// Deployment status waited for after `create-deployment --wait`
pub const DEPLOYMENT_SUCCEEDED: &str = "Succeeded";

/// A named value produced by a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub property: String,
    pub value: String,
}

impl TaskOutput {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.property, self.value)
    }
}

fn remote_context(what: &str, err: CloudError) -> CloudError {
    match err {
        CloudError::RemoteCall(message) => CloudError::RemoteCall(format!("{}: {}", what, message)),
        other => other,
    }
}

/// Run the watcher and turn any non-success outcome into [`CloudError::TaskFailed`]
#[allow(clippy::too_many_arguments)]
async fn wait_until(
    watcher: &PollingWatcher,
    fetcher: &dyn StatusFetcher,
    subject: &str,
    status: &str,
    delimiter: &str,
    failure: &FailureMatch,
    poll: &PollConfig,
    what: &str,
) -> Result<WaitOutcome> {
    let accept = list::split(status, delimiter);
    let target =
        PollTarget::new(subject, fetcher, accept, failure.clone())?.with_config(poll.clone());

    tracing::info!(
        "Waiting for {} to reach {} (up to {} attempts every {}s)",
        subject,
        target.accept_list(),
        poll.max_attempts,
        poll.interval_secs
    );

    let outcome = watcher.run(&target).await;
    let reason = match outcome {
        WaitOutcome::Succeeded { .. } => return Ok(outcome),
        WaitOutcome::Failed { ref status, .. } => {
            format!("{}: the process failed with status {}", what, status)
        }
        WaitOutcome::TimedOut { .. } => format!("{}: never reached state {}", what, status),
        WaitOutcome::Cancelled { .. } => {
            format!("{}: cancelled while waiting for state {}", what, status)
        }
        WaitOutcome::RemoteCallFailed { ref error, .. } => {
            format!("{}: could not read status: {}", what, error)
        }
    };
    tracing::warn!("{} {}", subject, outcome);

    Err(CloudError::TaskFailed {
        subject: subject.to_string(),
        reason,
    })
}

/// Wait for a stack to reach one of the given statuses
#[derive(Debug, Clone)]
pub struct WaitForStackTask {
    pub stack_name: Option<String>,

    /// Accepted statuses, joined by `delimiter`
    pub status: Option<String>,
    pub delimiter: String,

    /// Defaults to any status containing `FAILED`
    pub failure: FailureMatch,
    pub poll: PollConfig,
}

impl Default for WaitForStackTask {
    fn default() -> Self {
        Self {
            stack_name: None,
            status: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            failure: FailureMatch::contains("FAILED"),
            poll: PollConfig::default(),
        }
    }
}

impl WaitForStackTask {
    pub fn new(stack_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            stack_name: Some(stack_name.into()),
            status: Some(status.into()),
            ..Self::default()
        }
    }

    /// Report every missing parameter without touching the remote API
    pub fn validate(&self) -> Result<()> {
        ParamCheck::new()
            .require("stackName", self.stack_name.as_ref())
            .require("status", self.status.as_ref())
            .finish()
    }

    pub async fn execute(
        &self,
        client: &dyn OrchestrationClient,
        watcher: &PollingWatcher,
    ) -> Result<WaitOutcome> {
        self.validate()?;
        let stack_name = self.stack_name.as_deref().unwrap_or_default();
        let status = self.status.as_deref().unwrap_or_default();

        wait_until(
            watcher,
            &StackStatus(client),
            stack_name,
            status,
            &self.delimiter,
            &self.failure,
            &self.poll,
            "The stack update or creation failed",
        )
        .await
    }
}

/// Wait for a deployment to reach one of the given statuses
#[derive(Debug, Clone)]
pub struct WaitForDeploymentTask {
    pub deployment_id: Option<String>,

    /// Accepted statuses, joined by `delimiter`
    pub status: Option<String>,
    pub delimiter: String,

    /// Defaults to exactly `Failed` or `Stopped`
    pub failure: FailureMatch,
    pub poll: PollConfig,
}

impl Default for WaitForDeploymentTask {
    fn default() -> Self {
        Self {
            deployment_id: None,
            status: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            failure: FailureMatch::any_of(["Failed", "Stopped"]),
            poll: PollConfig::default(),
        }
    }
}

impl WaitForDeploymentTask {
    pub fn new(deployment_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            deployment_id: Some(deployment_id.into()),
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ParamCheck::new()
            .require("deploymentId", self.deployment_id.as_ref())
            .require("status", self.status.as_ref())
            .finish()
    }

    pub async fn execute(
        &self,
        client: &dyn OrchestrationClient,
        watcher: &PollingWatcher,
    ) -> Result<WaitOutcome> {
        self.validate()?;
        let deployment_id = self.deployment_id.as_deref().unwrap_or_default();
        let status = self.status.as_deref().unwrap_or_default();

        wait_until(
            watcher,
            &DeploymentStatus(client),
            deployment_id,
            status,
            &self.delimiter,
            &self.failure,
            &self.poll,
            "The code deploy deployment failed",
        )
        .await
    }
}

/// Find scaling groups whose tags match the registered conditions
#[derive(Debug, Clone)]
pub struct FindGroupsTask {
    pub tags: Vec<NamedCondition>,
    pub property_name: String,
    pub delimiter: String,
}

impl Default for FindGroupsTask {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            property_name: AUTO_SCALING_GROUP_IDS_PROPERTY.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl FindGroupsTask {
    pub fn new(tags: impl IntoIterator<Item = NamedCondition>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Register a condition; a later one for the same tag key wins
    pub fn add_tag(&mut self, tag: NamedCondition) {
        self.tags.push(tag);
    }

    fn selector(&self) -> Result<ResourceSelector> {
        ResourceSelector::new(self.tags.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        self.selector().map(|_| ())
    }

    /// Returns the matched group names joined by the delimiter, or `None`
    /// when nothing matched
    pub async fn execute(&self, client: &dyn OrchestrationClient) -> Result<Option<TaskOutput>> {
        let selector = self.selector()?;

        let groups = client
            .list_scaling_groups()
            .await
            .map_err(|e| remote_context("Could not describe auto scaling groups", e))?;
        tracing::debug!("Found {} AutoScalingGroups.", groups.len());

        let names = selector.select(&groups);
        if names.is_empty() {
            tracing::info!("No AutoScalingGroup matched {} tag conditions", selector.len());
            return Ok(None);
        }

        tracing::info!("Matched {} AutoScalingGroups", names.len());
        Ok(Some(TaskOutput::new(
            self.property_name.clone(),
            list::join(&names, &self.delimiter),
        )))
    }
}

/// Create an application
#[derive(Debug, Clone)]
pub struct CreateApplicationTask {
    pub application_name: Option<String>,
    pub property_name: String,
}

impl Default for CreateApplicationTask {
    fn default() -> Self {
        Self {
            application_name: None,
            property_name: APPLICATION_ID_PROPERTY.to_string(),
        }
    }
}

impl CreateApplicationTask {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: Some(application_name.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ParamCheck::new()
            .require("applicationName", self.application_name.as_ref())
            .finish()
    }

    pub async fn execute(&self, client: &dyn OrchestrationClient) -> Result<TaskOutput> {
        self.validate()?;
        let application_name = self.application_name.as_deref().unwrap_or_default();

        let id = client
            .create_application(application_name)
            .await
            .map_err(|e| remote_context("Could not create application", e))?;
        tracing::info!("Create application {} request submitted.", application_name);

        Ok(TaskOutput::new(self.property_name.clone(), id))
    }
}

/// Create a deployment group
#[derive(Debug, Clone)]
pub struct CreateDeploymentGroupTask {
    pub application_name: Option<String>,
    pub deployment_group_name: Option<String>,
    pub deployment_config_name: Option<String>,
    pub service_role_arn: Option<String>,
    pub ec2_tag_filters: Vec<Ec2TagFilter>,
    pub auto_scaling_groups: Vec<String>,
    pub property_name: String,
}

impl Default for CreateDeploymentGroupTask {
    fn default() -> Self {
        Self {
            application_name: None,
            deployment_group_name: None,
            deployment_config_name: None,
            service_role_arn: None,
            ec2_tag_filters: Vec::new(),
            auto_scaling_groups: Vec::new(),
            property_name: DEPLOYMENT_GROUP_ID_PROPERTY.to_string(),
        }
    }
}

impl CreateDeploymentGroupTask {
    /// Add scaling group names from a delimited list (e.g. the output of
    /// [`FindGroupsTask`])
    pub fn add_auto_scaling_groups(&mut self, value: &str, delimiter: &str) {
        self.auto_scaling_groups.extend(list::split(value, delimiter));
    }

    pub fn add_tag_filter(&mut self, filter: Ec2TagFilter) {
        self.ec2_tag_filters.push(filter);
    }

    fn request(&self) -> Result<DeploymentGroupRequest> {
        ParamCheck::new()
            .require("applicationName", self.application_name.as_ref())
            .require("deploymentGroupName", self.deployment_group_name.as_ref())
            .require("deploymentConfigName", self.deployment_config_name.as_ref())
            .require("serviceRoleArn", self.service_role_arn.as_ref())
            .finish()?;

        Ok(DeploymentGroupRequest {
            application_name: self.application_name.clone().unwrap_or_default(),
            deployment_group_name: self.deployment_group_name.clone().unwrap_or_default(),
            deployment_config_name: self.deployment_config_name.clone().unwrap_or_default(),
            service_role_arn: self.service_role_arn.clone().unwrap_or_default(),
            ec2_tag_filters: self.ec2_tag_filters.clone(),
            auto_scaling_groups: self.auto_scaling_groups.clone(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.request().map(|_| ())
    }

    pub async fn execute(&self, client: &dyn OrchestrationClient) -> Result<TaskOutput> {
        let request = self.request()?;

        let id = client
            .create_deployment_group(&request)
            .await
            .map_err(|e| remote_context("Could not create deployment group", e))?;
        tracing::info!(
            "Create deployment group {} request submitted.",
            request.deployment_group_name
        );

        Ok(TaskOutput::new(self.property_name.clone(), id))
    }
}

/// Start a deployment, optionally blocking until it succeeds
#[derive(Debug, Clone)]
pub struct CreateDeploymentTask {
    pub application_name: Option<String>,
    pub deployment_group_name: Option<String>,
    pub deployment_config_name: Option<String>,
    pub description: Option<String>,
    pub ignore_application_stop_failures: Option<bool>,
    pub revision: Option<Revision>,
    pub property_name: String,

    /// Wait for the deployment to reach `Succeeded` before returning
    pub wait_for_deployment: bool,
    pub poll: PollConfig,
}

impl Default for CreateDeploymentTask {
    fn default() -> Self {
        Self {
            application_name: None,
            deployment_group_name: None,
            deployment_config_name: None,
            description: None,
            ignore_application_stop_failures: None,
            revision: None,
            property_name: DEPLOYMENT_ID_PROPERTY.to_string(),
            wait_for_deployment: false,
            poll: PollConfig::default(),
        }
    }
}

impl CreateDeploymentTask {
    /// Set the revision to deploy. Only one revision per deployment; a second
    /// call replaces the first.
    pub fn set_revision(&mut self, revision: Revision) {
        if self.revision.is_some() {
            tracing::warn!(
                "More than one revision was given; only the last one will be deployed"
            );
        }
        self.revision = Some(revision);
    }

    fn request(&self) -> Result<DeploymentRequest> {
        ParamCheck::new()
            .require("applicationName", self.application_name.as_ref())
            .require("deploymentGroupName", self.deployment_group_name.as_ref())
            .require("deploymentConfigName", self.deployment_config_name.as_ref())
            .require("revision", self.revision.as_ref())
            .finish()?;

        let Some(revision) = self.revision.clone() else {
            return Err(CloudError::configuration("Missing parameter: revision is required"));
        };
        Ok(DeploymentRequest {
            application_name: self.application_name.clone().unwrap_or_default(),
            deployment_group_name: self.deployment_group_name.clone().unwrap_or_default(),
            deployment_config_name: self.deployment_config_name.clone().unwrap_or_default(),
            description: self.description.clone(),
            ignore_application_stop_failures: self.ignore_application_stop_failures,
            revision,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.request().map(|_| ())
    }

    pub async fn execute(
        &self,
        client: &dyn OrchestrationClient,
        watcher: &PollingWatcher,
    ) -> Result<TaskOutput> {
        let request = self.request()?;

        let deployment_id = client
            .create_deployment(&request)
            .await
            .map_err(|e| remote_context("Could not create deployment", e))?;
        tracing::info!(
            "Create deployment {} request submitted ({}).",
            request.application_name,
            deployment_id
        );

        if self.wait_for_deployment {
            let wait = WaitForDeploymentTask {
                poll: self.poll.clone(),
                ..WaitForDeploymentTask::new(deployment_id.clone(), DEPLOYMENT_SUCCEEDED)
            };
            wait.execute(client, watcher).await?;
        }

        Ok(TaskOutput::new(self.property_name.clone(), deployment_id))
    }
}
