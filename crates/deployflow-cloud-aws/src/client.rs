//! [`OrchestrationClient`] backed by the AWS SDK

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_cloudformation::types::StackStatus;
use aws_sdk_codedeploy::types::{
    BundleType, Ec2TagFilter, Ec2TagFilterType, GitHubLocation, RevisionLocation,
    RevisionLocationType, S3Location,
};
use deployflow_cloud::{
    DeploymentGroupRequest, DeploymentRequest, OrchestrationClient, Resource, Result, Revision, Tag,
};

/// Some SDK getters return `&str`, others `Option<&str>`
fn text<'a>(value: impl Into<Option<&'a str>>) -> Option<String> {
    value
        .into()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// CloudFormation, CodeDeploy and Auto Scaling clients sharing one SDK config
#[derive(Debug, Clone)]
pub struct AwsClient {
    cloudformation: aws_sdk_cloudformation::Client,
    codedeploy: aws_sdk_codedeploy::Client,
    autoscaling: aws_sdk_autoscaling::Client,
}

impl AwsClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            cloudformation: aws_sdk_cloudformation::Client::new(config),
            codedeploy: aws_sdk_codedeploy::Client::new(config),
            autoscaling: aws_sdk_autoscaling::Client::new(config),
        }
    }

    /// Build clients from the default credential chain, optionally pinning
    /// the region
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        tracing::debug!("AWS region: {:?}", config.region());
        Self::new(&config)
    }
}

pub(crate) fn revision_location(revision: &Revision) -> RevisionLocation {
    match revision {
        Revision::S3 {
            bucket,
            key,
            bundle_type,
            version,
            etag,
        } => RevisionLocation::builder()
            .revision_type(RevisionLocationType::S3)
            .s3_location(
                S3Location::builder()
                    .bucket(bucket)
                    .key(key)
                    .set_bundle_type(bundle_type.as_deref().map(BundleType::from))
                    .set_version(version.clone())
                    .set_e_tag(etag.clone())
                    .build(),
            )
            .build(),
        Revision::GitHub {
            repository,
            commit_id,
        } => RevisionLocation::builder()
            .revision_type(RevisionLocationType::GitHub)
            .git_hub_location(
                GitHubLocation::builder()
                    .repository(repository)
                    .commit_id(commit_id)
                    .build(),
            )
            .build(),
    }
}

pub(crate) fn tag_filters(request: &DeploymentGroupRequest) -> Vec<Ec2TagFilter> {
    request
        .ec2_tag_filters
        .iter()
        .map(|filter| {
            Ec2TagFilter::builder()
                .set_key(filter.key.clone())
                .set_value(filter.value.clone())
                .r#type(Ec2TagFilterType::from(filter.filter_type.as_str()))
                .build()
        })
        .collect()
}

#[async_trait]
impl OrchestrationClient for AwsClient {
    fn name(&self) -> &str {
        "aws"
    }

    async fn stack_status(&self, stack_name: &str) -> Result<String> {
        let output = self
            .cloudformation
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| AwsError::sdk("DescribeStacks", e))?;

        let stack = output
            .stacks()
            .first()
            .ok_or_else(|| AwsError::StackNotFound(stack_name.to_string()))?;
        let status: Option<&StackStatus> = stack.stack_status().into();
        let status = status.ok_or(AwsError::MissingField {
            operation: "DescribeStacks",
            field: "StackStatus",
        })?;

        Ok(status.as_str().to_string())
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<String> {
        let output = self
            .codedeploy
            .get_deployment()
            .deployment_id(deployment_id)
            .send()
            .await
            .map_err(|e| AwsError::sdk("GetDeployment", e))?;

        let status = output
            .deployment_info()
            .and_then(|info| info.status())
            .ok_or(AwsError::MissingField {
                operation: "GetDeployment",
                field: "DeploymentInfo.Status",
            })?;

        Ok(status.as_str().to_string())
    }

    async fn list_scaling_groups(&self) -> Result<Vec<Resource>> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .autoscaling
                .describe_auto_scaling_groups()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| AwsError::sdk("DescribeAutoScalingGroups", e))?;

            for group in output.auto_scaling_groups() {
                let Some(name) = text(group.auto_scaling_group_name()) else {
                    continue;
                };
                let tags = group
                    .tags()
                    .iter()
                    .filter_map(|tag| {
                        let key = text(tag.key())?;
                        let value: Option<&str> = tag.value().into();
                        Some(Tag::new(key, value.unwrap_or_default()))
                    })
                    .collect();
                groups.push(Resource { name, tags });
            }

            match text(output.next_token()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(groups)
    }

    async fn create_application(&self, application_name: &str) -> Result<String> {
        let output = self
            .codedeploy
            .create_application()
            .application_name(application_name)
            .send()
            .await
            .map_err(|e| AwsError::sdk("CreateApplication", e))?;

        let id = text(output.application_id()).ok_or(AwsError::MissingField {
            operation: "CreateApplication",
            field: "applicationId",
        })?;
        Ok(id)
    }

    async fn create_deployment_group(&self, request: &DeploymentGroupRequest) -> Result<String> {
        let mut call = self
            .codedeploy
            .create_deployment_group()
            .application_name(&request.application_name)
            .deployment_group_name(&request.deployment_group_name)
            .deployment_config_name(&request.deployment_config_name)
            .service_role_arn(&request.service_role_arn);

        if !request.ec2_tag_filters.is_empty() {
            call = call.set_ec2_tag_filters(Some(tag_filters(request)));
        }
        if !request.auto_scaling_groups.is_empty() {
            call = call.set_auto_scaling_groups(Some(request.auto_scaling_groups.clone()));
        }

        let output = call
            .send()
            .await
            .map_err(|e| AwsError::sdk("CreateDeploymentGroup", e))?;

        let id = text(output.deployment_group_id()).ok_or(AwsError::MissingField {
            operation: "CreateDeploymentGroup",
            field: "deploymentGroupId",
        })?;
        Ok(id)
    }

    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<String> {
        let output = self
            .codedeploy
            .create_deployment()
            .application_name(&request.application_name)
            .deployment_group_name(&request.deployment_group_name)
            .deployment_config_name(&request.deployment_config_name)
            .set_description(request.description.clone())
            .set_ignore_application_stop_failures(request.ignore_application_stop_failures)
            .revision(revision_location(&request.revision))
            .send()
            .await
            .map_err(|e| AwsError::sdk("CreateDeployment", e))?;

        let id = text(output.deployment_id()).ok_or(AwsError::MissingField {
            operation: "CreateDeployment",
            field: "deploymentId",
        })?;
        Ok(id)
    }
}
