use async_trait::async_trait;
use deployflow_cloud::{
    CloudError, DeploymentGroupRequest, DeploymentRequest, OrchestrationClient, Resource, Result,
    Sleeper,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory orchestration API with scripted responses
///
/// Status scripts pop one entry per call; the last entry repeats.
#[derive(Default)]
pub struct MockClient {
    pub stack_statuses: Mutex<VecDeque<String>>,
    pub deployment_statuses: Mutex<VecDeque<String>>,
    pub groups: Vec<Resource>,
    pub fail_listing: bool,
    pub calls: Mutex<Vec<String>>,
    pub deployments: Mutex<Vec<DeploymentRequest>>,
    pub deployment_groups: Mutex<Vec<DeploymentGroupRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_statuses(mut self, statuses: &[&str]) -> Self {
        self.stack_statuses = Mutex::new(statuses.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_deployment_statuses(mut self, statuses: &[&str]) -> Self {
        self.deployment_statuses = Mutex::new(statuses.iter().map(|s| s.to_string()).collect());
        self
    }

    #[allow(dead_code)]
    pub fn with_groups(mut self, groups: Vec<Resource>) -> Self {
        self.groups = groups;
        self
    }

    #[allow(dead_code)]
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn next(script: &Mutex<VecDeque<String>>, subject: &str) -> Result<String> {
        let mut script = script.lock().unwrap();
        match script.len() {
            0 => Err(CloudError::remote(format!("{} does not exist", subject))),
            1 => Ok(script[0].clone()),
            _ => Ok(script.pop_front().unwrap()),
        }
    }
}

#[async_trait]
impl OrchestrationClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stack_status(&self, stack_name: &str) -> Result<String> {
        self.record(format!("stack_status:{}", stack_name));
        Self::next(&self.stack_statuses, stack_name)
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<String> {
        self.record(format!("deployment_status:{}", deployment_id));
        Self::next(&self.deployment_statuses, deployment_id)
    }

    async fn list_scaling_groups(&self) -> Result<Vec<Resource>> {
        self.record("list_scaling_groups");
        if self.fail_listing {
            return Err(CloudError::remote("access denied"));
        }
        Ok(self.groups.clone())
    }

    async fn create_application(&self, application_name: &str) -> Result<String> {
        self.record(format!("create_application:{}", application_name));
        Ok(format!("app-{}", application_name))
    }

    async fn create_deployment_group(&self, request: &DeploymentGroupRequest) -> Result<String> {
        self.record(format!("create_deployment_group:{}", request.deployment_group_name));
        self.deployment_groups.lock().unwrap().push(request.clone());
        Ok("dg-0001".to_string())
    }

    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<String> {
        self.record(format!("create_deployment:{}", request.application_name));
        self.deployments.lock().unwrap().push(request.clone());
        Ok("d-ABCDEF123".to_string())
    }
}

/// Sleeper that returns immediately
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}
