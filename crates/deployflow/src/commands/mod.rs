pub mod create_application;
pub mod create_deployment;
pub mod create_deployment_group;
pub mod find_groups;
pub mod wait_deployment;
pub mod wait_stack;

use colored::Colorize;
use deployflow_cloud::{CancellationToken, PollConfig, PollingWatcher, TaskOutput, WaitOutcome};
use deployflow_cloud_aws::AwsClient;
use deployflow_config::DeployflowConfig;

/// State shared by every command handler
pub struct Context {
    pub config: DeployflowConfig,
    pub watcher: PollingWatcher,
}

impl Context {
    pub fn new(config: DeployflowConfig, cancel: CancellationToken) -> Self {
        let watcher = PollingWatcher::new()
            .with_cancellation(cancel)
            .with_observer(|subject: &str, attempt: u32, status: &str| {
                eprintln!("  [{}] {} {}", attempt, subject, status.cyan());
            });
        Self { config, watcher }
    }

    pub fn poll(&self) -> PollConfig {
        self.config.poll.clone()
    }

    pub fn delimiter(&self) -> String {
        self.config.delimiter.clone()
    }

    /// Connect only after parameters are validated
    pub async fn client(&self) -> AwsClient {
        tracing::debug!(
            "Connecting to AWS (region: {})",
            self.config.region.as_deref().unwrap_or("from environment")
        );
        AwsClient::from_env(self.config.region.clone()).await
    }
}

/// Print a task output as `property=value` on stdout
pub fn print_output(output: &TaskOutput) {
    println!("{}", output);
}

pub fn print_outcome(subject: &str, outcome: &WaitOutcome) {
    eprintln!(
        "{}",
        format!("✓ {} {}", subject, outcome).green().bold()
    );
}
