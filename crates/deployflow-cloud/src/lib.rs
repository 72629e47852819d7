//! DeployFlow Cloud
//!
//! Build-pipeline tasks that drive stack and deployment lifecycles against a
//! remote orchestration API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 deployflow CLI                  │
//! │     (wait-stack, find-groups, create-...)       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                deployflow-cloud                 │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │                 tasks                    │   │
//! │  └──────┬───────────────────────┬───────────┘   │
//! │  ┌──────▼───────┐  ┌────────────▼───────────┐   │
//! │  │   watcher    │  │  selector ◀─ condition │   │
//! │  └──────────────┘  └────────────────────────┘   │
//! │  trait OrchestrationClient { ... }              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │ deployflow-   │
//!           │ cloud-aws     │
//!           └───────────────┘
//! ```

pub mod condition;
pub mod error;
pub mod list;
pub mod provider;
pub mod selector;
pub mod tasks;
pub mod watcher;

// Re-exports
pub use condition::{Condition, NamedCondition, Predicate};
pub use error::{CloudError, ParamCheck, Result};
pub use list::DEFAULT_DELIMITER;
pub use provider::{
    DeploymentGroupRequest, DeploymentRequest, DeploymentStatus, Ec2TagFilter,
    OrchestrationClient, Revision, StackStatus,
};
pub use selector::{Resource, ResourceSelector, Tag};
pub use tasks::{
    CreateApplicationTask, CreateDeploymentGroupTask, CreateDeploymentTask, FindGroupsTask,
    TaskOutput, WaitForDeploymentTask, WaitForStackTask,
};
pub use watcher::{
    FailureMatch, Observation, PollConfig, PollObserver, PollTarget, PollingWatcher,
    RemoteErrorPolicy, Sleeper, StatusFetcher, TokioSleeper, WaitOutcome,
};
pub use tokio_util::sync::CancellationToken;
