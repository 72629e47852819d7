//! Poll a remote status until it reaches a terminal state
//!
//! The watcher observes a status string that something else (CloudFormation,
//! CodeDeploy, ...) mutates remotely. Each iteration waits a fixed interval,
//! fetches the status once and classifies it:
//!
//! ```text
//!             ┌──────────── pending ─────────────┐
//!             ▼                                  │
//!   ┌──────────────────┐  wait   ┌─────────┐    │
//!   │     Polling      │ ──────▶ │  fetch  │ ───┘
//!   └──────────────────┘         └─────────┘
//!      │  budget spent      │ cancelled │ error │ failure │ accepted
//!      ▼                    ▼           ▼       ▼         ▼
//!   TimedOut           Cancelled  RemoteCallFailed  Failed  Succeeded
//! ```
//!
//! The budget is counted in attempts, so the worst-case wait is roughly
//! `max_attempts * interval`.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn default_max_attempts() -> u32 {
    100
}
fn default_interval_secs() -> u64 {
    30 // 30 seconds, ~50 minutes with the default budget
}

/// Attempt budget and interval for one watcher run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of status observations
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait before each observation, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// What to do when the status fetch itself fails
    #[serde(default)]
    pub remote_errors: RemoteErrorPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
            remote_errors: RemoteErrorPolicy::default(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_remote_errors(mut self, policy: RemoteErrorPolicy) -> Self {
        self.remote_errors = policy;
        self
    }
}

/// Handling of errors raised by the status fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RemoteErrorPolicy {
    /// Stop at the first failed fetch
    #[default]
    FailFast,

    /// Treat up to `max_retries` failed fetches as pending observations.
    /// Each one still consumes an attempt.
    Retry { max_retries: u32 },
}

/// How a status is recognized as a permanent failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMatch {
    /// Status contains the marker (CloudFormation: `FAILED`)
    Contains(String),

    /// Status equals one of the listed values (CodeDeploy: `Failed`, `Stopped`)
    AnyOf(Vec<String>),
}

impl FailureMatch {
    pub fn contains(marker: impl Into<String>) -> Self {
        FailureMatch::Contains(marker.into())
    }

    pub fn any_of<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FailureMatch::AnyOf(statuses.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, status: &str) -> bool {
        match self {
            FailureMatch::Contains(marker) => status.contains(marker.as_str()),
            FailureMatch::AnyOf(statuses) => statuses.iter().any(|s| s == status),
        }
    }
}

impl fmt::Display for FailureMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureMatch::Contains(marker) => write!(f, "*{}*", marker),
            FailureMatch::AnyOf(statuses) => write!(f, "{}", statuses.join("|")),
        }
    }
}

/// Fetches the current remote status of a subject
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self, subject_id: &str) -> Result<String>;
}

/// Suspends the watcher between observations
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Progress callback, invoked once per observed status
///
/// Purely informational; it cannot influence the run.
pub trait PollObserver: Send + Sync {
    fn on_attempt(&self, subject_id: &str, attempt: u32, status: &str);
}

impl<F> PollObserver for F
where
    F: Fn(&str, u32, &str) + Send + Sync,
{
    fn on_attempt(&self, subject_id: &str, attempt: u32, status: &str) {
        self(subject_id, attempt, status)
    }
}

/// Classification of a single observed status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Accepted,
    Failed,
    Pending,
}

/// The subject of one watcher run
pub struct PollTarget<'a> {
    pub subject_id: String,
    pub fetcher: &'a dyn StatusFetcher,
    pub accept_statuses: HashSet<String>,
    pub failure: FailureMatch,
    pub config: PollConfig,
}

impl<'a> PollTarget<'a> {
    /// Build a target with the default [`PollConfig`]
    ///
    /// Fails when the subject id or the accept set is empty.
    pub fn new<I, S>(
        subject_id: impl Into<String>,
        fetcher: &'a dyn StatusFetcher,
        accept_statuses: I,
        failure: FailureMatch,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let subject_id = subject_id.into();
        let accept_statuses: HashSet<String> =
            accept_statuses.into_iter().map(Into::into).collect();

        let mut errors = Vec::new();
        if subject_id.is_empty() {
            errors.push("Poll target needs a subject id".to_string());
        }
        if accept_statuses.is_empty() {
            errors.push("Poll target needs at least one accepted status".to_string());
        }
        if !errors.is_empty() {
            return Err(CloudError::Configuration(errors));
        }

        Ok(Self {
            subject_id,
            fetcher,
            accept_statuses,
            failure,
            config: PollConfig::default(),
        })
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Classify a status. The failure check runs first, so a status that
    /// matches both the failure rule and the accept set counts as failed.
    pub fn observe(&self, status: &str) -> Observation {
        if self.failure.matches(status) {
            Observation::Failed
        } else if self.accept_statuses.contains(status) {
            Observation::Accepted
        } else {
            Observation::Pending
        }
    }

    /// Accept set rendered for messages, sorted for stable output
    pub fn accept_list(&self) -> String {
        let mut statuses: Vec<&str> = self.accept_statuses.iter().map(String::as_str).collect();
        statuses.sort_unstable();
        statuses.join(", ")
    }
}

/// Terminal state of a watcher run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Succeeded { status: String, attempts: u32 },
    Failed { status: String, attempts: u32 },
    TimedOut { attempts: u32, last_status: Option<String> },
    Cancelled { attempts: u32 },
    RemoteCallFailed { error: String, attempts: u32 },
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded { .. })
    }

    /// Number of status observations made (or attempted) before stopping
    pub fn attempts(&self) -> u32 {
        match self {
            WaitOutcome::Succeeded { attempts, .. }
            | WaitOutcome::Failed { attempts, .. }
            | WaitOutcome::TimedOut { attempts, .. }
            | WaitOutcome::Cancelled { attempts }
            | WaitOutcome::RemoteCallFailed { attempts, .. } => *attempts,
        }
    }

    /// Last status seen, if any
    pub fn status(&self) -> Option<&str> {
        match self {
            WaitOutcome::Succeeded { status, .. } | WaitOutcome::Failed { status, .. } => {
                Some(status.as_str())
            }
            WaitOutcome::TimedOut { last_status, .. } => last_status.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitOutcome::Succeeded { status, attempts } => {
                write!(f, "reached status {} after {} attempts", status, attempts)
            }
            WaitOutcome::Failed { status, .. } => write!(f, "failed with status {}", status),
            WaitOutcome::TimedOut { attempts, .. } => {
                write!(f, "gave up after {} attempts", attempts)
            }
            WaitOutcome::Cancelled { .. } => write!(f, "cancelled"),
            WaitOutcome::RemoteCallFailed { error, .. } => {
                write!(f, "status request failed: {}", error)
            }
        }
    }
}

/// Runs [`PollTarget`]s to completion
///
/// A watcher carries no per-run state; the same instance can serve
/// any number of sequential or concurrent runs.
pub struct PollingWatcher {
    sleeper: Arc<dyn Sleeper>,
    cancel: CancellationToken,
    observer: Option<Arc<dyn PollObserver>>,
}

impl Default for PollingWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PollingWatcher {
    pub fn new() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            cancel: CancellationToken::new(),
            observer: None,
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Use `token` to cancel in-flight runs
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_observer(mut self, observer: impl PollObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, target: &PollTarget<'_>) -> WaitOutcome {
        let subject = target.subject_id.as_str();
        let interval = target.config.interval();
        let mut attempts: u32 = 0;
        let mut remote_failures: u32 = 0;
        let mut last_status: Option<String> = None;

        loop {
            if attempts >= target.config.max_attempts {
                tracing::warn!(
                    "{} never reached state {} ({} attempts)",
                    subject,
                    target.accept_list(),
                    attempts
                );
                return WaitOutcome::TimedOut {
                    attempts,
                    last_status,
                };
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::warn!("Stopped waiting for {}: cancelled", subject);
                    return WaitOutcome::Cancelled { attempts };
                }
                _ = self.sleeper.sleep(interval) => {}
            }
            attempts += 1;

            let status = match target.fetcher.fetch_status(subject).await {
                Ok(status) => status,
                Err(e) => match target.config.remote_errors {
                    RemoteErrorPolicy::Retry { max_retries } if remote_failures < max_retries => {
                        remote_failures += 1;
                        tracing::warn!(
                            "Status request for {} failed ({}/{} retries): {}",
                            subject,
                            remote_failures,
                            max_retries,
                            e
                        );
                        continue;
                    }
                    _ => {
                        tracing::warn!("Status request for {} failed: {}", subject, e);
                        return WaitOutcome::RemoteCallFailed {
                            error: e.to_string(),
                            attempts,
                        };
                    }
                },
            };

            if let Some(observer) = &self.observer {
                observer.on_attempt(subject, attempts, &status);
            }

            match target.observe(&status) {
                Observation::Failed => {
                    tracing::warn!("The process failed with status {}", status);
                    return WaitOutcome::Failed { status, attempts };
                }
                Observation::Accepted => {
                    tracing::info!("{} reached status {}", subject, status);
                    return WaitOutcome::Succeeded { status, attempts };
                }
                Observation::Pending => {
                    tracing::debug!("{} is in status {} (attempt {})", subject, status, attempts);
                    last_status = Some(status);
                }
            }
        }
    }
}
