mod common;

use common::{MockClient, NoSleep};
use deployflow_cloud::{
    CloudError, Condition, CreateApplicationTask, CreateDeploymentGroupTask, CreateDeploymentTask,
    FindGroupsTask, NamedCondition, PollConfig, PollingWatcher, Resource, Revision,
    WaitForDeploymentTask, WaitForStackTask, WaitOutcome,
};

fn watcher() -> PollingWatcher {
    PollingWatcher::new().with_sleeper(NoSleep)
}

fn short_poll() -> PollConfig {
    PollConfig::default().with_max_attempts(3)
}

fn groups() -> Vec<Resource> {
    vec![
        Resource::new("web-prod").with_tag("env", "prod"),
        Resource::new("web-dev").with_tag("env", "dev"),
        Resource::new("batch").with_tag("owner", "data"),
        Resource::new("web-staging")
            .with_tag("Name", "web")
            .with_tag("env", "staging"),
    ]
}

/// Stack reaches one of several delimited statuses
#[tokio::test]
async fn test_wait_for_stack_accepts_delimited_statuses() {
    let client =
        MockClient::new().with_stack_statuses(&["UPDATE_IN_PROGRESS", "UPDATE_COMPLETE"]);
    let task = WaitForStackTask {
        delimiter: ";".to_string(),
        poll: short_poll(),
        ..WaitForStackTask::new("app-stack", "CREATE_COMPLETE;UPDATE_COMPLETE")
    };

    let outcome = task.execute(&client, &watcher()).await.unwrap();

    assert_eq!(
        outcome,
        WaitOutcome::Succeeded {
            status: "UPDATE_COMPLETE".to_string(),
            attempts: 2
        }
    );
    assert_eq!(
        client.calls(),
        vec!["stack_status:app-stack", "stack_status:app-stack"]
    );
}

#[tokio::test]
async fn test_wait_for_stack_reports_failure_status() {
    let client = MockClient::new().with_stack_statuses(&["CREATE_IN_PROGRESS", "ROLLBACK_FAILED"]);
    let task = WaitForStackTask {
        poll: short_poll(),
        ..WaitForStackTask::new("app-stack", "CREATE_COMPLETE")
    };

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    match err {
        CloudError::TaskFailed { subject, reason } => {
            assert_eq!(subject, "app-stack");
            assert!(reason.contains("ROLLBACK_FAILED"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_for_stack_timeout_names_wanted_state() {
    let client = MockClient::new().with_stack_statuses(&["CREATE_IN_PROGRESS"]);
    let task = WaitForStackTask {
        poll: short_poll(),
        ..WaitForStackTask::new("app-stack", "CREATE_COMPLETE")
    };

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    assert!(err.to_string().contains("never reached state CREATE_COMPLETE"), "{err}");
    assert_eq!(client.calls().len(), 3);
}

#[tokio::test]
async fn test_wait_for_stack_missing_params_before_remote_calls() {
    let client = MockClient::new().with_stack_statuses(&["CREATE_COMPLETE"]);
    let task = WaitForStackTask::default();

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    let message = err.to_string();
    assert!(err.is_configuration());
    assert!(message.contains("stackName is required"));
    assert!(message.contains("status is required"));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_wait_for_stack_unreadable_status() {
    let client = MockClient::new();
    let task = WaitForStackTask {
        poll: short_poll(),
        ..WaitForStackTask::new("gone-stack", "CREATE_COMPLETE")
    };

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    assert!(err.to_string().contains("could not read status"), "{err}");
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn test_wait_for_deployment_stopped_is_failure() {
    let client = MockClient::new().with_deployment_statuses(&["InProgress", "Stopped"]);
    let task = WaitForDeploymentTask {
        poll: short_poll(),
        ..WaitForDeploymentTask::new("d-1", "Succeeded")
    };

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    assert!(err.to_string().contains("status Stopped"), "{err}");
}

#[tokio::test]
async fn test_wait_for_deployment_cancelled() {
    let client = MockClient::new().with_deployment_statuses(&["InProgress"]);
    let watcher = watcher();
    watcher.cancellation_token().cancel();

    let err = WaitForDeploymentTask::new("d-1", "Succeeded")
        .execute(&client, &watcher)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("cancelled"), "{err}");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_find_groups_joins_matches_in_order() {
    let client = MockClient::new().with_groups(groups());
    let task = FindGroupsTask {
        delimiter: ";".to_string(),
        ..FindGroupsTask::new([NamedCondition::new(
            "env",
            Condition::any_of(["staging", "prod"]),
        )])
    };

    let output = task.execute(&client).await.unwrap().unwrap();

    assert_eq!(output.property, "autoScalingGroupIds");
    assert_eq!(output.value, "web-prod;web-staging");
    assert_eq!(output.to_string(), "autoScalingGroupIds=web-prod;web-staging");
}

#[tokio::test]
async fn test_find_groups_no_match_produces_no_output() {
    let client = MockClient::new().with_groups(groups());
    let task = FindGroupsTask::new([NamedCondition::new("env", Condition::equals("qa"))]);

    assert!(task.execute(&client).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_groups_requires_tags_before_listing() {
    let client = MockClient::new().with_groups(groups());

    let err = FindGroupsTask::default().execute(&client).await.unwrap_err();

    assert!(err.is_configuration());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_find_groups_listing_failure() {
    let client = MockClient::new().failing_listing();
    let task = FindGroupsTask::new([NamedCondition::new("env", Condition::equals("prod"))]);

    let err = task.execute(&client).await.unwrap_err();

    match err {
        CloudError::RemoteCall(message) => {
            assert!(message.contains("Could not describe auto scaling groups"));
            assert!(message.contains("access denied"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_create_application() {
    let client = MockClient::new();

    let output = CreateApplicationTask::new("billing")
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(output.property, "applicationId");
    assert_eq!(output.value, "app-billing");
}

#[tokio::test]
async fn test_create_deployment_group_splits_scaling_groups() {
    let client = MockClient::new();
    let mut task = CreateDeploymentGroupTask {
        application_name: Some("billing".to_string()),
        deployment_group_name: Some("billing-prod".to_string()),
        deployment_config_name: Some("CodeDeployDefault.OneAtATime".to_string()),
        service_role_arn: Some("arn:aws:iam::123456789012:role/deploy".to_string()),
        ..CreateDeploymentGroupTask::default()
    };
    task.add_auto_scaling_groups("web-prod,web-staging", ",");

    let output = task.execute(&client).await.unwrap();

    assert_eq!(output.to_string(), "deploymentGroupId=dg-0001");
    let requests = client.deployment_groups.lock().unwrap();
    assert_eq!(requests[0].auto_scaling_groups, vec!["web-prod", "web-staging"]);
}

#[tokio::test]
async fn test_create_deployment_group_reports_all_missing_params() {
    let client = MockClient::new();

    let err = CreateDeploymentGroupTask::default()
        .execute(&client)
        .await
        .unwrap_err();

    match err {
        CloudError::Configuration(errors) => assert_eq!(errors.len(), 4),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(client.calls().is_empty());
}

fn deployment_task() -> CreateDeploymentTask {
    let mut task = CreateDeploymentTask {
        application_name: Some("billing".to_string()),
        deployment_group_name: Some("billing-prod".to_string()),
        deployment_config_name: Some("CodeDeployDefault.AllAtOnce".to_string()),
        poll: short_poll(),
        ..CreateDeploymentTask::default()
    };
    task.set_revision(Revision::s3("artifacts", "billing.zip"));
    task
}

#[tokio::test]
async fn test_create_deployment_without_wait() {
    let client = MockClient::new();

    let output = deployment_task().execute(&client, &watcher()).await.unwrap();

    assert_eq!(output.to_string(), "deploymentId=d-ABCDEF123");
    assert_eq!(client.calls(), vec!["create_deployment:billing"]);
}

#[tokio::test]
async fn test_create_deployment_waits_for_success() {
    let client =
        MockClient::new().with_deployment_statuses(&["Created", "InProgress", "Succeeded"]);
    let task = CreateDeploymentTask {
        wait_for_deployment: true,
        ..deployment_task()
    };

    let output = task.execute(&client, &watcher()).await.unwrap();

    assert_eq!(output.value, "d-ABCDEF123");
    assert_eq!(
        client.calls(),
        vec![
            "create_deployment:billing",
            "deployment_status:d-ABCDEF123",
            "deployment_status:d-ABCDEF123",
            "deployment_status:d-ABCDEF123",
        ]
    );
}

#[tokio::test]
async fn test_create_deployment_wait_failure_is_task_failure() {
    let client = MockClient::new().with_deployment_statuses(&["InProgress", "Failed"]);
    let task = CreateDeploymentTask {
        wait_for_deployment: true,
        ..deployment_task()
    };

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    assert!(matches!(err, CloudError::TaskFailed { ref subject, .. } if subject == "d-ABCDEF123"));
}

#[tokio::test]
async fn test_create_deployment_last_revision_wins() {
    let client = MockClient::new();
    let mut task = deployment_task();
    task.set_revision(Revision::github("org/billing", "abc123"));

    task.execute(&client, &watcher()).await.unwrap();

    let deployments = client.deployments.lock().unwrap();
    assert_eq!(deployments[0].revision, Revision::github("org/billing", "abc123"));
}

#[tokio::test]
async fn test_create_deployment_requires_revision() {
    let client = MockClient::new();
    let task = CreateDeploymentTask {
        revision: None,
        ..deployment_task()
    };

    let err = task.execute(&client, &watcher()).await.unwrap_err();

    assert!(err.to_string().contains("revision is required"));
    assert!(client.calls().is_empty());
}
