use super::{Context, print_output};
use clap::Args;
use colored::Colorize;
use deployflow_cloud::{CreateDeploymentTask, Revision};

#[derive(Args, Debug, Default)]
pub struct DeploymentArgs {
    #[arg(long)]
    pub application_name: Option<String>,
    #[arg(long)]
    pub deployment_group_name: Option<String>,
    #[arg(long)]
    pub deployment_config_name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub ignore_application_stop_failures: bool,

    /// S3 bucket holding the bundle
    #[arg(long, requires = "s3_key")]
    pub s3_bucket: Option<String>,
    #[arg(long, requires = "s3_bucket")]
    pub s3_key: Option<String>,
    /// tar, tgz, zip, YAML or JSON
    #[arg(long, requires = "s3_bucket")]
    pub bundle_type: Option<String>,
    #[arg(long, requires = "s3_bucket")]
    pub s3_version: Option<String>,
    #[arg(long, requires = "s3_bucket")]
    pub etag: Option<String>,

    /// GitHub repository (owner/name) holding the bundle
    #[arg(long, requires = "commit_id")]
    pub github_repository: Option<String>,
    #[arg(long, requires = "github_repository")]
    pub commit_id: Option<String>,

    /// Block until the deployment succeeds
    #[arg(long)]
    pub wait: bool,
}

impl DeploymentArgs {
    /// Revisions in the order given; the GitHub one wins when both are set
    fn revisions(&self) -> Vec<Revision> {
        let mut revisions = Vec::new();
        if let (Some(bucket), Some(key)) = (&self.s3_bucket, &self.s3_key) {
            revisions.push(Revision::S3 {
                bucket: bucket.clone(),
                key: key.clone(),
                bundle_type: self.bundle_type.clone(),
                version: self.s3_version.clone(),
                etag: self.etag.clone(),
            });
        }
        if let (Some(repository), Some(commit_id)) = (&self.github_repository, &self.commit_id) {
            revisions.push(Revision::github(repository, commit_id));
        }
        revisions
    }
}

pub async fn handle(ctx: &Context, args: DeploymentArgs, property: String) -> anyhow::Result<()> {
    let revisions = args.revisions();
    let mut task = CreateDeploymentTask {
        application_name: args.application_name,
        deployment_group_name: args.deployment_group_name,
        deployment_config_name: args.deployment_config_name,
        description: args.description,
        ignore_application_stop_failures: args.ignore_application_stop_failures.then_some(true),
        property_name: property,
        wait_for_deployment: args.wait,
        poll: ctx.poll(),
        ..Default::default()
    };
    for revision in revisions {
        task.set_revision(revision);
    }
    task.validate()?;

    let client = ctx.client().await;
    let output = task.execute(&client, &ctx.watcher).await?;

    if task.wait_for_deployment {
        eprintln!("{}", "✓ Deployment succeeded".green().bold());
    } else {
        eprintln!("{}", "✓ Deployment started".green().bold());
    }
    print_output(&output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revisions_from_flags() {
        let args = DeploymentArgs {
            s3_bucket: Some("artifacts".to_string()),
            s3_key: Some("app.zip".to_string()),
            bundle_type: Some("zip".to_string()),
            ..Default::default()
        };
        let revisions = args.revisions();
        assert_eq!(revisions.len(), 1);
        assert!(matches!(&revisions[0], Revision::S3 { bundle_type: Some(t), .. } if t == "zip"));

        let both = DeploymentArgs {
            s3_bucket: Some("artifacts".to_string()),
            s3_key: Some("app.zip".to_string()),
            github_repository: Some("org/app".to_string()),
            commit_id: Some("abc123".to_string()),
            ..Default::default()
        };
        let revisions = both.revisions();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[1], Revision::github("org/app", "abc123"));

        assert!(DeploymentArgs::default().revisions().is_empty());
    }
}
